//! Text formatting for table cells and the detail overlay

use crate::types::Currency;

/// Placeholder for missing values
pub const MISSING: &str = "--";

/// Direction of a 24h change, for the caret next to a percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceTrend {
    Up,
    Down,
}

impl PriceTrend {
    /// `None` when the change is missing
    pub fn of(percentage: Option<f64>) -> Option<Self> {
        match percentage {
            Some(p) if p.is_finite() => Some(if p < 0.0 { PriceTrend::Down } else { PriceTrend::Up }),
            _ => None,
        }
    }

    pub fn caret(&self) -> &'static str {
        match self {
            PriceTrend::Up => "▲",
            PriceTrend::Down => "▼",
        }
    }
}

/// Formats a number with `,` thousands separators in its integer part
///
/// ```
/// use market_table_sdk::format::format_number;
///
/// assert_eq!(format_number(Some(1234567.5)), "1,234,567.5");
/// assert_eq!(format_number(None), "--");
/// ```
pub fn format_number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => group_thousands(&v.to_string()),
        _ => MISSING.to_string(),
    }
}

/// Formats market caps and volumes, abbreviating trillions and billions
pub fn format_large_number(value: Option<f64>) -> String {
    let v = match value {
        Some(v) if v.is_finite() => v,
        _ => return MISSING.to_string(),
    };

    if v >= 1e12 {
        format!("{:.2}T", v / 1e12)
    } else if v >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v >= 1e6 {
        // at most three fraction digits, like a locale-formatted number
        let rounded = (v * 1000.0).round() / 1000.0;
        group_thousands(&rounded.to_string())
    } else {
        v.to_string()
    }
}

/// Formats a 24h change as `-1.23 %`
pub fn format_percentage(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2} %", v),
        _ => MISSING.to_string(),
    }
}

/// Formats a price with the currency symbol in front
pub fn format_price(currency: Currency, value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{}{}", currency.symbol(), format_number(Some(v))),
        _ => MISSING.to_string(),
    }
}

fn group_thousands(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let (int_part, fraction) = match unsigned.split_once('.') {
        Some((int_part, fraction)) => (int_part, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{}{}.{}", sign, grouped, fraction),
        None => format!("{}{}", sign, grouped),
    }
}

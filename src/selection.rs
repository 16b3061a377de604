//! Row selection for the detail overlay

use crate::{
    format::{format_large_number, format_number, format_percentage, format_price, PriceTrend},
    types::{Currency, MarketRow},
};

/// Tracks which row, if any, the detail overlay shows
///
/// The selection keeps its own copy of the row. Table refreshes never
/// touch it; only [`select`](Self::select) and [`dismiss`](Self::dismiss) do.
#[derive(Debug, Clone, Default)]
pub struct ModalController {
    selected: Option<MarketRow>,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the overlay on `row`
    pub fn select(&mut self, row: MarketRow) -> &MarketRow {
        tracing::debug!(id = %row.id, "Selected row");
        self.selected.insert(row)
    }

    /// Closes the overlay
    pub fn dismiss(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&MarketRow> {
        self.selected.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }
}

/// One labelled value in the detail overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    pub title: &'static str,
    pub tooltip: &'static str,
    pub value: String,
}

/// Header line of the detail overlay
#[derive(Debug, Clone, PartialEq)]
pub struct DetailHeader {
    pub name: String,
    pub symbol: String,
    pub image: Option<String>,
    pub price: String,
    pub change: String,
    pub trend: Option<PriceTrend>,
}

impl DetailHeader {
    pub fn new(row: &MarketRow, currency: Currency) -> Self {
        Self {
            name: row.name.clone(),
            symbol: row.symbol.clone(),
            image: row.image.clone(),
            price: format_price(currency, row.current_price),
            change: format_percentage(row.price_change_percentage_24h),
            trend: PriceTrend::of(row.price_change_percentage_24h),
        }
    }
}

/// Formatted supply and valuation figures for `row`
pub fn detail_entries(row: &MarketRow, currency: Currency) -> Vec<DetailEntry> {
    let money = |value: Option<f64>| match value {
        Some(_) => format!("{}{}", currency.symbol(), format_large_number(value)),
        None => format_large_number(None),
    };
    let supply = |value: Option<f64>| match value {
        Some(_) => format!("{} {}", format_number(value), row.symbol),
        None => format_number(None),
    };

    vec![
        DetailEntry {
            title: "Market cap",
            tooltip: "The total market value of a cryptocurrency's circulating supply. \
                      It is analogous to the free-float capitalization in the stock market.",
            value: money(row.market_cap),
        },
        DetailEntry {
            title: "Volume (24h)",
            tooltip: "A measure of how much of a cryptocurrency was traded in the last 24 hours.",
            value: money(row.total_volume),
        },
        DetailEntry {
            title: "Circulating supply",
            tooltip: "The amount of coins that are circulating in the market and are in public hands. \
                      It is analogous to the flowing shares in the stock market.",
            value: supply(row.circulating_supply),
        },
        DetailEntry {
            title: "Total supply",
            tooltip: "Total supply = Total coins created - coins that have been burned (if any). \
                      It is comparable to outstanding shares in the stock market.",
            value: supply(row.total_supply),
        },
        DetailEntry {
            title: "Max. supply",
            tooltip: "The maximum amount of coins that will ever exist in the lifetime of the cryptocurrency. \
                      It is analogous to the fully diluted shares in the stock market.",
            value: supply(row.max_supply),
        },
        DetailEntry {
            title: "Fully diluted valuation",
            tooltip: "The total value of a cryptocurrency project considering all of its tokens \
                      that are in circulation.",
            value: money(row.fully_diluted_valuation),
        },
    ]
}

//! Types for the market table

use crate::constants::{ALLOWED_ROWS_PER_PAGE, DEFAULT_PAGE, DEFAULT_ROWS_PER_PAGE};
use crate::error::{ProviderError, StateError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Quote currencies supported by the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// US Dollar
    #[default]
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    /// Code sent upstream as `vs_currency`
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
        }
    }

    /// Symbol shown in front of prices
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }

    /// Label shown in the currency selector
    pub fn label(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Get all supported currencies
    pub fn all() -> &'static [Currency] {
        &[Currency::Usd, Currency::Eur]
    }
}

impl FromStr for Currency {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::all()
            .iter()
            .copied()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StateError::invalid_field("currency", s))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Page(NonZeroU32);

impl Page {
    /// First page
    pub const FIRST: Page = Page(NonZeroU32::MIN);

    /// Returns `None` for page 0
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(Page)
    }

    pub fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(DEFAULT_PAGE).unwrap_or(Page::FIRST)
    }
}

impl FromStr for Page {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Page::new)
            .ok_or_else(|| StateError::invalid_field("page", s))
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Page size, restricted to [`ALLOWED_ROWS_PER_PAGE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowsPerPage(u32);

impl RowsPerPage {
    /// Returns `None` unless `rows` is one of the allowed page sizes
    pub fn new(rows: u32) -> Option<Self> {
        ALLOWED_ROWS_PER_PAGE
            .contains(&rows)
            .then_some(RowsPerPage(rows))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// All page sizes offered by the pagination control
    pub fn options() -> impl Iterator<Item = RowsPerPage> {
        ALLOWED_ROWS_PER_PAGE.iter().map(|&rows| RowsPerPage(rows))
    }
}

impl Default for RowsPerPage {
    fn default() -> Self {
        RowsPerPage(DEFAULT_ROWS_PER_PAGE)
    }
}

impl FromStr for RowsPerPage {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(RowsPerPage::new)
            .ok_or_else(|| StateError::invalid_field("rows_per_page", s))
    }
}

impl fmt::Display for RowsPerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameters driving both persistence and the upstream query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub page: Page,
    pub rows_per_page: RowsPerPage,
    pub currency: Currency,
}

impl ViewState {
    pub fn new(page: Page, rows_per_page: RowsPerPage, currency: Currency) -> Self {
        Self {
            page,
            rows_per_page,
            currency,
        }
    }

    /// Returns a copy with `field` applied
    pub fn with(mut self, field: ViewField) -> Self {
        match field {
            ViewField::Page(page) => self.page = page,
            ViewField::RowsPerPage(rows) => self.rows_per_page = rows,
            ViewField::Currency(currency) => self.currency = currency,
        }
        self
    }

    /// Fields whose values differ between `self` and `other`
    pub fn changed_fields(&self, other: &ViewState) -> Vec<ViewField> {
        let mut changed = Vec::with_capacity(3);
        if self.page != other.page {
            changed.push(ViewField::Page(other.page));
        }
        if self.rows_per_page != other.rows_per_page {
            changed.push(ViewField::RowsPerPage(other.rows_per_page));
        }
        if self.currency != other.currency {
            changed.push(ViewField::Currency(other.currency));
        }
        changed
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page={} rows_per_page={} currency={}",
            self.page, self.rows_per_page, self.currency
        )
    }
}

/// One view state field together with its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewField {
    Page(Page),
    RowsPerPage(RowsPerPage),
    Currency(Currency),
}

impl ViewField {
    /// Field name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            ViewField::Page(_) => "page",
            ViewField::RowsPerPage(_) => "rows_per_page",
            ViewField::Currency(_) => "currency",
        }
    }

    /// Value as persisted
    pub fn value(&self) -> String {
        match self {
            ViewField::Page(page) => page.to_string(),
            ViewField::RowsPerPage(rows) => rows.to_string(),
            ViewField::Currency(currency) => currency.code().to_string(),
        }
    }
}

/// One asset row as returned by `/coins/markets`
///
/// Numeric fields are `None` when the upstream omits them or sends `null`.
/// A missing or `null` id, symbol or name reads as an empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketRow {
    #[serde(deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub symbol: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    /// Icon URL
    pub image: Option<String>,
    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub market_cap_rank: Option<u64>,
    pub fully_diluted_valuation: Option<f64>,
    pub total_volume: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub price_change_24h: Option<f64>,
    pub price_change_percentage_24h: Option<f64>,
    pub market_cap_change_24h: Option<f64>,
    pub market_cap_change_percentage_24h: Option<f64>,
    pub circulating_supply: Option<f64>,
    pub total_supply: Option<f64>,
    pub max_supply: Option<f64>,
    pub ath: Option<f64>,
    pub ath_change_percentage: Option<f64>,
    pub ath_date: Option<String>,
    pub atl: Option<f64>,
    pub atl_change_percentage: Option<f64>,
    pub atl_date: Option<String>,
    pub roi: Option<serde_json::Value>,
    pub last_updated: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Token identifying one fetch trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    /// Epoch before any fetch was issued
    pub const ZERO: Epoch = Epoch(0);

    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A view state tagged with the epoch it was issued under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub params: ViewState,
    pub epoch: Epoch,
}

/// Result of one fetch, tagged with the epoch of its request
#[derive(Debug)]
pub enum FetchOutcome {
    Success { epoch: Epoch, rows: Vec<MarketRow> },
    Failure { epoch: Epoch, error: ProviderError },
}

impl FetchOutcome {
    /// Epoch of the request this outcome answers
    pub fn epoch(&self) -> Epoch {
        match self {
            FetchOutcome::Success { epoch, .. } | FetchOutcome::Failure { epoch, .. } => *epoch,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Lifecycle phase of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePhase {
    /// No fetch issued yet
    #[default]
    Idle,
    /// The current epoch's fetch is in flight
    Loading,
    /// The current epoch's fetch succeeded
    Displaying,
    /// The current epoch's fetch failed
    Errored,
}

/// Columns that support client-side sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    CurrentPrice,
    PriceChangePercentage24h,
    MarketCap,
    TotalVolume,
    CirculatingSupply,
}

impl SortColumn {
    /// Value of this column for `row`
    pub fn value(&self, row: &MarketRow) -> Option<f64> {
        match self {
            SortColumn::CurrentPrice => row.current_price,
            SortColumn::PriceChangePercentage24h => row.price_change_percentage_24h,
            SortColumn::MarketCap => row.market_cap,
            SortColumn::TotalVolume => row.total_volume,
            SortColumn::CirculatingSupply => row.circulating_supply,
        }
    }

    /// Column header text
    pub fn title(&self) -> &'static str {
        match self {
            SortColumn::CurrentPrice => "Current Price",
            SortColumn::PriceChangePercentage24h => "24h %",
            SortColumn::MarketCap => "Market Cap",
            SortColumn::TotalVolume => "Volume(24h)",
            SortColumn::CirculatingSupply => "Circulating Supply",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active client-side sort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Row range summary for the pagination footer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// 1-based index of the first displayed row, 0 when empty
    pub start: u64,
    /// 1-based index of the last displayed row, 0 when empty
    pub end: u64,
    /// Nominal total, see `NOMINAL_TOTAL_COUNT`
    pub total: u64,
}

impl PageWindow {
    pub fn summary(&self) -> String {
        format!(
            "Showing {}-{} out of {} items",
            self.start, self.end, self.total
        )
    }
}

/// Presentation-facing view of the table
///
/// Rows are shared and read-only; a new snapshot is published for every
/// state change.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSnapshot {
    pub view: ViewState,
    pub phase: TablePhase,
    /// Rows in display order (client-side sort applied)
    pub rows: Arc<[MarketRow]>,
    /// Epoch of the most recently issued fetch
    pub epoch: Epoch,
    pub sort: Option<SortSpec>,
    /// When rows were last replaced
    pub last_refreshed: Option<DateTime<Utc>>,
    /// Message of the failure behind the `Errored` phase
    pub last_error: Option<String>,
    pub window: PageWindow,
}

impl TableSnapshot {
    pub fn is_loading(&self) -> bool {
        self.phase == TablePhase::Loading
    }

    pub fn is_error(&self) -> bool {
        self.phase == TablePhase::Errored
    }
}

/// Table events for subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableEvent {
    /// Rows were replaced by the current epoch's result
    RowsUpdated {
        id: Uuid,
        epoch: Epoch,
        view: ViewState,
        row_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// The current epoch's fetch failed
    FetchFailed {
        id: Uuid,
        epoch: Epoch,
        view: ViewState,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A result arrived for a superseded epoch and was dropped
    StaleDiscarded {
        id: Uuid,
        epoch: Epoch,
        current_epoch: Epoch,
        timestamp: DateTime<Utc>,
    },
}

impl TableEvent {
    /// Get the event ID
    pub fn id(&self) -> Uuid {
        match self {
            TableEvent::RowsUpdated { id, .. } => *id,
            TableEvent::FetchFailed { id, .. } => *id,
            TableEvent::StaleDiscarded { id, .. } => *id,
        }
    }

    /// Get the event type as string
    pub fn event_type(&self) -> &'static str {
        match self {
            TableEvent::RowsUpdated { .. } => "ROWS_UPDATED",
            TableEvent::FetchFailed { .. } => "FETCH_FAILED",
            TableEvent::StaleDiscarded { .. } => "STALE_DISCARDED",
        }
    }
}

impl fmt::Display for TableEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableEvent::RowsUpdated {
                epoch,
                view,
                row_count,
                ..
            } => write!(f, "Rows updated (epoch {}): {} rows for {}", epoch, row_count, view),
            TableEvent::FetchFailed {
                epoch,
                error_message,
                ..
            } => write!(f, "Fetch failed (epoch {}): {}", epoch, error_message),
            TableEvent::StaleDiscarded {
                epoch,
                current_epoch,
                ..
            } => write!(
                f,
                "Discarded result for epoch {} (current epoch {})",
                epoch, current_epoch
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!("EUR".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("gbp".parse::<Currency>().is_err());
        assert!("".parse::<Currency>().is_err());
    }

    #[test]
    fn test_page_rejects_zero_and_garbage() {
        assert_eq!("3".parse::<Page>().unwrap().get(), 3);
        assert!("0".parse::<Page>().is_err());
        assert!("-1".parse::<Page>().is_err());
        assert!("two".parse::<Page>().is_err());
        assert!(Page::new(0).is_none());
    }

    #[test]
    fn test_rows_per_page_domain() {
        for rows in [5, 10, 20, 50, 100] {
            assert_eq!(RowsPerPage::new(rows).unwrap().get(), rows);
        }
        assert!(RowsPerPage::new(7).is_none());
        assert!("25".parse::<RowsPerPage>().is_err());
        assert_eq!(RowsPerPage::options().count(), 5);
    }

    #[test]
    fn test_view_state_defaults() {
        let view = ViewState::default();
        assert_eq!(view.page.get(), 1);
        assert_eq!(view.rows_per_page.get(), 10);
        assert_eq!(view.currency, Currency::Usd);
    }

    #[test]
    fn test_changed_fields() {
        let before = ViewState::default();
        let after = before
            .with(ViewField::Page(Page::new(4).unwrap()))
            .with(ViewField::Currency(Currency::Eur));

        let changed = before.changed_fields(&after);
        assert_eq!(
            changed,
            vec![
                ViewField::Page(Page::new(4).unwrap()),
                ViewField::Currency(Currency::Eur)
            ]
        );
        assert!(after.changed_fields(&after).is_empty());
    }

    #[test]
    fn test_market_row_tolerates_nulls_and_extra_fields() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "current_price": 65000,
            "max_supply": null,
            "roi": null,
            "sparkline_in_7d": {"price": [1.0]}
        }"#;

        let row: MarketRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "bitcoin");
        assert_eq!(row.current_price, Some(65000.0));
        assert_eq!(row.max_supply, None);
        assert_eq!(row.market_cap, None);
    }

    #[test]
    fn test_market_row_null_identity_fields_read_as_empty() {
        let json = r#"[
            {"id": "bitcoin", "symbol": null, "name": "Bitcoin", "market_cap": 1.0},
            {"id": null, "symbol": "eth", "current_price": 3000.5}
        ]"#;

        let rows: Vec<MarketRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "");
        assert_eq!(rows[0].name, "Bitcoin");
        assert_eq!(rows[1].id, "");
        assert_eq!(rows[1].name, "");
        assert_eq!(rows[1].current_price, Some(3000.5));
    }

    #[test]
    fn test_sort_column_titles() {
        assert_eq!(SortColumn::TotalVolume.title(), "Volume(24h)");
        assert_eq!(SortColumn::PriceChangePercentage24h.title(), "24h %");
    }

    #[test]
    fn test_page_window_summary() {
        let window = PageWindow {
            start: 11,
            end: 20,
            total: 10_000,
        };
        assert_eq!(window.summary(), "Showing 11-20 out of 10000 items");
    }
}

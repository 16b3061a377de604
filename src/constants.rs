//! Constants for the market table
//!
//! Defaults for every runtime setting live here. `TableConfig` starts from
//! these values and may override a few of them from the environment.

/// How often the table refetches the current page (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// Page shown when nothing valid has been persisted
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when nothing valid has been persisted
pub const DEFAULT_ROWS_PER_PAGE: u32 = 10;

/// Page sizes offered by the pagination control
pub const ALLOWED_ROWS_PER_PAGE: &[u32] = &[5, 10, 20, 50, 100];

/// Row count reported by the page summary.
///
/// CoinGecko does not return a total for `/coins/markets`, so this is a
/// nominal figure and not derived from any response.
pub const NOMINAL_TOTAL_COUNT: u64 = 10_000;

/// Capacity of the table event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Capacity of the controller command channel
pub const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko endpoint listing coins with market data
pub const COINGECKO_MARKETS_ENDPOINT: &str = "/coins/markets";

/// Upstream sort order, always by market capitalization
pub const MARKETS_ORDER: &str = "market_cap_desc";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "market-table-sdk/0.1.0";

/// Storage key for the persisted page number
pub const PAGE_KEY: &str = "market_table.page";

/// Storage key for the persisted page size
pub const ROWS_PER_PAGE_KEY: &str = "market_table.rows_per_page";

/// Storage key for the persisted currency code
pub const CURRENCY_KEY: &str = "market_table.currency";

/// File name of the persisted view state under the data directory
pub const STATE_FILE_NAME: &str = "view_state.json";

/// Directory name used under the platform data directory
pub const STATE_DIR_NAME: &str = "market-table";

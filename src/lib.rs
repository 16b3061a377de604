//! # Market Table SDK
//!
//! Drives a live, paginated table of cryptocurrency market data from
//! CoinGecko's `/coins/markets` endpoint. The crate owns the fetch
//! lifecycle; rendering is left to the caller.
//!
//! ## Usage
//!
//! ```no_run
//! use market_table_sdk::{Currency, MarketTable, Page, TableConfig};
//! use market_table_sdk::format::{format_percentage, format_price};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = MarketTable::new(TableConfig::from_env())?;
//! table.set_currency(Currency::Eur).await?;
//! table.set_page(Page::new(2).unwrap()).await?;
//!
//! let mut updates = table.subscribe();
//! while updates.changed().await.is_ok() {
//!     let snapshot = updates.borrow_and_update().clone();
//!     if snapshot.is_error() {
//!         eprintln!("{}", snapshot.last_error.unwrap_or_default());
//!     }
//!     for row in snapshot.rows.iter() {
//!         println!(
//!             "{:<12} {:>14} {:>10}",
//!             row.name,
//!             format_price(snapshot.view.currency, row.current_price),
//!             format_percentage(row.price_change_percentage_24h)
//!         );
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! MarketTable ── ViewStateStore (persisted page / page size / currency)
//!     │
//!     ▼
//! TableController task ◀── RefreshTimer (every 60s, reset on view change)
//!     │
//!     ▼
//! DataFetcher ──▶ MarketDataProvider (CoinGecko)
//!     │
//!     ▼
//! staleness guard (epoch check) ──▶ TableSnapshot (watch channel)
//! ```
//!
//! Every fetch trigger starts a new epoch. A result is applied only if its
//! epoch is still the latest; anything older is dropped on arrival.
//!
//! ## Error Handling
//!
//! Fetch failures never surface as `Err`: they put the table in the
//! `Errored` phase and keep the previously displayed rows. Invalid persisted
//! settings silently fall back to their defaults.

pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod selection;
pub mod state;
pub mod store;
pub mod table;
pub mod timer;
pub mod types;

// Re-export commonly used types
pub use config::TableConfig;
pub use controller::{TableController, TableHandle};
pub use error::{ProviderError, StateError, TableError};
pub use metrics::FetchStats;
pub use provider::MarketDataProvider;
pub use selection::{DetailEntry, ModalController};
pub use store::{JsonFileStorage, MemoryStorage, StateStorage, ViewStateStore};
pub use table::MarketTable;
pub use types::{
    Currency, Epoch, MarketRow, Page, PageWindow, RowsPerPage, SortColumn, SortDirection,
    SortSpec, TableEvent, TablePhase, TableSnapshot, ViewField, ViewState,
};

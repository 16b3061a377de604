//! Market table service
//!
//! Wires the persisted view state, the controller and the row selection
//! together. Renderers talk to [`MarketTable`] only.

use crate::{
    config::TableConfig,
    controller::{TableController, TableHandle},
    error::TableError,
    fetcher::DataFetcher,
    metrics::FetchStats,
    provider::MarketDataProvider,
    providers::CoinGeckoProvider,
    selection::ModalController,
    store::{JsonFileStorage, StateStorage, ViewStateStore},
    types::{
        Currency, MarketRow, Page, RowsPerPage, SortColumn, TableEvent, TableSnapshot, ViewField,
        ViewState,
    },
};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Live, paginated market table
///
/// # Example
/// ```no_run
/// use market_table_sdk::{Currency, MarketTable, TableConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut table = MarketTable::new(TableConfig::from_env())?;
/// table.set_currency(Currency::Eur).await?;
///
/// let mut updates = table.subscribe();
/// updates.changed().await?;
/// println!("{}", updates.borrow().window.summary());
/// # Ok(())
/// # }
/// ```
pub struct MarketTable {
    store: ViewStateStore,
    view: ViewState,
    controller: TableHandle,
    modal: ModalController,
}

impl MarketTable {
    /// Creates a table backed by CoinGecko and the JSON state file
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: TableConfig) -> Result<Self, TableError> {
        let provider = Arc::new(CoinGeckoProvider::from_config(&config)?);
        let storage = Arc::new(JsonFileStorage::open(&config.state_path));
        Ok(Self::with_parts(provider, storage, config))
    }

    /// Creates a table with a custom provider and storage
    ///
    /// This is primarily for testing with mock providers.
    pub fn with_parts(
        provider: Arc<dyn MarketDataProvider>,
        storage: Arc<dyn StateStorage>,
        config: TableConfig,
    ) -> Self {
        let store = ViewStateStore::new(storage);
        let view = store.load();
        let controller = TableController::spawn(view, DataFetcher::new(provider), &config);

        Self {
            store,
            view,
            controller,
            modal: ModalController::new(),
        }
    }

    /// Current view state
    pub fn view_state(&self) -> ViewState {
        self.view
    }

    pub async fn set_page(&mut self, page: Page) -> Result<(), TableError> {
        self.update(self.view.with(ViewField::Page(page))).await
    }

    pub async fn set_rows_per_page(&mut self, rows_per_page: RowsPerPage) -> Result<(), TableError> {
        self.update(self.view.with(ViewField::RowsPerPage(rows_per_page)))
            .await
    }

    pub async fn set_currency(&mut self, currency: Currency) -> Result<(), TableError> {
        self.update(self.view.with(ViewField::Currency(currency)))
            .await
    }

    /// Applies a pagination change as one update
    pub async fn change_page(
        &mut self,
        page: Page,
        rows_per_page: RowsPerPage,
    ) -> Result<(), TableError> {
        let next = self
            .view
            .with(ViewField::Page(page))
            .with(ViewField::RowsPerPage(rows_per_page));
        self.update(next).await
    }

    /// Persists the changed fields and hands the new state to the controller
    async fn update(&mut self, next: ViewState) -> Result<(), TableError> {
        let changed = self.view.changed_fields(&next);
        if changed.is_empty() {
            return Ok(());
        }

        self.controller.set_view(next).await?;
        for field in changed {
            self.store.save(field);
        }
        self.view = next;
        Ok(())
    }

    /// Forces an immediate refetch of the current page
    ///
    /// The refresh timer keeps its schedule.
    pub async fn refresh_now(&self) -> Result<(), TableError> {
        self.controller.refresh().await
    }

    /// Cycles the client-side sort on `column`
    pub async fn toggle_sort(&self, column: SortColumn) -> Result<(), TableError> {
        self.controller.toggle_sort(column).await
    }

    pub async fn clear_sort(&self) -> Result<(), TableError> {
        self.controller.set_sort(None).await
    }

    /// Latest table snapshot
    pub fn snapshot(&self) -> TableSnapshot {
        self.controller.snapshot()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot> {
        self.controller.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<TableEvent> {
        self.controller.events()
    }

    /// Gets fetch metrics including latency percentiles and success rate
    pub fn fetch_stats(&self) -> FetchStats {
        self.controller.fetch_stats()
    }

    /// Opens the detail overlay on the displayed row at `index`
    pub fn select_row(&mut self, index: usize) -> Result<&MarketRow, TableError> {
        let snapshot = self.controller.snapshot();
        let row = snapshot
            .rows
            .get(index)
            .cloned()
            .ok_or(TableError::RowOutOfRange {
                index,
                len: snapshot.rows.len(),
            })?;

        Ok(self.modal.select(row))
    }

    /// Closes the detail overlay
    pub fn dismiss_detail(&mut self) {
        self.modal.dismiss();
    }

    pub fn selection(&self) -> &ModalController {
        &self.modal
    }

    /// Stops the controller and its refresh timer
    pub async fn shutdown(self) {
        self.controller.shutdown().await;
    }
}

//! Table state machine
//!
//! Pure, synchronous bookkeeping for the controller: the epoch counter,
//! the lifecycle phase, the loaded rows and the client-side sort. Nothing
//! here performs I/O, which keeps the staleness guard testable on its own.

use crate::{
    constants::NOMINAL_TOTAL_COUNT,
    types::{
        Epoch, FetchOutcome, FetchRequest, MarketRow, PageWindow, SortColumn, SortDirection,
        SortSpec, TablePhase, TableSnapshot, ViewState,
    },
};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::sync::Arc;

/// What [`TableState::apply`] did with an outcome
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyResult {
    /// Rows were replaced
    Displayed { epoch: Epoch, row_count: usize },
    /// The table entered the error state
    Failed { epoch: Epoch, message: String },
    /// The outcome belonged to a superseded epoch
    Discarded { epoch: Epoch, current: Epoch },
}

pub struct TableState {
    view: ViewState,
    epoch: Epoch,
    phase: TablePhase,
    /// Rows in upstream order
    rows: Vec<MarketRow>,
    /// Rows in display order
    displayed: Arc<[MarketRow]>,
    sort: Option<SortSpec>,
    last_refreshed: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl TableState {
    pub fn new(view: ViewState) -> Self {
        Self {
            view,
            epoch: Epoch::ZERO,
            phase: TablePhase::Idle,
            rows: Vec::new(),
            displayed: Arc::from(Vec::new()),
            sort: None,
            last_refreshed: None,
            last_error: None,
        }
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn phase(&self) -> TablePhase {
        self.phase
    }

    pub fn sort(&self) -> Option<SortSpec> {
        self.sort
    }

    /// Replaces the view state, returning whether anything changed
    pub fn set_view(&mut self, next: ViewState) -> bool {
        if self.view == next {
            return false;
        }
        self.view = next;
        true
    }

    /// Starts a new epoch for the current view state
    ///
    /// Any outcome still in flight for an older epoch becomes stale.
    pub fn begin_fetch(&mut self) -> FetchRequest {
        self.epoch = self.epoch.next();
        self.phase = TablePhase::Loading;
        self.last_error = None;
        FetchRequest {
            params: self.view,
            epoch: self.epoch,
        }
    }

    /// Applies an outcome if it answers the current epoch
    ///
    /// On failure the previously displayed rows stay in place.
    pub fn apply(&mut self, outcome: FetchOutcome) -> ApplyResult {
        let epoch = outcome.epoch();
        if epoch != self.epoch {
            return ApplyResult::Discarded {
                epoch,
                current: self.epoch,
            };
        }

        match outcome {
            FetchOutcome::Success { rows, .. } => {
                let row_count = rows.len();
                self.rows = rows;
                self.resort();
                self.phase = TablePhase::Displaying;
                self.last_refreshed = Some(Utc::now());
                ApplyResult::Displayed { epoch, row_count }
            }
            FetchOutcome::Failure { error, .. } => {
                let message = error.to_string();
                self.phase = TablePhase::Errored;
                self.last_error = Some(message.clone());
                ApplyResult::Failed { epoch, message }
            }
        }
    }

    /// Cycles the sort on `column`: ascending, descending, then unsorted
    pub fn toggle_sort(&mut self, column: SortColumn) -> Option<SortSpec> {
        let next = match self.sort {
            Some(SortSpec {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == column => Some(SortSpec {
                column,
                direction: SortDirection::Descending,
            }),
            Some(SortSpec {
                column: current,
                direction: SortDirection::Descending,
            }) if current == column => None,
            _ => Some(SortSpec {
                column,
                direction: SortDirection::Ascending,
            }),
        };
        self.set_sort(next);
        next
    }

    /// Sets the sort and reorders the loaded rows
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        self.sort = sort;
        self.resort();
    }

    /// Current presentation snapshot
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            view: self.view,
            phase: self.phase,
            rows: self.displayed.clone(),
            epoch: self.epoch,
            sort: self.sort,
            last_refreshed: self.last_refreshed,
            last_error: self.last_error.clone(),
            window: self.window(),
        }
    }

    fn window(&self) -> PageWindow {
        let len = self.displayed.len() as u64;
        if len == 0 {
            return PageWindow {
                start: 0,
                end: 0,
                total: NOMINAL_TOTAL_COUNT,
            };
        }

        let offset = (self.view.page.get() as u64 - 1) * self.view.rows_per_page.get() as u64;
        PageWindow {
            start: offset + 1,
            end: offset + len,
            total: NOMINAL_TOTAL_COUNT,
        }
    }

    fn resort(&mut self) {
        let mut rows = self.rows.clone();
        if let Some(spec) = self.sort {
            rows.sort_by(|a, b| compare_rows(&spec, a, b));
        }
        self.displayed = Arc::from(rows);
    }
}

/// Missing values sort last in either direction
fn compare_rows(spec: &SortSpec, a: &MarketRow, b: &MarketRow) -> Ordering {
    match (spec.column.value(a), spec.column.value(b)) {
        (Some(x), Some(y)) => match spec.direction {
            SortDirection::Ascending => x.total_cmp(&y),
            SortDirection::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::mock::{row, rows};
    use crate::types::{Currency, Page, RowsPerPage, ViewField};

    fn success(request: &FetchRequest, rows: Vec<MarketRow>) -> FetchOutcome {
        FetchOutcome::Success {
            epoch: request.epoch,
            rows,
        }
    }

    fn failure(request: &FetchRequest) -> FetchOutcome {
        FetchOutcome::Failure {
            epoch: request.epoch,
            error: ProviderError::RateLimitExceeded,
        }
    }

    fn ids(snapshot: &TableSnapshot) -> Vec<&str> {
        snapshot.rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_initial_state_is_idle() {
        let state = TableState::new(ViewState::default());
        let snapshot = state.snapshot();

        assert_eq!(snapshot.phase, TablePhase::Idle);
        assert_eq!(snapshot.epoch, Epoch::ZERO);
        assert!(snapshot.rows.is_empty());
        assert_eq!(snapshot.window.start, 0);
    }

    #[test]
    fn test_success_displays_rows() {
        let mut state = TableState::new(ViewState::default());
        let request = state.begin_fetch();
        assert_eq!(state.phase(), TablePhase::Loading);
        assert!(state.snapshot().is_loading());

        let result = state.apply(success(&request, rows(10)));
        let snapshot = state.snapshot();

        assert_eq!(
            result,
            ApplyResult::Displayed {
                epoch: request.epoch,
                row_count: 10
            }
        );
        assert_eq!(snapshot.phase, TablePhase::Displaying);
        assert!(!snapshot.is_loading());
        assert!(!snapshot.is_error());
        assert_eq!(snapshot.rows.len(), 10);
        assert!(snapshot.last_refreshed.is_some());
    }

    #[test]
    fn test_stale_outcome_is_discarded() {
        let mut state = TableState::new(ViewState::default());
        let first = state.begin_fetch();
        state.set_view(ViewState::default().with(ViewField::Currency(Currency::Eur)));
        let second = state.begin_fetch();

        state.apply(success(&second, rows(2)));
        let result = state.apply(success(&first, rows(5)));

        assert_eq!(
            result,
            ApplyResult::Discarded {
                epoch: first.epoch,
                current: second.epoch
            }
        );
        assert_eq!(state.snapshot().rows.len(), 2);
    }

    #[test]
    fn test_late_failure_does_not_set_error() {
        let mut state = TableState::new(ViewState::default());
        let first = state.begin_fetch();
        let second = state.begin_fetch();

        state.apply(success(&second, rows(3)));
        state.apply(failure(&first));

        let snapshot = state.snapshot();
        assert!(!snapshot.is_error());
        assert_eq!(snapshot.phase, TablePhase::Displaying);
    }

    #[test]
    fn test_failure_retains_rows() {
        let mut state = TableState::new(ViewState::default());
        let first = state.begin_fetch();
        state.apply(success(&first, rows(4)));

        let second = state.begin_fetch();
        let result = state.apply(failure(&second));

        let snapshot = state.snapshot();
        assert!(matches!(result, ApplyResult::Failed { .. }));
        assert!(snapshot.is_error());
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.rows.len(), 4);
        assert_eq!(snapshot.last_error.as_deref(), Some("Rate limit exceeded"));
    }

    #[test]
    fn test_begin_fetch_clears_error() {
        let mut state = TableState::new(ViewState::default());
        let first = state.begin_fetch();
        state.apply(failure(&first));

        let second = state.begin_fetch();
        let snapshot = state.snapshot();
        assert_eq!(second.epoch, first.epoch.next());
        assert!(!snapshot.is_error());
        assert!(snapshot.last_error.is_none());
    }

    #[test]
    fn test_set_view_detects_change() {
        let mut state = TableState::new(ViewState::default());
        assert!(!state.set_view(ViewState::default()));
        assert!(state.set_view(ViewState::default().with(ViewField::Page(Page::new(2).unwrap()))));
        assert_eq!(state.epoch(), Epoch::ZERO);
    }

    #[test]
    fn test_sort_cycle_reorders_loaded_rows_only() {
        let mut state = TableState::new(ViewState::default());
        let request = state.begin_fetch();
        let mut loaded = vec![row("b", 200.0), row("a", 100.0), row("c", 300.0)];
        loaded[1].market_cap = None;
        state.apply(success(&request, loaded));

        let spec = state.toggle_sort(SortColumn::MarketCap);
        assert_eq!(spec.unwrap().direction, SortDirection::Ascending);
        assert_eq!(ids(&state.snapshot()), vec!["b", "c", "a"]);

        let spec = state.toggle_sort(SortColumn::MarketCap);
        assert_eq!(spec.unwrap().direction, SortDirection::Descending);
        assert_eq!(ids(&state.snapshot()), vec!["c", "b", "a"]);

        assert_eq!(state.toggle_sort(SortColumn::MarketCap), None);
        assert_eq!(state.sort(), None);
        assert_eq!(ids(&state.snapshot()), vec!["b", "a", "c"]);

        // sorting never starts a new epoch
        assert_eq!(state.epoch(), request.epoch);
    }

    #[test]
    fn test_sort_survives_refresh() {
        let mut state = TableState::new(ViewState::default());
        state.set_sort(Some(SortSpec {
            column: SortColumn::CurrentPrice,
            direction: SortDirection::Ascending,
        }));

        let request = state.begin_fetch();
        state.apply(success(&request, vec![row("x", 900.0), row("y", 100.0)]));

        assert_eq!(ids(&state.snapshot()), vec!["y", "x"]);
    }

    #[test]
    fn test_window_tracks_page_and_loaded_rows() {
        let view = ViewState::new(Page::new(3).unwrap(), RowsPerPage::new(20).unwrap(), Currency::Usd);
        let mut state = TableState::new(view);
        let request = state.begin_fetch();
        state.apply(success(&request, rows(15)));

        let window = state.snapshot().window;
        assert_eq!(window.start, 41);
        assert_eq!(window.end, 55);
        assert_eq!(window.total, NOMINAL_TOTAL_COUNT);
    }
}

//! Table controller
//!
//! Owns the fetch lifecycle. The controller runs as one Tokio task that
//! reacts to three sources:
//!
//! ```text
//! TableHandle ──commands──┐
//! RefreshTimer ──ticks────┼──▶ TableController ──snapshots──▶ watch
//! in-flight fetches ──────┘          │
//!                                    └──events──▶ broadcast
//! ```
//!
//! In-flight fetches are polled inside the same task, so the epoch counter
//! and rows are never shared across tasks. A superseded fetch is left to
//! finish; its outcome is dropped on arrival by the staleness guard.

use crate::{
    config::TableConfig,
    constants::COMMAND_CHANNEL_CAPACITY,
    error::TableError,
    fetcher::DataFetcher,
    metrics::{FetchMetrics, FetchStats},
    state::{ApplyResult, TableState},
    timer::RefreshTimer,
    types::{FetchOutcome, SortColumn, SortSpec, TableEvent, TableSnapshot, ViewState},
};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Requests sent from a [`TableHandle`] to the controller task
#[derive(Debug)]
enum Command {
    SetView(ViewState),
    Refresh,
    ToggleSort(SortColumn),
    SetSort(Option<SortSpec>),
    Shutdown,
}

/// Why a fetch was started
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Start,
    ViewChanged,
    Timer,
    Manual,
}

impl Trigger {
    fn as_str(&self) -> &'static str {
        match self {
            Trigger::Start => "start",
            Trigger::ViewChanged => "view_changed",
            Trigger::Timer => "timer",
            Trigger::Manual => "manual",
        }
    }
}

pub struct TableController {
    state: TableState,
    fetcher: DataFetcher,
    timer: RefreshTimer,
    in_flight: FuturesUnordered<BoxFuture<'static, FetchOutcome>>,
    commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<TableSnapshot>,
    events: broadcast::Sender<TableEvent>,
}

impl TableController {
    /// Spawns the controller task and issues the initial fetch
    ///
    /// Must be called from within a Tokio runtime. The task stops when
    /// [`TableHandle::shutdown`] is called or the handle is dropped.
    pub fn spawn(view: ViewState, fetcher: DataFetcher, config: &TableConfig) -> TableHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let state = TableState::new(view);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let metrics = fetcher.metrics().clone();

        let controller = TableController {
            state,
            fetcher,
            timer: RefreshTimer::start(config.refresh_interval),
            in_flight: FuturesUnordered::new(),
            commands: command_rx,
            snapshots: snapshot_tx,
            events: event_tx.clone(),
        };
        let task = tokio::spawn(controller.run());

        TableHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
            metrics,
            task: Some(task),
        }
    }

    async fn run(mut self) {
        tracing::info!(
            view = %self.state.view(),
            provider = self.fetcher.provider_name(),
            refresh_interval_secs = self.timer.period().as_secs(),
            "Starting table controller"
        );

        self.trigger(Trigger::Start);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = self.timer.tick() => self.trigger(Trigger::Timer),
                Some(outcome) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.complete(outcome);
                }
            }
        }

        tracing::info!(
            abandoned_fetches = self.in_flight.len(),
            "Table controller stopped"
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetView(view) => {
                if self.state.set_view(view) {
                    // refresh cadence restarts from the latest change
                    self.timer.reset();
                    self.trigger(Trigger::ViewChanged);
                }
            }
            Command::Refresh => self.trigger(Trigger::Manual),
            Command::ToggleSort(column) => {
                self.state.toggle_sort(column);
                self.publish();
            }
            Command::SetSort(sort) => {
                self.state.set_sort(sort);
                self.publish();
            }
            Command::Shutdown => {}
        }
    }

    /// Starts a new epoch and queues its fetch
    fn trigger(&mut self, trigger: Trigger) {
        let request = self.state.begin_fetch();
        tracing::debug!(
            epoch = request.epoch.get(),
            trigger = trigger.as_str(),
            view = %request.params,
            "Issuing fetch"
        );

        let fetcher = self.fetcher.clone();
        self.in_flight
            .push(async move { fetcher.fetch(request).await }.boxed());
        self.publish();
    }

    fn complete(&mut self, outcome: FetchOutcome) {
        let event = match self.state.apply(outcome) {
            ApplyResult::Displayed { epoch, row_count } => TableEvent::RowsUpdated {
                id: Uuid::new_v4(),
                epoch,
                view: self.state.view(),
                row_count,
                timestamp: Utc::now(),
            },
            ApplyResult::Failed { epoch, message } => TableEvent::FetchFailed {
                id: Uuid::new_v4(),
                epoch,
                view: self.state.view(),
                error_message: message,
                timestamp: Utc::now(),
            },
            ApplyResult::Discarded { epoch, current } => {
                tracing::debug!(
                    epoch = epoch.get(),
                    current_epoch = current.get(),
                    "Discarding superseded fetch result"
                );
                self.fetcher.metrics().record_discarded();
                let _ = self.events.send(TableEvent::StaleDiscarded {
                    id: Uuid::new_v4(),
                    epoch,
                    current_epoch: current,
                    timestamp: Utc::now(),
                });
                return;
            }
        };

        self.publish();
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}

/// Handle to a running [`TableController`]
///
/// Dropping the handle aborts the controller task, cancelling its timer.
pub struct TableHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<TableSnapshot>,
    events: broadcast::Sender<TableEvent>,
    metrics: Arc<FetchMetrics>,
    task: Option<JoinHandle<()>>,
}

impl TableHandle {
    /// Replaces the view state; a changed state triggers one fetch
    pub async fn set_view(&self, view: ViewState) -> Result<(), TableError> {
        self.send(Command::SetView(view)).await
    }

    /// Fetches the current page again without touching the timer
    pub async fn refresh(&self) -> Result<(), TableError> {
        self.send(Command::Refresh).await
    }

    /// Cycles the client-side sort on `column`
    pub async fn toggle_sort(&self, column: SortColumn) -> Result<(), TableError> {
        self.send(Command::ToggleSort(column)).await
    }

    pub async fn set_sort(&self, sort: Option<SortSpec>) -> Result<(), TableError> {
        self.send(Command::SetSort(sort)).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> TableSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<TableSnapshot> {
        self.snapshots.clone()
    }

    /// Receiver for table events published from now on
    pub fn events(&self) -> broadcast::Receiver<TableEvent> {
        self.events.subscribe()
    }

    pub fn fetch_stats(&self) -> FetchStats {
        self.metrics.stats()
    }

    /// Whether the controller task is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the controller and waits for its task to end
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Table controller task ended abnormally");
            }
        }
    }

    async fn send(&self, command: Command) -> Result<(), TableError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| TableError::ControllerClosed)
    }
}

impl Drop for TableHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

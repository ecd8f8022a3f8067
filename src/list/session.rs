//! Async driver that wires a [`ListController`] to a [`ListFetcher`].
//!
//! [`spawn`] starts a session task and returns a [`ListHandle`]. The task owns
//! the controller, one debouncer per filter field and the set of running
//! fetches. Commands from the handle, settled filter values and fetch
//! completions are all processed on that one task, so controller transitions
//! never race each other. After every event the task publishes a fresh
//! [`ListSnapshot`] on a watch channel.
//!
//! Dropping the handle (or calling [`ListHandle::close`]) tears the task down.
//! Pending debounce timers and in-flight fetches are aborted with it, so no
//! state is written after teardown.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle, JoinSet};

use crate::config::Config;
use crate::error::{ConsoleError, Result};

use super::controller::{Completion, FetchRequest, FetchTicket, ListController, ListSnapshot};
use super::debounce::Debouncer;
use super::fetcher::{ListFetcher, ListPage};
use super::filters::{FilterField, FilterState, FilterValue};

/// Tunables for one list session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSessionConfig {
    pub page_size: u32,
    /// Quiescence delay applied to every filter field
    pub debounce: Duration,
    pub min_search_chars: usize,
}

impl Default for ListSessionConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            debounce: Duration::from_millis(300),
            min_search_chars: 0,
        }
    }
}

impl From<&Config> for ListSessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            page_size: config.lists.page_size,
            debounce: config.debounce(),
            min_search_chars: config.lists.min_search_chars,
        }
    }
}

#[derive(Debug)]
enum Command {
    SetFilter(FilterField, FilterValue),
    LoadMore,
    Refresh,
    Close,
}

/// A filter value that outlived its debounce delay.
#[derive(Debug)]
struct Settled {
    field: FilterField,
    value: FilterValue,
    generation: u64,
}

type FetchOutcome<T> = (FetchTicket, Result<ListPage<T>>);

/// Start a list session over `fetcher` and issue the first page fetch.
///
/// Must be called from within a tokio runtime.
pub fn spawn<F: ListFetcher>(
    fetcher: Arc<F>,
    config: ListSessionConfig,
    filters: FilterState,
) -> ListHandle<F::Record> {
    let mut controller = ListController::new(config.page_size)
        .with_filters(filters)
        .with_min_search_chars(config.min_search_chars);
    let first = controller.refresh();

    let (publisher, snapshots) = watch::channel(controller.snapshot());
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (settled_tx, settled_rx) = mpsc::unbounded_channel();

    let session = Session {
        fetcher,
        controller,
        debounce: config.debounce,
        debouncers: HashMap::new(),
        settled_tx,
        settling: HashMap::new(),
        generation: 0,
        fetches: JoinSet::new(),
        acknowledged: 0,
        publisher,
    };
    let task = tokio::spawn(session.run(command_rx, settled_rx, first));

    ListHandle {
        commands: command_tx,
        snapshots,
        sent: AtomicU64::new(0),
        task: Some(task),
    }
}

struct Session<F: ListFetcher> {
    fetcher: Arc<F>,
    controller: ListController<F::Record>,
    debounce: Duration,
    debouncers: HashMap<FilterField, Debouncer<Settled>>,
    settled_tx: mpsc::UnboundedSender<Settled>,
    /// Latest pushed generation per field that has not settled yet
    settling: HashMap<FilterField, u64>,
    generation: u64,
    fetches: JoinSet<FetchOutcome<F::Record>>,
    acknowledged: u64,
    publisher: watch::Sender<ListSnapshot<F::Record>>,
}

impl<F: ListFetcher> Session<F> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut settled: mpsc::UnboundedReceiver<Settled>,
        first: FetchRequest,
    ) {
        self.issue(first);

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.acknowledged += 1;
                    if !self.handle_command(command) {
                        break;
                    }
                }
                Some(value) = settled.recv() => self.handle_settled(value),
                Some(joined) = self.fetches.join_next() => self.handle_joined(joined),
            }
            self.publish();
        }

        tracing::debug!(
            abandoned = self.fetches.len(),
            "list session closed"
        );
    }

    /// Returns false when the session should stop.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::SetFilter(field, value) => {
                if let Err(e) = self.controller.set_filter(field.clone(), value.clone()) {
                    tracing::warn!(%field, "ignoring filter edit: {e}");
                    return true;
                }
                self.generation += 1;
                self.settling.insert(field.clone(), self.generation);

                let delay = self.debounce;
                let output = self.settled_tx.clone();
                let generation = self.generation;
                self.debouncers
                    .entry(field.clone())
                    .or_insert_with(|| Debouncer::new(delay, output))
                    .push(Settled {
                        field,
                        value,
                        generation,
                    });
            }
            Command::LoadMore => {
                if let Some(request) = self.controller.load_more() {
                    self.issue(request);
                }
            }
            Command::Refresh => {
                self.fetcher.invalidate();
                let request = self.controller.refresh();
                self.issue(request);
            }
            Command::Close => return false,
        }
        true
    }

    fn handle_settled(&mut self, settled: Settled) {
        let Settled {
            field,
            value,
            generation,
        } = settled;

        // A newer edit of the same field is already waiting out its own delay
        if self.settling.get(&field) != Some(&generation) {
            tracing::trace!(%field, generation, "superseded filter value");
            return;
        }
        self.settling.remove(&field);

        match self.controller.settle(field, value) {
            Ok(Some(request)) => self.issue(request),
            Ok(None) => {}
            Err(e) => tracing::warn!("failed to apply settled filter: {e}"),
        }
    }

    fn handle_joined(&mut self, joined: std::result::Result<FetchOutcome<F::Record>, JoinError>) {
        let (ticket, result) = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!("fetch task ended without a result: {e}");
                return;
            }
        };

        match self.controller.complete(ticket, result) {
            Completion::Applied { appended } => {
                tracing::debug!(
                    cursor = ticket.cursor,
                    appended,
                    total = self.controller.records().len(),
                    has_more = self.controller.has_more(),
                    "page applied"
                );
            }
            Completion::Failed | Completion::Stale => {}
        }
    }

    fn issue(&mut self, request: FetchRequest) {
        tracing::debug!(
            epoch = request.ticket.epoch,
            cursor = request.ticket.cursor,
            filters = %request.query.filters,
            "fetching page"
        );

        let fetcher = Arc::clone(&self.fetcher);
        self.fetches.spawn(async move {
            let FetchRequest { ticket, query } = request;
            let result = AssertUnwindSafe(fetcher.fetch_page(&query))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ConsoleError::Other("list fetch panicked".to_string())));
            (ticket, result)
        });
    }

    fn publish(&self) {
        let mut snapshot = self.controller.snapshot();
        snapshot.is_settling = !self.settling.is_empty();
        snapshot.acknowledged = self.acknowledged;
        self.publisher.send_replace(snapshot);
    }
}

/// Owner's side of a running list session.
pub struct ListHandle<T> {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<ListSnapshot<T>>,
    sent: AtomicU64,
    task: Option<JoinHandle<()>>,
}

impl<T: Clone> ListHandle<T> {
    /// Edit one filter field. The list refetches once the edit settles.
    pub fn set_filter(&self, field: FilterField, value: FilterValue) -> Result<()> {
        self.send(Command::SetFilter(field, value))
    }

    pub fn set_search(&self, text: impl Into<String>) -> Result<()> {
        self.set_filter(FilterField::Search, FilterValue::text(text))
    }

    /// Ask for the next page. Ignored while a fetch is outstanding or after
    /// the last page.
    pub fn load_more(&self) -> Result<()> {
        self.send(Command::LoadMore)
    }

    /// Drop accumulated records and refetch from the first page.
    pub fn refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    /// The most recently published state.
    pub fn snapshot(&self) -> ListSnapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot<T>> {
        self.snapshots.clone()
    }

    /// Wait for the first snapshot, current one included, that satisfies
    /// `predicate`.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&ListSnapshot<T>) -> bool,
    ) -> Result<ListSnapshot<T>> {
        self.snapshots
            .wait_for(predicate)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| ConsoleError::Other("list session closed".to_string()))
    }

    /// Wait until every command sent so far has been processed and nothing
    /// is pending: no fetch in flight and no filter edit waiting to settle.
    pub async fn wait_idle(&mut self) -> Result<ListSnapshot<T>> {
        let sent = self.sent.load(Ordering::Acquire);
        self.wait_for(|snapshot| snapshot.acknowledged >= sent && snapshot.is_idle())
            .await
    }

    /// Stop the session and wait for its task to finish.
    pub async fn close(mut self) {
        let _ = self.commands.send(Command::Close);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| ConsoleError::Other("list session closed".to_string()))?;
        self.sent.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

impl<T> Drop for ListHandle<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

//! State machine behind a filtered, infinitely scrolling list.
//!
//! `ListController` owns everything a list view knows: the raw and settled
//! filters, the page cursor, the accumulated records, and the loading and
//! error flags. It performs no I/O. Each transition that needs data returns
//! a [`FetchRequest`] tagged with a [`FetchTicket`]; the caller runs the fetch
//! and hands the outcome back to [`ListController::complete`] together with
//! that ticket. A ticket that no longer matches the controller's expectation
//! is stale and its outcome is dropped without touching any state.
//!
//! The epoch in a ticket advances on every reset (a settled filter change or
//! an explicit refresh), so it stands in for the settled filters in the
//! `(filters, cursor)` comparison.

use std::fmt;
use std::sync::Arc;

use crate::error::{ConsoleError, Result};

use super::accumulated::{AccumulatedList, Record};
use super::fetcher::{ListPage, PageQuery};
use super::filters::{FilterField, FilterState, FilterValue};

/// Identity of one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    pub epoch: u64,
    pub cursor: u32,
}

/// A fetch the caller must perform.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub query: PageQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No response was received
    Transport,
    /// The server rejected the request
    Remote,
}

/// Cloneable description of a failed fetch, as shown to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub kind: FailureKind,
    pub status: Option<u16>,
    pub message: String,
}

impl From<&ConsoleError> for FetchFailure {
    fn from(error: &ConsoleError) -> Self {
        match error {
            ConsoleError::Remote { status, .. } => FetchFailure {
                kind: FailureKind::Remote,
                status: Some(*status),
                message: error.to_string(),
            },
            other => FetchFailure {
                kind: FailureKind::Transport,
                status: None,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetch failed: {}", self.message)
    }
}

impl From<FetchFailure> for ConsoleError {
    fn from(failure: FetchFailure) -> Self {
        ConsoleError::Other(failure.message)
    }
}

/// What [`ListController::complete`] did with a fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The page was merged; `appended` counts records not already present
    Applied { appended: usize },
    /// The error was recorded
    Failed,
    /// The ticket was superseded; nothing changed
    Stale,
}

/// Read-only view of a controller, published to the renderer.
#[derive(Debug, Clone)]
pub struct ListSnapshot<T> {
    /// Shared with the controller; unchanged records are not copied per snapshot
    pub records: Arc<Vec<T>>,
    /// True during the first fetch of a filter epoch
    pub is_loading: bool,
    /// True during a load-more fetch
    pub is_fetching_more: bool,
    pub has_more: bool,
    pub error: Option<FetchFailure>,
    pub page_cursor: u32,
    pub filters: FilterState,
    /// True while an edited filter is waiting to settle
    pub is_settling: bool,
    /// Number of commands the owning session has processed
    pub acknowledged: u64,
}

impl<T> Default for ListSnapshot<T> {
    fn default() -> Self {
        Self {
            records: Arc::default(),
            is_loading: false,
            is_fetching_more: false,
            has_more: true,
            error: None,
            page_cursor: 0,
            filters: FilterState::default(),
            is_settling: false,
            acknowledged: 0,
        }
    }
}

impl<T> ListSnapshot<T> {
    /// True while any fetch for the current view is outstanding.
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_fetching_more
    }

    /// Nothing is outstanding: no fetch and no unsettled filter edit.
    pub fn is_idle(&self) -> bool {
        !self.is_busy() && !self.is_settling
    }
}

pub struct ListController<T: Record> {
    page_size: u32,
    min_search_chars: usize,
    raw: FilterState,
    settled: FilterState,
    epoch: u64,
    cursor: u32,
    accumulated: AccumulatedList<T>,
    in_flight: bool,
    has_more: bool,
    /// The page at `cursor` has not been applied: never fetched, or its fetch failed
    needs_fetch: bool,
    error: Option<FetchFailure>,
}

impl<T: Record + Clone> ListController<T> {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            min_search_chars: 0,
            raw: FilterState::default(),
            settled: FilterState::default(),
            epoch: 0,
            cursor: 0,
            accumulated: AccumulatedList::new(),
            in_flight: false,
            has_more: true,
            needs_fetch: true,
            error: None,
        }
    }

    /// Start from `filters` instead of the empty filter set.
    pub fn with_filters(mut self, filters: FilterState) -> Self {
        self.raw = filters.clone();
        self.settled = filters;
        self
    }

    /// Ignore non-empty search text shorter than `chars` characters.
    pub fn with_min_search_chars(mut self, chars: usize) -> Self {
        self.min_search_chars = chars;
        self
    }

    /// Record a filter edit. Nothing is fetched until the edit settles.
    pub fn set_filter(&mut self, field: FilterField, value: FilterValue) -> Result<()> {
        self.raw.apply(field, value)
    }

    /// Apply a debounced filter value.
    ///
    /// Returns the cursor-0 fetch for the new filter epoch when the settled
    /// filters actually changed, `None` otherwise.
    pub fn settle(&mut self, field: FilterField, value: FilterValue) -> Result<Option<FetchRequest>> {
        let value = match (&field, value) {
            (FilterField::Search, FilterValue::Text(text)) => {
                let trimmed = text.trim();
                let chars = trimmed.chars().count();
                if chars > 0 && chars < self.min_search_chars {
                    tracing::debug!(
                        search = trimmed,
                        min = self.min_search_chars,
                        "search text below minimum length, not settling"
                    );
                    return Ok(None);
                }
                FilterValue::Text(trimmed.to_string())
            }
            (_, value) => value,
        };

        let mut next = self.settled.clone();
        next.apply(field, value)?;
        if next == self.settled {
            return Ok(None);
        }

        self.settled = next;
        Ok(Some(self.reset()))
    }

    /// Discard accumulated records and refetch cursor 0 under the current
    /// settled filters.
    pub fn refresh(&mut self) -> FetchRequest {
        self.reset()
    }

    /// Request the next page.
    ///
    /// Ignored while a fetch is outstanding or after the last page. When the
    /// current page has not been applied yet (first use, or its fetch failed)
    /// the same cursor is requested again instead of advancing.
    pub fn load_more(&mut self) -> Option<FetchRequest> {
        if self.in_flight {
            return None;
        }
        if self.needs_fetch {
            self.in_flight = true;
            return Some(self.request());
        }
        if !self.has_more {
            return None;
        }

        self.cursor += 1;
        self.in_flight = true;
        Some(self.request())
    }

    /// Apply the outcome of the fetch identified by `ticket`.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: Result<ListPage<T>>,
    ) -> Completion {
        if !self.in_flight || ticket != self.expected_ticket() {
            tracing::debug!(
                ?ticket,
                expected = ?self.expected_ticket(),
                ok = result.is_ok(),
                "dropping stale fetch result"
            );
            return Completion::Stale;
        }

        self.in_flight = false;
        match result {
            Ok(page) => {
                let appended = self.accumulated.merge(page.records);
                self.has_more = page.has_more;
                self.needs_fetch = false;
                self.error = None;
                Completion::Applied { appended }
            }
            Err(err) => {
                tracing::warn!(cursor = self.cursor, "list fetch failed: {err}");
                self.error = Some(FetchFailure::from(&err));
                self.needs_fetch = true;
                Completion::Failed
            }
        }
    }

    fn reset(&mut self) -> FetchRequest {
        self.epoch += 1;
        self.cursor = 0;
        self.accumulated.clear();
        self.has_more = true;
        self.error = None;
        self.needs_fetch = true;
        self.in_flight = true;
        tracing::debug!(epoch = self.epoch, filters = %self.settled, "list reset");
        self.request()
    }

    fn request(&self) -> FetchRequest {
        FetchRequest {
            ticket: self.expected_ticket(),
            query: PageQuery::new(self.settled.clone(), self.cursor, self.page_size),
        }
    }

    /// The ticket a completion must carry to be applied.
    pub fn expected_ticket(&self) -> FetchTicket {
        FetchTicket {
            epoch: self.epoch,
            cursor: self.cursor,
        }
    }

    pub fn records(&self) -> &[T] {
        self.accumulated.records()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight && self.cursor == 0
    }

    pub fn is_fetching_more(&self) -> bool {
        self.in_flight && self.cursor > 0
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn error(&self) -> Option<&FetchFailure> {
        self.error.as_ref()
    }

    pub fn page_cursor(&self) -> u32 {
        self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn raw_filters(&self) -> &FilterState {
        &self.raw
    }

    pub fn settled_filters(&self) -> &FilterState {
        &self.settled
    }

    pub fn snapshot(&self) -> ListSnapshot<T> {
        ListSnapshot {
            records: self.accumulated.shared(),
            is_loading: self.is_loading(),
            is_fetching_more: self.is_fetching_more(),
            has_more: self.has_more,
            error: self.error.clone(),
            page_cursor: self.cursor,
            filters: self.settled.clone(),
            is_settling: false,
            acknowledged: 0,
        }
    }
}

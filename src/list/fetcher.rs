//! Contract between list views and the collection endpoints they page through.

use std::future::Future;

use crate::error::Result;

use super::accumulated::Record;
use super::filters::FilterState;

/// One page request: the filters, a zero-based page index and the page size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageQuery {
    pub filters: FilterState,
    pub page: u32,
    pub page_size: u32,
}

impl PageQuery {
    pub fn new(filters: FilterState, page: u32, page_size: u32) -> Self {
        Self {
            filters,
            page,
            page_size,
        }
    }
}

/// Result of one fetch: the page's records in server order, and whether a
/// further page exists.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub records: Vec<T>,
    pub has_more: bool,
}

impl<T> ListPage<T> {
    pub fn new(records: Vec<T>, has_more: bool) -> Self {
        Self { records, has_more }
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            has_more: false,
        }
    }
}

/// Fetches single pages of one record collection.
///
/// Implementations hold no per-view state. Repeated identical queries must be
/// side-effect free, and a caller may ignore a result that arrives after it
/// stopped caring about it.
pub trait ListFetcher: Send + Sync + 'static {
    type Record: Record + Clone + Send + Sync + 'static;

    /// Fetch the page described by `query`.
    ///
    /// Fails with `ConsoleError::Transport` when no response was received and
    /// `ConsoleError::Remote` for a non-success response.
    fn fetch_page(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = Result<ListPage<Self::Record>>> + Send;

    /// Forget any memoized pages so the next fetch goes to the server.
    fn invalidate(&self) {}
}

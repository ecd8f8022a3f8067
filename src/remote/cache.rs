//! Short-lived in-memory page cache in front of a [`ListFetcher`].
//!
//! A page fetched for a given [`PageQuery`] is served from memory until it is
//! older than the stale window. `invalidate` drops everything; pages whose
//! fetch started before an invalidation are not stored when they arrive.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::Result;
use crate::list::{ListFetcher, ListPage, PageQuery};

struct Pages<T> {
    generation: u64,
    entries: HashMap<PageQuery, (Instant, ListPage<T>)>,
}

pub struct StaleCache<F: ListFetcher> {
    inner: F,
    window: Duration,
    pages: Mutex<Pages<F::Record>>,
}

impl<F: ListFetcher> StaleCache<F> {
    pub fn new(inner: F, window: Duration) -> Self {
        Self {
            inner,
            window,
            pages: Mutex::new(Pages {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Number of pages currently held, fresh or not.
    pub fn len(&self) -> usize {
        self.pages.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, query: &PageQuery) -> (u64, Option<ListPage<F::Record>>) {
        let pages = self.pages.lock();
        let fresh = pages
            .entries
            .get(query)
            .filter(|(stored, _)| stored.elapsed() < self.window)
            .map(|(_, page)| page.clone());
        (pages.generation, fresh)
    }

    fn store(&self, generation: u64, query: &PageQuery, page: &ListPage<F::Record>) {
        let mut pages = self.pages.lock();
        if pages.generation != generation {
            return;
        }
        let window = self.window;
        pages
            .entries
            .retain(|_, (stored, _)| stored.elapsed() < window);
        pages
            .entries
            .insert(query.clone(), (Instant::now(), page.clone()));
    }
}

impl<F: ListFetcher> ListFetcher for StaleCache<F> {
    type Record = F::Record;

    async fn fetch_page(&self, query: &PageQuery) -> Result<ListPage<Self::Record>> {
        let (generation, cached) = self.lookup(query);
        if let Some(page) = cached {
            tracing::debug!(page = query.page, "serving page from cache");
            return Ok(page);
        }

        let page = self.inner.fetch_page(query).await?;
        self.store(generation, query, &page);
        Ok(page)
    }

    fn invalidate(&self) {
        {
            let mut pages = self.pages.lock();
            pages.generation += 1;
            pages.entries.clear();
        }
        self.inner.invalidate();
    }
}

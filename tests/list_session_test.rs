//! End-to-end behaviour of a list session against an in-memory fetcher.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use audience_console::error::{ConsoleError, Result};
use audience_console::list::{
    self, FailureKind, FilterField, FilterState, FilterValue, ListFetcher, ListPage,
    ListSessionConfig, PageQuery, Record,
};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    id: u32,
    name: String,
}

impl Record for Row {
    type Key = u32;

    fn key(&self) -> u32 {
        self.id
    }
}

/// Returns rows whose name contains the search text, `page_size` per page.
/// Delays and failures can be scripted per search text.
struct FakeFetcher {
    rows: Vec<Row>,
    delays: HashMap<String, Duration>,
    failures: Mutex<usize>,
    failing_search: Option<String>,
    queries: Mutex<Vec<PageQuery>>,
    completed: AtomicUsize,
}

impl FakeFetcher {
    fn new(names: &[&str]) -> Self {
        let rows = names
            .iter()
            .enumerate()
            .map(|(i, name)| Row {
                id: i as u32 + 1,
                name: name.to_string(),
            })
            .collect();
        Self {
            rows,
            delays: HashMap::new(),
            failures: Mutex::new(0),
            failing_search: None,
            queries: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, search: &str, delay: Duration) -> Self {
        self.delays.insert(search.to_string(), delay);
        self
    }

    /// Fail the next `count` fetches with a 500.
    fn failing(self, count: usize) -> Self {
        *self.failures.lock() = count;
        self
    }

    /// Every fetch for `search` fails without a response.
    fn failing_for(mut self, search: &str) -> Self {
        self.failing_search = Some(search.to_string());
        self
    }

    fn searches(&self) -> Vec<String> {
        self.queries
            .lock()
            .iter()
            .map(|q| q.filters.search.clone())
            .collect()
    }

    fn pages(&self) -> Vec<u32> {
        self.queries.lock().iter().map(|q| q.page).collect()
    }
}

impl ListFetcher for FakeFetcher {
    type Record = Row;

    async fn fetch_page(&self, query: &PageQuery) -> Result<ListPage<Row>> {
        self.queries.lock().push(query.clone());
        let delay = self
            .delays
            .get(&query.filters.search)
            .copied()
            .unwrap_or(Duration::from_millis(10));
        tokio::time::sleep(delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing_search.as_deref() == Some(query.filters.search.as_str()) {
            return Err(ConsoleError::Transport("connection reset".to_string()));
        }

        {
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(ConsoleError::Remote {
                    status: 500,
                    code: None,
                    message: "unavailable".to_string(),
                });
            }
        }

        let matching: Vec<Row> = self
            .rows
            .iter()
            .filter(|r| r.name.contains(&query.filters.search))
            .cloned()
            .collect();
        let size = query.page_size as usize;
        let start = query.page as usize * size;
        let page: Vec<Row> = matching.iter().skip(start).take(size).cloned().collect();
        Ok(ListPage::new(page, start + size < matching.len()))
    }
}

fn config(page_size: u32) -> ListSessionConfig {
    ListSessionConfig {
        page_size,
        debounce: Duration::from_millis(300),
        min_search_chars: 0,
    }
}

fn names(records: &[Row]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_rapid_typing_fetches_once_per_settle() {
    let fetcher = Arc::new(FakeFetcher::new(&["churn", "chatty", "loyal"]));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(10), FilterState::new());
    handle.wait_idle().await.unwrap();

    for text in ["c", "ch", "chu", "churn"] {
        handle.set_search(text).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let snapshot = handle.wait_idle().await.unwrap();
    assert_eq!(names(&snapshot.records), vec!["churn"]);
    assert_eq!(fetcher.searches(), vec!["", "churn"]);
}

#[tokio::test(start_paused = true)]
async fn test_late_result_from_previous_filter_is_ignored() {
    let fetcher = Arc::new(
        FakeFetcher::new(&["alpha", "beta", "alphabet"])
            .with_delay("alpha", Duration::from_millis(1000)),
    );
    let mut handle = list::spawn(Arc::clone(&fetcher), config(10), FilterState::new());
    handle.wait_idle().await.unwrap();

    handle.set_search("alpha").unwrap();
    // The slow "alpha" fetch starts after the debounce and is still running
    tokio::time::sleep(Duration::from_millis(400)).await;
    handle.set_search("beta").unwrap();

    let snapshot = handle.wait_idle().await.unwrap();
    assert_eq!(snapshot.filters.search, "beta");
    assert_eq!(names(&snapshot.records), vec!["beta"]);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let snapshot = handle.snapshot();
    assert_eq!(names(&snapshot.records), vec!["beta"]);
    assert!(snapshot.error.is_none());
    assert_eq!(fetcher.searches(), vec!["", "alpha", "beta"]);
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_from_previous_filter_is_hidden() {
    let fetcher = Arc::new(
        FakeFetcher::new(&["new-a", "new-b", "new-c"])
            .with_delay("old", Duration::from_millis(1000))
            .failing_for("old"),
    );
    let initial = FilterState::new()
        .with(FilterField::Search, FilterValue::text("old"))
        .unwrap();
    let mut handle = list::spawn(Arc::clone(&fetcher), config(2), initial);

    handle.set_search("new").unwrap();
    handle.wait_idle().await.unwrap();
    handle.load_more().unwrap();
    let snapshot = handle.wait_idle().await.unwrap();
    assert!(!snapshot.has_more);

    // The "old" fetch fails long after the filter moved on
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fetcher.completed.load(Ordering::SeqCst), 3);

    let snapshot = handle.snapshot();
    assert!(snapshot.error.is_none());
    assert_eq!(names(&snapshot.records), vec!["new-a", "new-b", "new-c"]);
    assert_eq!(snapshot.page_cursor, 1);
    assert!(!snapshot.has_more);
    assert_eq!(fetcher.searches(), vec!["old", "new", "new"]);
    assert_eq!(fetcher.pages(), vec![0, 0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_category_edits_wait_for_quiescence() {
    let fetcher = Arc::new(FakeFetcher::new(&["a1"]));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(10), FilterState::new());
    handle.wait_idle().await.unwrap();

    for tag in ["a", "ab", "abc"] {
        handle
            .set_filter(FilterField::category("tag"), FilterValue::text(tag))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fetcher.queries.lock().len(), 1);
    }

    tokio::time::sleep(Duration::from_millis(1)).await;
    handle.wait_idle().await.unwrap();

    let queries = fetcher.queries.lock().clone();
    assert_eq!(queries.len(), 2);
    let tags = queries[1].filters.tags("tag").expect("tag filter sent");
    assert_eq!(tags.iter().collect::<Vec<_>>(), vec!["abc"]);
}

#[tokio::test(start_paused = true)]
async fn test_pages_accumulate_in_order() {
    let fetcher = Arc::new(FakeFetcher::new(&["a1", "a2", "a3", "a4", "a5"]));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(2), FilterState::new());
    handle.wait_idle().await.unwrap();

    while handle.snapshot().has_more {
        handle.load_more().unwrap();
        handle.wait_idle().await.unwrap();
    }

    let snapshot = handle.snapshot();
    assert_eq!(names(&snapshot.records), vec!["a1", "a2", "a3", "a4", "a5"]);
    assert_eq!(snapshot.page_cursor, 2);
    assert_eq!(fetcher.pages(), vec![0, 1, 2]);

    // Further requests after the last page are no-ops
    handle.load_more().unwrap();
    handle.wait_idle().await.unwrap();
    assert_eq!(fetcher.pages(), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_page_is_retried_at_same_cursor() {
    let fetcher = Arc::new(FakeFetcher::new(&["a1", "a2", "a3"]).failing(1));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(2), FilterState::new());

    let snapshot = handle.wait_idle().await.unwrap();
    let failure = snapshot.error.expect("first fetch fails");
    assert_eq!(failure.kind, FailureKind::Remote);
    assert_eq!(failure.status, Some(500));
    assert!(snapshot.records.is_empty());
    assert!(!snapshot.is_loading);

    handle.load_more().unwrap();
    let snapshot = handle.wait_idle().await.unwrap();
    assert!(snapshot.error.is_none());
    assert_eq!(names(&snapshot.records), vec!["a1", "a2"]);
    assert_eq!(fetcher.pages(), vec![0, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_category_filter_change_restarts_list() {
    let fetcher = Arc::new(FakeFetcher::new(&["a1", "a2", "a3"]));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(2), FilterState::new());
    handle.wait_idle().await.unwrap();
    handle.load_more().unwrap();
    handle.wait_idle().await.unwrap();

    handle
        .set_filter(
            FilterField::category("status"),
            FilterValue::tags(["LIVE"]),
        )
        .unwrap();
    let snapshot = handle.wait_idle().await.unwrap();
    assert_eq!(snapshot.page_cursor, 0);
    assert_eq!(names(&snapshot.records), vec!["a1", "a2"]);

    // Re-applying the same value does not refetch
    handle
        .set_filter(
            FilterField::category("status"),
            FilterValue::tags(["LIVE"]),
        )
        .unwrap();
    handle.wait_idle().await.unwrap();
    assert_eq!(fetcher.pages(), vec![0, 1, 0]);
}

#[tokio::test(start_paused = true)]
async fn test_short_search_does_not_fetch() {
    let fetcher = Arc::new(FakeFetcher::new(&["churn"]));
    let session = ListSessionConfig {
        min_search_chars: 3,
        ..config(10)
    };
    let mut handle = list::spawn(Arc::clone(&fetcher), session, FilterState::new());
    handle.wait_idle().await.unwrap();

    handle.set_search("ch").unwrap();
    let snapshot = handle.wait_idle().await.unwrap();
    assert_eq!(snapshot.filters.search, "");
    assert_eq!(fetcher.searches(), vec![""]);
}

#[tokio::test(start_paused = true)]
async fn test_no_fetch_completes_after_teardown() {
    let fetcher = Arc::new(
        FakeFetcher::new(&["slow"]).with_delay("", Duration::from_millis(500)),
    );
    let handle = list::spawn(Arc::clone(&fetcher), config(10), FilterState::new());
    let snapshots = handle.subscribe();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(fetcher.queries.lock().len(), 1);
    drop(handle);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fetcher.completed.load(Ordering::SeqCst), 0);
    assert!(snapshots.has_changed().is_err());
    assert!(snapshots.borrow().records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pending_edit_is_dropped_on_close() {
    let fetcher = Arc::new(FakeFetcher::new(&["churn"]));
    let mut handle = list::spawn(Arc::clone(&fetcher), config(10), FilterState::new());
    handle.wait_idle().await.unwrap();

    handle.set_search("churn").unwrap();
    handle.close().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(fetcher.searches(), vec![""]);
}

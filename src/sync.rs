// Keeps three representations of the active filters in agreement: the local
// FilterState (what the controls show), the navigation query held by
// NavState (the shareable state), and the parameters of the next catalog
// fetch issued by whoever watches NavState.
//
// Two update disciplines: immediate commits push the full state at once;
// debounced commits wait out a fixed delay and are superseded wholesale by
// any newer call. Every commit resets pagination to page 1.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};

use crate::filters::{FilterField, FilterState, PAGE_KEY, query_cleared, query_without};
use crate::nav::{NavState, QueryMap};

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct FilterSync {
    nav: Arc<NavState>,
    state: Mutex<FilterState>,
    pending: Mutex<Option<JoinHandle<()>>>,
    delay: Duration,
}

impl FilterSync {
    pub fn new(nav: Arc<NavState>) -> Self {
        Self::with_delay(nav, DEBOUNCE_DELAY)
    }

    pub fn with_delay(nav: Arc<NavState>, delay: Duration) -> Self {
        let state = FilterState::from_query(&nav.current());
        Self {
            nav,
            state: Mutex::new(state),
            pending: Mutex::new(None),
            delay,
        }
    }

    // Snapshot of the local filter state.
    pub fn filters(&self) -> FilterState {
        lock(&self.state).clone()
    }

    // Update a field and commit the whole state at once.
    pub fn set_immediate(&self, field: FilterField, value: &str) {
        self.cancel_pending();
        let snapshot = {
            let mut state = lock(&self.state);
            state.set(field, value);
            state.clone()
        };
        commit(&self.nav, &snapshot);
    }

    // Update a field now, commit after the debounce delay. A newer call
    // replaces the pending commit entirely; only the final state is pushed.
    pub fn set_debounced(&self, field: FilterField, value: &str) {
        let snapshot = {
            let mut state = lock(&self.state);
            state.set(field, value);
            state.clone()
        };

        let mut pending = lock(&self.pending);
        if let Some(task) = pending.take() {
            task.abort();
        }
        let nav = Arc::clone(&self.nav);
        let delay = self.delay;
        *pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            commit(&nav, &snapshot);
        }));
    }

    // Reset every filter to its default. Recognized filter keys are removed
    // from the query; keys outside the recognized set survive.
    pub fn clear(&self) {
        self.cancel_pending();
        *lock(&self.state) = FilterState::default();
        self.nav.push(query_cleared(&self.nav.current()));
    }

    // Delete exactly one key from the query. Pagination resets; everything
    // else is preserved.
    pub fn remove(&self, key: &str) {
        self.cancel_pending();
        self.nav.push(query_without(&self.nav.current(), key));
    }

    // Recompute the local state from the committed query. One-way and
    // idempotent; called on every navigation change regardless of cause.
    pub fn reconcile(&self) {
        *lock(&self.state) = FilterState::from_query(&self.nav.current());
    }

    // Drive reconciliation from the navigation watch channel.
    pub async fn run(&self, mut rx: watch::Receiver<QueryMap>) {
        while rx.changed().await.is_ok() {
            self.reconcile();
        }
    }

    fn cancel_pending(&self) {
        if let Some(task) = lock(&self.pending).take() {
            task.abort();
        }
    }
}

// A stale debounce task must never fire after the synchronizer is gone.
impl Drop for FilterSync {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

// Merge the full state over the existing query and push it as one commit,
// pagination reset to page 1.
fn commit(nav: &NavState, state: &FilterState) {
    let mut query = nav.current();
    state.merge_into(&mut query);
    query.insert(PAGE_KEY.to_string(), "1".to_string());
    nav.push(query);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sync_over(pairs: &[(&str, &str)]) -> (Arc<NavState>, FilterSync) {
        let nav = Arc::new(NavState::new(query_of(pairs)));
        let sync = FilterSync::new(Arc::clone(&nav));
        (nav, sync)
    }

    #[tokio::test]
    async fn immediate_change_commits_once_and_resets_page() {
        let (nav, sync) = sync_over(&[("page", "4"), ("utm_source", "ad")]);
        sync.set_immediate(FilterField::FuelType, "diesel");

        assert_eq!(nav.generation(), 1);
        let query = nav.current();
        assert_eq!(query.get("fuel_type").map(String::as_str), Some("diesel"));
        assert_eq!(query.get("page").map(String::as_str), Some("1"));
        // Keys outside the recognized set ride along untouched.
        assert_eq!(query.get("utm_source").map(String::as_str), Some("ad"));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_debounced_changes_coalesce_into_one_commit() {
        let (nav, sync) = sync_over(&[]);
        sync.set_debounced(FilterField::Search, "a");
        // The control reflects the keystroke before any commit happens.
        assert_eq!(sync.filters().search, "a");
        assert_eq!(nav.generation(), 0);

        tokio::time::advance(Duration::from_millis(200)).await;
        sync.set_debounced(FilterField::Search, "ab");

        tokio::time::advance(Duration::from_millis(600)).await;
        // Let the spawned commit task run.
        tokio::task::yield_now().await;

        assert_eq!(nav.generation(), 1);
        let query = nav.current();
        assert_eq!(query.get("search").map(String::as_str), Some("ab"));
        assert_eq!(query.get("page").map(String::as_str), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_change_supersedes_a_pending_debounce() {
        let (nav, sync) = sync_over(&[]);
        sync.set_debounced(FilterField::Search, "so");
        sync.set_immediate(FilterField::FuelType, "electric");

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;

        // Only the immediate commit landed; the debounced one was aborted.
        assert_eq!(nav.generation(), 1);
        let query = nav.current();
        assert_eq!(query.get("search").map(String::as_str), Some("so"));
        assert_eq!(query.get("fuel_type").map(String::as_str), Some("electric"));
    }

    #[tokio::test]
    async fn clear_strips_filter_keys_but_not_foreign_ones() {
        let (nav, sync) = sync_over(&[
            ("fuel_type", "diesel"),
            ("ordering", "-price"),
            ("page", "7"),
            ("utm_source", "ad"),
        ]);
        sync.clear();

        assert_eq!(sync.filters(), FilterState::default());
        let query = nav.current();
        assert!(!query.contains_key("fuel_type"));
        assert!(!query.contains_key("ordering"));
        assert_eq!(query.get("page").map(String::as_str), Some("1"));
        assert_eq!(query.get("utm_source").map(String::as_str), Some("ad"));
    }

    #[tokio::test]
    async fn remove_deletes_exactly_one_key_and_resets_page() {
        let (nav, sync) = sync_over(&[
            ("fuel_type", "diesel"),
            ("year_min", "2015"),
            ("page", "3"),
        ]);
        sync.remove("fuel_type");

        let query = nav.current();
        assert!(!query.contains_key("fuel_type"));
        assert_eq!(query.get("year_min").map(String::as_str), Some("2015"));
        assert_eq!(query.get("page").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn malformed_numeric_input_reaches_the_fetch_as_no_constraint() {
        use crate::filters::CatalogQuery;

        let (nav, sync) = sync_over(&[]);
        sync.set_immediate(FilterField::YearMin, "abc");

        // The raw string lands in the query, but the typed payload drops it.
        let query = nav.current();
        assert_eq!(query.get("year_min").map(String::as_str), Some("abc"));
        let payload = CatalogQuery::from_query(&query);
        assert_eq!(payload.year_min, None);
    }

    #[tokio::test]
    async fn reconcile_mirrors_the_query_and_is_idempotent() {
        let (nav, sync) = sync_over(&[]);
        nav.push(query_of(&[("fuel_type", "hybrid"), ("page", "2")]));

        sync.reconcile();
        let first = sync.filters();
        assert_eq!(first.fuel_type, "hybrid");

        sync.reconcile();
        assert_eq!(sync.filters(), first);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_synchronizer_cancels_a_pending_commit() {
        let nav = Arc::new(NavState::new(QueryMap::new()));
        {
            let sync = FilterSync::new(Arc::clone(&nav));
            sync.set_debounced(FilterField::Search, "ghost");
        }
        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(nav.generation(), 0);
    }
}

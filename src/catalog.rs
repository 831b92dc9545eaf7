// Owns the authoritative list of currently displayed vehicles and the total
// result count, refetching whenever the navigation query changes.
//
// The provider is seeded from the server-rendered snapshot, so construction
// never fetches. Responses carry a dispatch ticket; only the latest
// dispatched request may commit its result, so a slow stale response can
// never overwrite a newer one.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::encar_api::VehicleApi;
use crate::filters::CatalogQuery;
use crate::models::VehicleSummary;
use crate::nav::{NavState, QueryMap};

// Replaced wholesale on every successful fetch; never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct CatalogResult {
    pub vehicles: Vec<VehicleSummary>,
    pub total_count: u64,
    pub current_page: u32,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct CatalogProvider<A> {
    api: A,
    nav: Arc<NavState>,
    result: Mutex<CatalogResult>,
    in_flight: AtomicUsize,
    // Monotonic dispatch ticket; a response may only commit while it still
    // holds the newest ticket.
    dispatch: AtomicU64,
}

impl<A: VehicleApi> CatalogProvider<A> {
    // Seed from the server-rendered snapshot; the initial render is not
    // fetched a second time.
    pub fn new(api: A, nav: Arc<NavState>, initial: CatalogResult) -> Self {
        Self {
            api,
            nav,
            result: Mutex::new(initial),
            in_flight: AtomicUsize::new(0),
            dispatch: AtomicU64::new(0),
        }
    }

    pub fn result(&self) -> CatalogResult {
        lock(&self.result).clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    // Issue one list request for the current navigation query. On success
    // the result is replaced atomically; on failure the prior state stays
    // and the error is logged. No retries.
    pub async fn refresh(&self) {
        let query = self.nav.current();
        let payload = CatalogQuery::from_query(&query);
        let page = payload.page;
        let ticket = self.dispatch.fetch_add(1, Ordering::SeqCst) + 1;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let outcome = self.api.list_vehicles(&payload).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Ok(listing) => {
                if self.dispatch.load(Ordering::SeqCst) != ticket {
                    tracing::debug!(
                        page,
                        "Discarding stale catalog response superseded by a newer request"
                    );
                    return;
                }
                let mut result = lock(&self.result);
                *result = CatalogResult {
                    vehicles: listing.results,
                    total_count: listing.count,
                    current_page: page,
                };
            }
            Err(e) => {
                tracing::error!("Failed to refresh catalog data: {:?}", e);
            }
        }
    }

    // React to navigation changes: exactly one request per observed change.
    // The watch channel coalesces bursts that land while a fetch is in
    // flight, so identical queries are never refetched back-to-back.
    pub async fn run(&self, mut rx: watch::Receiver<QueryMap>) {
        while rx.changed().await.is_ok() {
            self.refresh().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VehicleListPage;
    use anyhow::{Result, anyhow};
    use tokio::time::{Duration, sleep};

    // Scripted API double: pops responses front-to-back, recording each
    // received payload, with an optional per-call delay.
    struct ScriptedApi {
        responses: Mutex<Vec<(Duration, Result<VehicleListPage>)>>,
        calls: Mutex<Vec<CatalogQuery>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<(Duration, Result<VehicleListPage>)>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<CatalogQuery> {
            lock(&self.calls).clone()
        }
    }

    impl VehicleApi for ScriptedApi {
        async fn list_vehicles(&self, query: &CatalogQuery) -> Result<VehicleListPage> {
            lock(&self.calls).push(query.clone());
            let (delay, outcome) = {
                let mut responses = lock(&self.responses);
                if responses.is_empty() {
                    (Duration::ZERO, Err(anyhow!("script exhausted")))
                } else {
                    responses.remove(0)
                }
            };
            if delay > Duration::ZERO {
                sleep(delay).await;
            }
            outcome
        }

        async fn get_vehicle(
            &self,
            _listing_id: &str,
        ) -> Result<Option<crate::models::VehicleDetail>> {
            Err(anyhow!("not scripted"))
        }
    }

    fn page_of(ids: &[&str]) -> VehicleListPage {
        VehicleListPage {
            count: ids.len() as u64,
            results: ids
                .iter()
                .map(|id| VehicleSummary {
                    listing_id: id.to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn snapshot_of(ids: &[&str]) -> CatalogResult {
        let page = page_of(ids);
        CatalogResult {
            total_count: page.count,
            vehicles: page.results,
            current_page: 1,
        }
    }

    fn query_of(pairs: &[(&str, &str)]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn construction_serves_the_snapshot_without_fetching() {
        let api = ScriptedApi::new(vec![]);
        let nav = Arc::new(NavState::new(QueryMap::new()));
        let provider = CatalogProvider::new(api, nav, snapshot_of(&["a", "b", "c"]));

        let result = provider.result();
        assert_eq!(result.total_count, 3);
        assert_eq!(result.vehicles.len(), 3);
        assert!(provider.api.calls().is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_the_result_atomically() {
        let api = ScriptedApi::new(vec![(Duration::ZERO, Ok(page_of(&["x", "y"])))]);
        let nav = Arc::new(NavState::new(query_of(&[("page", "2")])));
        let provider = CatalogProvider::new(api, nav, snapshot_of(&["a"]));

        provider.refresh().await;

        let result = provider.result();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.current_page, 2);
        assert_eq!(result.vehicles[0].listing_id, "x");
        assert!(!provider.is_loading());
    }

    #[tokio::test]
    async fn failed_refresh_leaves_prior_state_untouched() {
        let api = ScriptedApi::new(vec![(Duration::ZERO, Err(anyhow!("upstream 502")))]);
        let nav = Arc::new(NavState::new(QueryMap::new()));
        let provider = CatalogProvider::new(api, nav, snapshot_of(&["a", "b"]));

        provider.refresh().await;

        let result = provider.result();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.vehicles[0].listing_id, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_never_overwrites_a_newer_one() {
        // First request is slow and resolves after the second; its payload
        // must be discarded.
        let api = ScriptedApi::new(vec![
            (Duration::from_secs(5), Ok(page_of(&["stale"]))),
            (Duration::from_millis(10), Ok(page_of(&["fresh", "fresh2"]))),
        ]);
        let nav = Arc::new(NavState::new(QueryMap::new()));
        let provider = Arc::new(CatalogProvider::new(api, nav.clone(), CatalogResult::default()));

        let slow = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.refresh().await })
        };
        tokio::task::yield_now().await;

        nav.push(query_of(&[("fuel_type", "electric"), ("page", "1")]));
        let fast = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.refresh().await })
        };

        fast.await.expect("fast refresh");
        slow.await.expect("slow refresh");

        let result = provider.result();
        assert_eq!(result.vehicles[0].listing_id, "fresh");
        assert_eq!(result.total_count, 2);
    }

    #[tokio::test]
    async fn run_issues_exactly_one_fetch_per_query_change() {
        let api = ScriptedApi::new(vec![(Duration::ZERO, Ok(page_of(&["e1"])))]);
        let nav = Arc::new(NavState::new(QueryMap::new()));
        let provider = Arc::new(CatalogProvider::new(api, nav.clone(), snapshot_of(&["a"])));

        let rx = nav.subscribe();
        let driver = {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move { provider.run(rx).await })
        };
        tokio::task::yield_now().await;

        nav.push(query_of(&[("fuel_type", "electric"), ("page", "1")]));

        // Give the driver a chance to observe the change and fetch.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let calls = provider.api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].fuel_type.as_deref(), Some("electric"));
        assert_eq!(calls[0].page, 1);
        assert_eq!(provider.result().vehicles[0].listing_id, "e1");

        driver.abort();
    }
}

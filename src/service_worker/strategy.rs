//! Stale-while-revalidate, as the browser script executes it.
//!
//! `StaleWhileRevalidate` makes the same decisions as the generated worker:
//! GET only, tracked URLs only, cached entry first, network refresh always.
//! Entries are keyed by URL alone, which is the `ignoreVary` lookup.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::service_worker::patterns::SwrPatterns;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwRequest {
    pub method: Method,
    pub url: String,
}

impl SwRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl CachedResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// `Response.ok`: any 2xx.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("network error: {0}")]
pub struct FetchError(pub String);

/// The network side of the worker.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    async fn fetch(&self, request: &SwRequest) -> Result<CachedResponse, FetchError>;
}

/// One named cache. Clones share entries.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<DashMap<String, CachedResponse>>,
}

impl CacheStore {
    pub fn lookup(&self, url: &str) -> Option<CachedResponse> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    /// Last writer wins.
    pub fn put(&self, url: &str, response: CachedResponse) {
        self.entries.insert(url.to_string(), response);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// All caches of an origin, by name.
#[derive(Debug, Default)]
pub struct CacheStorage {
    stores: DashMap<String, CacheStore>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (creating if needed) the cache called `name`.
    pub fn open(&self, name: &str) -> CacheStore {
        self.stores.entry(name.to_string()).or_default().value().clone()
    }

    /// Delete every cache except `current`. Returns how many were removed.
    pub fn activate(&self, current: &str) -> usize {
        let before = self.stores.len();
        self.stores.retain(|name, _| name == current);
        before - self.stores.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Result of a refresh started in the background.
pub type Refresh = JoinHandle<Result<CachedResponse, FetchError>>;

#[derive(Debug)]
pub struct Handled {
    pub response: Result<CachedResponse, FetchError>,
    pub source: ResponseSource,
    /// Present when the cached entry was returned; resolves once the
    /// refresh has finished (and the cache was updated if it succeeded).
    pub refresh: Option<Refresh>,
}

#[derive(Debug)]
pub enum Interception {
    /// Not ours: the browser handles the request normally.
    Passthrough,
    Handled(Handled),
}

pub struct StaleWhileRevalidate<F> {
    cache: CacheStore,
    patterns: Arc<SwrPatterns>,
    fetcher: Arc<F>,
}

impl<F: Fetch> StaleWhileRevalidate<F> {
    /// Install and activate a worker for `cache_name`: caches under other
    /// names are dropped, so bumping the name invalidates old entries.
    pub fn install(
        storage: &CacheStorage,
        cache_name: &str,
        patterns: SwrPatterns,
        fetcher: F,
    ) -> Self {
        let removed = storage.activate(cache_name);
        if removed > 0 {
            tracing::debug!(cache = cache_name, removed, "Dropped stale caches");
        }

        Self {
            cache: storage.open(cache_name),
            patterns: Arc::new(patterns),
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn handle(&self, request: &SwRequest) -> Interception {
        if request.method != Method::GET || !self.patterns.matches(&request.url) {
            return Interception::Passthrough;
        }

        let cached = self.cache.lookup(&request.url);
        let network = self.revalidate(request.clone());

        let handled = match cached {
            Some(cached) => Handled {
                response: Ok(cached),
                source: ResponseSource::Cache,
                refresh: Some(network),
            },
            None => Handled {
                response: match network.await {
                    Ok(result) => result,
                    Err(e) => Err(FetchError(e.to_string())),
                },
                source: ResponseSource::Network,
                refresh: None,
            },
        };
        Interception::Handled(handled)
    }

    fn revalidate(&self, request: SwRequest) -> Refresh {
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();

        tokio::spawn(async move {
            let response = fetcher.fetch(&request).await?;
            if response.is_ok() {
                cache.put(&request.url, response.clone());
            }
            Ok::<_, FetchError>(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Origin {
        body: Mutex<Option<(StatusCode, &'static str)>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Fetch for Arc<Origin> {
        async fn fetch(&self, _request: &SwRequest) -> Result<CachedResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match *self.body.lock().unwrap() {
                Some((status, body)) => Ok(CachedResponse::new(status, body)),
                None => Err(FetchError("offline".into())),
            }
        }
    }

    fn worker(origin: &Arc<Origin>) -> StaleWhileRevalidate<Arc<Origin>> {
        let storage = CacheStorage::new();
        let patterns = SwrPatterns::new("/dataset").unwrap();
        StaleWhileRevalidate::install(&storage, "gpx-sad-v1", patterns, Arc::clone(origin))
    }

    fn handled(interception: Interception) -> Handled {
        match interception {
            Interception::Handled(handled) => handled,
            Interception::Passthrough => panic!("expected the worker to handle the request"),
        }
    }

    const URL: &str = "https://painel.example.org/dataset/uc.geojson";

    #[tokio::test]
    async fn test_passthrough() {
        let origin = Arc::new(Origin::default());
        let sw = worker(&origin);

        let post = SwRequest::new(Method::POST, URL);
        assert!(matches!(sw.handle(&post).await, Interception::Passthrough));

        let page = SwRequest::get("https://painel.example.org/index.html");
        assert!(matches!(sw.handle(&page).await, Interception::Passthrough));
        assert_eq!(origin.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_then_fresh() {
        let origin = Arc::new(Origin::default());
        *origin.body.lock().unwrap() = Some((StatusCode::OK, "v1"));
        let sw = worker(&origin);
        let request = SwRequest::get(URL);

        let first = handled(sw.handle(&request).await);
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.response.unwrap().body, "v1");

        *origin.body.lock().unwrap() = Some((StatusCode::OK, "v2"));

        let second = handled(sw.handle(&request).await);
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.unwrap().body, "v1");
        let refreshed = second.refresh.unwrap().await.unwrap().unwrap();
        assert_eq!(refreshed.body, "v2");

        let third = handled(sw.handle(&request).await);
        assert_eq!(third.source, ResponseSource::Cache);
        assert_eq!(third.response.unwrap().body, "v2");
        assert_eq!(origin.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let origin = Arc::new(Origin::default());
        *origin.body.lock().unwrap() = Some((StatusCode::NOT_FOUND, "missing"));
        let sw = worker(&origin);

        let response = handled(sw.handle(&SwRequest::get(URL)).await).response.unwrap();
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert!(sw.cache().is_empty());
    }

    #[tokio::test]
    async fn test_offline() {
        let origin = Arc::new(Origin::default());
        let sw = worker(&origin);

        let miss = handled(sw.handle(&SwRequest::get(URL)).await);
        assert_eq!(miss.response, Err(FetchError("offline".into())));

        sw.cache().put(URL, CachedResponse::new(StatusCode::OK, "cached"));
        let hit = handled(sw.handle(&SwRequest::get(URL)).await);
        assert_eq!(hit.response.unwrap().body, "cached");
        assert!(hit.refresh.unwrap().await.unwrap().is_err());
        assert_eq!(sw.cache().lookup(URL).unwrap().body, "cached");
    }

    #[test]
    fn test_new_cache_name_drops_old_entries() {
        let storage = CacheStorage::new();
        storage
            .open("gpx-sad-v1")
            .put(URL, CachedResponse::new(StatusCode::OK, "old"));
        storage.open("unrelated");

        assert_eq!(storage.activate("gpx-sad-v2"), 2);
        assert!(storage.open("gpx-sad-v1").is_empty());
        assert!(storage.open("gpx-sad-v2").lookup(URL).is_none());
    }
}

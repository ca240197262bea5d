use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::{
    cache::ForecastStore,
    forecast::{types::ForecastReport, FetchError, ForecastSource},
};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to encode weather data")]
    Encode(#[source] serde_json::Error),
}

impl GatewayError {
    pub fn class(&self) -> &'static str {
        match self {
            GatewayError::Fetch(e) => e.class(),
            GatewayError::Encode(_) => "response-encoding",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{}: {}", self.class(), self),
        )
            .into_response()
    }
}

/// A forecast as served to a caller.
#[derive(Debug)]
pub enum Forecast {
    /// Serialized report exactly as it was stored.
    Cached(String),
    Fresh(ForecastReport),
}

impl IntoResponse for Forecast {
    fn into_response(self) -> Response {
        match self {
            Forecast::Cached(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                body,
            )
                .into_response(),
            Forecast::Fresh(report) => (StatusCode::OK, Json(report)).into_response(),
        }
    }
}

pub struct ForecastGateway {
    source: Arc<dyn ForecastSource>,
    store: Arc<dyn ForecastStore>,
    ttl: Duration,
    default_location: String,
}

impl ForecastGateway {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        store: Arc<dyn ForecastStore>,
        ttl: Duration,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            source,
            store,
            ttl,
            default_location: default_location.into(),
        }
    }

    /// Cache-aside lookup keyed by the location exactly as supplied.
    ///
    /// A cache read error counts as a miss and a failed write is only logged,
    /// so the store can never fail a request on its own.
    pub async fn lookup_or_fetch(&self, location: &str) -> Result<Forecast, GatewayError> {
        match self.store.get(location).await {
            Ok(Some(cached)) => {
                tracing::debug!("Cache hit for '{}'", location);
                return Ok(Forecast::Cached(cached));
            }
            Ok(None) => tracing::debug!("Cache miss for '{}'", location),
            Err(e) => tracing::warn!("Cache read failed for '{}', fetching instead: {}", location, e),
        }

        let report = self.fetch(location).await?;
        let serialized = serde_json::to_string(&report).map_err(|e| {
            tracing::error!("Failed to encode forecast for '{}': {}", location, e);
            GatewayError::Encode(e)
        })?;

        if let Err(e) = self.store.set_with_expiry(location, &serialized, self.ttl).await {
            tracing::warn!("Cache write failed for '{}': {}", location, e);
        }

        Ok(Forecast::Fresh(report))
    }

    /// Fetches the default location. Never reads or writes the cache.
    pub async fn fetch_default(&self) -> Result<ForecastReport, GatewayError> {
        self.fetch(&self.default_location).await
    }

    async fn fetch(&self, location: &str) -> Result<ForecastReport, GatewayError> {
        self.source.fetch(location).await.map_err(|e| {
            tracing::error!(error = ?e, "Forecast fetch for '{}' failed ({})", location, e.class());
            GatewayError::Fetch(e)
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::cache::{CacheError, MemoryStore};
    use crate::forecast::types::ForecastDay;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn sample_report(address: &str) -> ForecastReport {
        ForecastReport {
            address: address.to_string(),
            request_date: chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            days: vec![ForecastDay {
                description: "Clear".to_string(),
                temperature: 20.5,
                temperature_max: 25.0,
                temperature_min: 15.0,
                datetime: "2024-06-01".to_string(),
                feels_like: 19.0,
            }],
        }
    }

    /// Upstream stand-in that counts calls per location.
    #[derive(Default)]
    pub(crate) struct CountingSource {
        pub calls: AtomicUsize,
        pub fail: bool,
        pub locations: std::sync::Mutex<Vec<String>>,
    }

    impl CountingSource {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch(&self, location: &str) -> Result<ForecastReport, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.locations.lock().unwrap().push(location.to_string());
            if self.fail {
                let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
                return Err(FetchError::ShapeMismatch(err));
            }
            Ok(sample_report(location))
        }
    }

    /// Store whose every operation fails.
    pub(crate) struct BrokenStore;

    fn broken() -> CacheError {
        CacheError::Redis(redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")))
    }

    #[async_trait]
    impl ForecastStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(broken())
        }

        async fn set_with_expiry(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(broken())
        }

        async fn ttl(&self, _key: &str) -> Result<Option<Duration>, CacheError> {
            Err(broken())
        }
    }

    fn gateway(source: Arc<CountingSource>, store: Arc<dyn ForecastStore>) -> ForecastGateway {
        ForecastGateway::new(source, store, Duration::from_secs(3600), "Cluj")
    }

    #[tokio::test]
    async fn test_miss_fetches_once_and_writes_entry() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(MemoryStore::new(10));
        let gateway = gateway(source.clone(), store.clone());

        let forecast = gateway.lookup_or_fetch("Paris").await.unwrap();

        assert!(matches!(forecast, Forecast::Fresh(ref r) if r.address == "Paris"));
        assert_eq!(source.calls(), 1);
        let remaining = store.ttl("Paris").await.unwrap().unwrap();
        assert!(remaining > Duration::ZERO && remaining <= Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_hits_return_identical_bodies_without_fetching() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(MemoryStore::new(10));
        let gateway = gateway(source.clone(), store.clone());

        gateway.lookup_or_fetch("Paris").await.unwrap();
        let stored = store.get("Paris").await.unwrap().unwrap();

        for _ in 0..3 {
            match gateway.lookup_or_fetch("Paris").await.unwrap() {
                Forecast::Cached(body) => assert_eq!(body, stored),
                Forecast::Fresh(_) => panic!("expected a cache hit"),
            }
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_value_is_returned_verbatim() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(MemoryStore::new(10));
        store
            .set_with_expiry("Paris", "{\"address\":\"stale\"}", Duration::from_secs(60))
            .await
            .unwrap();
        let gateway = gateway(source.clone(), store);

        let forecast = gateway.lookup_or_fetch("Paris").await.unwrap();

        assert!(matches!(forecast, Forecast::Cached(ref body) if body == "{\"address\":\"stale\"}"));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_keys_are_not_normalized() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(MemoryStore::new(10));
        let gateway = gateway(source.clone(), store);

        gateway.lookup_or_fetch("paris").await.unwrap();
        gateway.lookup_or_fetch("Paris ").await.unwrap();
        gateway.lookup_or_fetch("paris").await.unwrap();

        assert_eq!(source.calls(), 2);
        assert_eq!(*source.locations.lock().unwrap(), vec!["paris", "Paris "]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_cached() {
        let source = Arc::new(CountingSource::failing());
        let store = Arc::new(MemoryStore::new(10));
        let gateway = gateway(source.clone(), store.clone());

        let err = gateway.lookup_or_fetch("Paris").await.unwrap_err();

        assert_eq!(err.class(), "response-shape-mismatch");
        assert_eq!(store.get("Paris").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_broken_store_still_serves_fresh_data() {
        let source = Arc::new(CountingSource::default());
        let gateway = gateway(source.clone(), Arc::new(BrokenStore));

        let first = gateway.lookup_or_fetch("Paris").await.unwrap();
        let second = gateway.lookup_or_fetch("Paris").await.unwrap();

        assert!(matches!(first, Forecast::Fresh(_)));
        assert!(matches!(second, Forecast::Fresh(_)));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_fetch_default_bypasses_cache() {
        let source = Arc::new(CountingSource::default());
        let store = Arc::new(MemoryStore::new(10));
        let gateway = gateway(source.clone(), store.clone());

        gateway.fetch_default().await.unwrap();
        let report = gateway.fetch_default().await.unwrap();

        assert_eq!(report.address, "Cluj");
        assert_eq!(source.calls(), 2);
        assert_eq!(store.get("Cluj").await.unwrap(), None);
    }

    #[test]
    fn test_error_response_is_plain_text_500() {
        let err = serde_json::from_str::<serde_json::Value>("nope").unwrap_err();
        let response = GatewayError::Fetch(FetchError::ResponseUnparseable(err)).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }
}

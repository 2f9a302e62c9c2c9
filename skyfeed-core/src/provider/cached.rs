use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::{Location, TemperatureUnit, WeatherError, WeatherRecord};

use super::WeatherProvider;

/// Cache lifespan used when none is configured.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// The raw, uncached fetch behind a [`CachedProvider`].
#[async_trait]
pub trait RefreshSource: Send + Sync + Debug {
    fn location(&self) -> &Location;

    fn temperature_unit(&self) -> TemperatureUnit;

    /// Perform exactly one upstream query and return fully parsed records,
    /// ordered like [`WeatherProvider::get_weather`].
    async fn refresh(&self) -> Result<Vec<WeatherRecord>, WeatherError>;
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Instant,
    records: Vec<WeatherRecord>,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Serves the records of its source for `ttl` before asking for new ones.
///
/// The entry is only replaced after a successful refresh, so a failed fetch
/// neither extends the lifespan of old data nor delays the next attempt.
/// The lock is held for the duration of a refresh: callers arriving while
/// one is in flight wait for it instead of issuing their own.
#[derive(Debug)]
pub struct CachedProvider<S> {
    source: S,
    ttl: Duration,
    state: Mutex<Option<CacheEntry>>,
}

impl<S: RefreshSource> CachedProvider<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Mutex::new(None),
        }
    }

    pub fn with_default_ttl(source: S) -> Self {
        Self::new(source, DEFAULT_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether the next `get_weather` would be answered from the cache.
    ///
    /// Reports `false` while a refresh is in flight.
    pub fn is_fresh(&self) -> bool {
        match self.state.try_lock() {
            Ok(state) => state
                .as_ref()
                .is_some_and(|entry| entry.is_fresh(self.ttl)),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl<S: RefreshSource> WeatherProvider for CachedProvider<S> {
    fn location(&self) -> &Location {
        self.source.location()
    }

    fn temperature_unit(&self) -> TemperatureUnit {
        self.source.temperature_unit()
    }

    async fn get_weather(&self) -> Result<Vec<WeatherRecord>, WeatherError> {
        let mut state = self.state.lock().await;

        if let Some(entry) = state.as_ref().filter(|entry| entry.is_fresh(self.ttl)) {
            tracing::debug!(location = %self.location(), "Serving cached weather");
            return Ok(entry.records.clone());
        }

        let attempted_at = Instant::now();
        match self.source.refresh().await {
            Ok(records) => {
                tracing::info!(
                    location = %self.location(),
                    records = records.len(),
                    "Refreshed weather from upstream"
                );
                *state = Some(CacheEntry {
                    fetched_at: attempted_at,
                    records: records.clone(),
                });
                Ok(records)
            }
            Err(err) => {
                tracing::warn!(location = %self.location(), "Weather refresh failed: {err}");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Day, WeatherEffectiveness};
    use chrono::Local;
    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    struct CountingSource {
        location: Location,
        calls: Arc<AtomicUsize>,
        failing: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RefreshSource for CountingSource {
        fn location(&self) -> &Location {
            &self.location
        }

        fn temperature_unit(&self) -> TemperatureUnit {
            TemperatureUnit::Celsius
        }

        async fn refresh(&self) -> Result<Vec<WeatherRecord>, WeatherError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(WeatherError::UpstreamUnavailable {
                    status: "503 Service Unavailable".to_string(),
                    body: String::new(),
                });
            }

            let record = WeatherRecord::new(
                Local::now().fixed_offset(),
                WeatherEffectiveness::Current,
                Day::Clear,
                20.0 + call as f64,
                0.4,
                1013.0,
                4,
            )?;
            Ok(vec![record])
        }
    }

    type Harness = (CachedProvider<CountingSource>, Arc<AtomicUsize>, Arc<AtomicBool>);

    fn counting_source() -> (CountingSource, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let source = CountingSource {
            location: Location::named(0.0, 0.0, "Nowhere"),
            calls: Arc::default(),
            failing: Arc::default(),
        };
        let calls = Arc::clone(&source.calls);
        let failing = Arc::clone(&source.failing);
        (source, calls, failing)
    }

    fn provider(ttl: Duration) -> Harness {
        let (source, calls, failing) = counting_source();
        (CachedProvider::new(source, ttl), calls, failing)
    }

    #[tokio::test(start_paused = true)]
    async fn calls_within_ttl_hit_upstream_once() {
        let (provider, calls, _) = provider(Duration::from_secs(60));

        let first = provider.get_weather().await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        let second = provider.get_weather().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(provider.is_fresh());
    }

    #[tokio::test(start_paused = true)]
    async fn call_after_ttl_refreshes_exactly_once() {
        let (provider, calls, _) = provider(Duration::from_secs(60));

        let first = provider.get_weather().await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(!provider.is_fresh());

        let second = provider.get_weather().await.unwrap();
        let third = provider.get_weather().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_ne!(first[0].temperature(), second[0].temperature());
        assert_eq!(second, third);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_leaves_cache_untouched() {
        let (provider, calls, failing) = provider(Duration::from_secs(60));

        provider.get_weather().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        failing.store(true, Ordering::SeqCst);
        let err = provider.get_weather().await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamUnavailable { .. }));

        // The failed attempt must not count as a fetch: the very next call retries.
        failing.store(false, Ordering::SeqCst);
        let records = provider.get_weather().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(records[0].temperature(), 22.0);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_on_empty_cache_is_retried() {
        let (source, calls, failing) = counting_source();
        let provider = CachedProvider::with_default_ttl(source);

        failing.store(true, Ordering::SeqCst);
        assert!(provider.get_weather().await.is_err());
        assert!(provider.get_weather().await.is_err());
        assert!(!provider.is_fresh());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh() {
        let (provider, calls, _) = provider(DEFAULT_TTL);
        let provider = Arc::new(provider);

        let a = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.get_weather().await }
        });
        let b = tokio::spawn({
            let provider = Arc::clone(&provider);
            async move { provider.get_weather().await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delegates_location_and_unit_to_source() {
        let (source, _, _) = counting_source();
        let provider = CachedProvider::with_default_ttl(source);

        assert_eq!(provider.location().friendly_name.as_deref(), Some("Nowhere"));
        assert_eq!(provider.temperature_unit(), TemperatureUnit::Celsius);
        assert_eq!(provider.ttl(), DEFAULT_TTL);
        assert_eq!(provider.source().location(), provider.location());
    }

    #[tokio::test(start_paused = true)]
    async fn default_ttl_keeps_records_for_an_hour() {
        let (source, calls, _) = counting_source();
        let provider = CachedProvider::with_default_ttl(source);

        provider.get_weather().await.unwrap();
        tokio::time::advance(DEFAULT_TTL - Duration::from_secs(1)).await;
        provider.get_weather().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        provider.get_weather().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

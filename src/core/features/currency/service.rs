use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;

use crate::shared::error::{AppError, AppResult};

use super::fetcher::RateFetcher;
use super::store::SnapshotStore;
use super::types::{RateSnapshot, StoredSnapshot};

/// Snapshots younger than this are served without touching the network
pub const DEFAULT_FRESHNESS_HOURS: i64 = 12;

/// Wall-clock source, injectable for tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Read-through cache of one exchange-rate snapshot.
///
/// Freshness is a preference: when a refresh fails, whatever snapshot is cached is
/// served regardless of age. Only one refresh runs at a time; callers that queued
/// behind it reuse the snapshot it stored.
pub struct RateCache {
    fetcher: Arc<dyn RateFetcher>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    freshness: Duration,
    slot: RwLock<Option<RateSnapshot>>,
    refresh_gate: AsyncMutex<()>,
}

impl RateCache {
    pub fn new(
        fetcher: Arc<dyn RateFetcher>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        freshness: Duration,
    ) -> Self {
        let cache = Self {
            fetcher,
            store,
            clock,
            freshness,
            slot: RwLock::new(None),
            refresh_gate: AsyncMutex::new(()),
        };
        cache.seed_from_store();
        cache
    }

    /// Current snapshot if it is still fresh, otherwise refresh with stale fallback
    pub async fn get_rates(&self, base: &str) -> AppResult<RateSnapshot> {
        if let Some(snapshot) = self.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;

        // Another caller may have refreshed while we waited
        if let Some(snapshot) = self.fresh_snapshot() {
            tracing::debug!(base = %snapshot.base, "reusing snapshot from concurrent refresh");
            return Ok(snapshot);
        }

        match self.fetch_and_store(base).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => match self.cached() {
                Some(stale) => {
                    tracing::warn!(
                        error = %e,
                        base = %stale.base,
                        age_minutes = stale.age(self.clock.now()).num_minutes(),
                        "rate refresh failed; serving cached snapshot"
                    );
                    Ok(stale)
                }
                None => {
                    tracing::warn!(error = %e, "rate refresh failed and no snapshot is cached");
                    Err(AppError::UnavailableRates(e.to_string()))
                }
            },
        }
    }

    /// Fetch unconditionally, ignoring freshness. No fallback.
    pub async fn refresh(&self, base: &str) -> AppResult<RateSnapshot> {
        let _gate = self.refresh_gate.lock().await;
        self.fetch_and_store(base).await
    }

    /// Refresh in the background when the cached snapshot is missing or stale
    pub fn spawn_refresh_if_stale(self: &Arc<Self>, base: &str) -> Option<tokio::task::JoinHandle<()>> {
        if self.fresh_snapshot().is_some() {
            return None;
        }

        tracing::info!(base, "rates missing or stale; scheduling background refresh");
        let cache = Arc::clone(self);
        let base = base.to_string();
        Some(tokio::spawn(async move {
            match cache.get_rates(&base).await {
                Ok(snapshot) => tracing::info!(base = %snapshot.base, "background rate refresh finished"),
                Err(e) => tracing::warn!(error = %e, "background rate refresh failed"),
            }
        }))
    }

    /// Whatever is in the slot, regardless of age
    pub fn cached(&self) -> Option<RateSnapshot> {
        match self.slot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Younger than the threshold. A snapshot dated in the future is stale.
    pub fn is_fresh(&self, snapshot: &RateSnapshot) -> bool {
        let age = snapshot.age(self.clock.now());
        age >= Duration::zero() && age < self.freshness
    }

    fn fresh_snapshot(&self) -> Option<RateSnapshot> {
        self.cached().filter(|snapshot| self.is_fresh(snapshot))
    }

    async fn fetch_and_store(&self, base: &str) -> AppResult<RateSnapshot> {
        let payload = self.fetcher.fetch(base).await?;
        let snapshot = RateSnapshot {
            base: payload.base,
            rates: payload.rates,
            fetched_at: self.clock.now(),
        };

        if let Err(e) = self.store.save(&StoredSnapshot::new(snapshot.clone())) {
            tracing::warn!(error = %e, "failed to persist rate snapshot");
        }
        self.replace_slot(snapshot.clone());

        tracing::info!(base = %snapshot.base, rates = snapshot.rates.len(), "exchange rates refreshed");
        Ok(snapshot)
    }

    fn replace_slot(&self, snapshot: RateSnapshot) {
        match self.slot.write() {
            Ok(mut guard) => *guard = Some(snapshot),
            Err(poisoned) => *poisoned.into_inner() = Some(snapshot),
        }
    }

    fn seed_from_store(&self) {
        match self.store.load() {
            Ok(Some(stored)) => {
                tracing::info!(
                    base = %stored.data.base,
                    rates = stored.data.rates.len(),
                    "seeded rate cache from disk"
                );
                self.replace_slot(stored.data);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not read persisted rate snapshot"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::core::features::currency::store::MemorySnapshotStore;
    use std::collections::HashMap;

    fn cache_with(
        fetcher: Arc<StubFetcher>,
        store: Arc<MemorySnapshotStore>,
        clock: Arc<ManualClock>,
    ) -> RateCache {
        RateCache::new(fetcher, store, clock, Duration::hours(DEFAULT_FRESHNESS_HOURS))
    }

    #[tokio::test]
    async fn test_fresh_snapshot_skips_network() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_with(fetcher.clone(), Arc::default(), clock.clone());

        cache.get_rates("USD").await.unwrap();
        assert_eq!(fetcher.calls(), 1);

        for _ in 0..5 {
            clock.advance(Duration::hours(2));
            cache.get_rates("USD").await.unwrap();
        }
        // 10h elapsed, still inside the 12h window
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_seeded_fresh_snapshot_needs_no_fetch() {
        let store = Arc::new(MemorySnapshotStore::default());
        store
            .save(&StoredSnapshot::new(RateSnapshot {
                base: "USD".into(),
                rates: HashMap::from([("EUR".to_string(), 0.9)]),
                fetched_at: start(),
            }))
            .unwrap();
        let fetcher = Arc::new(StubFetcher::offline());
        let clock = Arc::new(ManualClock::new(start() + Duration::hours(1)));
        let cache = cache_with(fetcher.clone(), store, clock);

        let snapshot = cache.get_rates("USD").await.unwrap();
        assert_eq!(snapshot.rates["EUR"], 0.9);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_refreshed_and_persisted() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let store = Arc::new(MemorySnapshotStore::default());
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_with(fetcher.clone(), store.clone(), clock.clone());

        cache.get_rates("USD").await.unwrap();
        clock.advance(Duration::hours(13));
        let snapshot = cache.get_rates("USD").await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(snapshot.fetched_at, start() + Duration::hours(13));
        assert_eq!(store.load().unwrap().unwrap().data, snapshot);
    }

    #[tokio::test]
    async fn test_stale_snapshot_served_when_offline() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_with(fetcher.clone(), Arc::default(), clock.clone());

        cache.get_rates("USD").await.unwrap();
        fetcher.set_online(false);
        clock.advance(Duration::days(30));

        let snapshot = cache.get_rates("USD").await.unwrap();
        assert_eq!(snapshot.fetched_at, start());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_without_any_snapshot() {
        let fetcher = Arc::new(StubFetcher::offline());
        let cache = cache_with(fetcher, Arc::default(), Arc::new(ManualClock::new(start())));

        assert!(matches!(
            cache.get_rates("USD").await,
            Err(AppError::UnavailableRates(_))
        ));
        assert!(cache.cached().is_none());
    }

    #[tokio::test]
    async fn test_new_snapshot_replaces_other_base() {
        let fetcher = Arc::new(StubFetcher::new(&[("USD", 1.1)]));
        let clock = Arc::new(ManualClock::new(start()));
        let cache = cache_with(fetcher.clone(), Arc::default(), clock.clone());

        cache.get_rates("USD").await.unwrap();
        clock.advance(Duration::hours(12));
        let snapshot = cache.get_rates("EUR").await.unwrap();

        assert_eq!(snapshot.base, "EUR");
        assert_eq!(cache.cached().unwrap().base, "EUR");
    }

    /// Store whose reads and writes always fail
    struct FailingStore;

    impl SnapshotStore for FailingStore {
        fn load(&self) -> AppResult<Option<StoredSnapshot>> {
            Err(AppError::Storage("Corrupt rate snapshot".into()))
        }

        fn save(&self, _snapshot: &StoredSnapshot) -> AppResult<()> {
            Err(AppError::Storage("disk full".into()))
        }
    }

    #[tokio::test]
    async fn test_persist_failure_does_not_fail_lookup() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let cache = RateCache::new(
            fetcher.clone(),
            Arc::new(FailingStore),
            Arc::new(ManualClock::new(start())),
            Duration::hours(DEFAULT_FRESHNESS_HOURS),
        );

        let snapshot = cache.get_rates("USD").await.unwrap();
        assert_eq!(snapshot.rates["EUR"], 0.9);
        assert_eq!(cache.cached(), Some(snapshot));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_store_starts_empty() {
        let fetcher = Arc::new(StubFetcher::offline());
        let cache = RateCache::new(
            fetcher,
            Arc::new(FailingStore),
            Arc::new(ManualClock::new(start())),
            Duration::hours(DEFAULT_FRESHNESS_HOURS),
        );

        assert!(cache.cached().is_none());
        assert!(matches!(
            cache.get_rates("USD").await,
            Err(AppError::UnavailableRates(_))
        ));
    }

    #[tokio::test]
    async fn test_future_dated_snapshot_is_stale() {
        let store = Arc::new(MemorySnapshotStore::default());
        store
            .save(&StoredSnapshot::new(RateSnapshot {
                base: "USD".into(),
                rates: HashMap::from([("EUR".to_string(), 0.8)]),
                fetched_at: start() + Duration::days(2),
            }))
            .unwrap();
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let cache = cache_with(fetcher.clone(), store, Arc::new(ManualClock::new(start())));

        assert!(!cache.is_fresh(&cache.cached().unwrap()));
        let snapshot = cache.get_rates("USD").await.unwrap();
        assert_eq!(snapshot.rates["EUR"], 0.9);
        assert_eq!(snapshot.fetched_at, start());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_fetch_once() {
        let fetcher = Arc::new(
            StubFetcher::new(&[("EUR", 0.9)]).with_delay(std::time::Duration::from_millis(20)),
        );
        let cache = cache_with(fetcher.clone(), Arc::default(), Arc::new(ManualClock::new(start())));

        let (a, b, c) = tokio::join!(
            cache.get_rates("USD"),
            cache.get_rates("USD"),
            cache.get_rates("USD")
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_refresh_ignores_freshness_and_has_no_fallback() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let cache = cache_with(fetcher.clone(), Arc::default(), Arc::new(ManualClock::new(start())));

        cache.get_rates("USD").await.unwrap();
        cache.refresh("USD").await.unwrap();
        assert_eq!(fetcher.calls(), 2);

        fetcher.set_online(false);
        assert!(matches!(cache.refresh("USD").await, Err(AppError::Network(_))));
        assert!(cache.cached().is_some());
    }

    #[tokio::test]
    async fn test_spawn_refresh_if_stale() {
        let fetcher = Arc::new(StubFetcher::new(&[("EUR", 0.9)]));
        let cache = Arc::new(cache_with(
            fetcher.clone(),
            Arc::default(),
            Arc::new(ManualClock::new(start())),
        ));

        let handle = cache.spawn_refresh_if_stale("USD").expect("refresh should be scheduled");
        handle.await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(cache.spawn_refresh_if_stale("USD").is_none());
    }
}

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::store::KeyValueStore;

/// Stored form of a cached dataset: the payload plus write-time metadata.
///
/// The wire shape is a JSON object with the fields `data`, `timestamp`
/// (epoch milliseconds) and, for user-scoped datasets, `scopeKey`. Anything
/// under the cache's key that does not parse into this shape is treated as
/// absent on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    /// Owner identifier for per-user datasets. An entry written with a
    /// scope is only readable back under the same scope.
    #[serde(rename = "scopeKey", skip_serializing_if = "Option::is_none", default)]
    pub scope_key: Option<String>,
}

impl<T> CacheEntry<T> {
    pub fn new(data: T, scope_key: Option<String>) -> Self {
        Self {
            data,
            timestamp: Utc::now().timestamp_millis(),
            scope_key,
        }
    }

    /// Age of the entry relative to now. A timestamp in the future (clock
    /// skew) reads as zero age.
    pub fn age(&self) -> Duration {
        let elapsed_ms = Utc::now().timestamp_millis() - self.timestamp;
        Duration::from_millis(elapsed_ms.max(0) as u64)
    }

    /// An entry is fresh while its age is strictly below the TTL.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    /// The stored scope must equal the supplied one, both-absent included.
    fn scope_matches(&self, scope: Option<&str>) -> bool {
        self.scope_key.as_deref() == scope
    }

    /// Human-readable age for status output ("just now", "5m ago", ...).
    pub fn age_display(&self) -> String {
        let minutes = self.age().as_secs() / 60;
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Borrowed form used on the write path so `set` can serialize without
/// taking ownership of the payload.
#[derive(Serialize)]
struct CacheEntryRef<'a, T> {
    data: &'a T,
    timestamp: i64,
    #[serde(rename = "scopeKey", skip_serializing_if = "Option::is_none")]
    scope_key: Option<&'a str>,
}

/// Read-through cache for one fetch-based dataset, bound to a single
/// storage key and time-to-live.
///
/// `get` serves unexpired entries; `get_stale_or_null` ignores freshness so
/// a failed live fetch can still show the last-known data. Every operation
/// degrades rather than fails: storage and parse errors read as misses and
/// writes become no-ops, so a misbehaving store never interrupts a data
/// loader's primary flow.
pub struct SwrCache<T> {
    store: Arc<dyn KeyValueStore>,
    key: String,
    ttl: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SwrCache<T>
where
    T: Serialize + DeserializeOwned,
{
    /// `key` must be non-empty and unique per logical dataset
    /// (e.g. "fit-groups", "training-days-cache"); `ttl` must be positive.
    /// Datasets with different volatility get different TTLs.
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>, ttl: Duration) -> Self {
        let key = key.into();
        debug_assert!(!key.is_empty(), "cache key must be non-empty");
        debug_assert!(!ttl.is_zero(), "cache ttl must be positive");
        Self {
            store,
            key,
            ttl,
            _marker: PhantomData,
        }
    }

    /// The storage key this cache is bound to.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fresh read: `None` when the entry is absent, unreadable, expired, or
    /// written under a different scope.
    pub fn get(&self, scope: Option<&str>) -> Option<T> {
        let entry = self.read_entry()?;
        if !entry.scope_matches(scope) {
            debug!(key = %self.key, "Cache entry scope mismatch");
            return None;
        }
        if entry.is_expired(self.ttl) {
            debug!(key = %self.key, age = %entry.age_display(), "Cache entry expired");
            return None;
        }
        Some(entry.data)
    }

    /// Fallback read for failed fetches: skips the freshness check but not
    /// the scope check. Returns the last-known value regardless of age.
    pub fn get_stale_or_null(&self, scope: Option<&str>) -> Option<T> {
        let entry = self.read_entry()?;
        if !entry.scope_matches(scope) {
            debug!(key = %self.key, "Cache entry scope mismatch");
            return None;
        }
        Some(entry.data)
    }

    /// Overwrite the entry wholesale with a fresh timestamp. Best-effort:
    /// serialization and storage failures are logged and swallowed.
    pub fn set(&self, data: &T, scope: Option<&str>) {
        let entry = CacheEntryRef {
            data,
            timestamp: Utc::now().timestamp_millis(),
            scope_key: scope,
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set_item(&self.key, &raw) {
            debug!(key = %self.key, error = %e, "Cache write failed");
        }
    }

    /// Remove the entry unconditionally. A no-op when nothing is stored.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove_item(&self.key) {
            debug!(key = %self.key, error = %e, "Cache clear failed");
        }
    }

    /// Age display of whatever is stored, fresh or not, for status output.
    pub fn age_display(&self, scope: Option<&str>) -> Option<String> {
        let entry = self.read_entry()?;
        if !entry.scope_matches(scope) {
            return None;
        }
        Some(entry.age_display())
    }

    fn read_entry(&self) -> Option<CacheEntry<T>> {
        let raw = match self.store.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!(key = %self.key, error = %e, "Cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(key = %self.key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    use anyhow::bail;
    use serde::{Deserialize, Serialize};

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestExercise {
        id: i64,
        name: String,
    }

    fn squat() -> Vec<TestExercise> {
        vec![TestExercise {
            id: 1,
            name: "Squat".to_string(),
        }]
    }

    fn memory_cache<T: Serialize + serde::de::DeserializeOwned>(
        key: &str,
        ttl: Duration,
    ) -> (Arc<MemoryStore>, SwrCache<T>) {
        let store = Arc::new(MemoryStore::new());
        let cache = SwrCache::new(store.clone() as Arc<dyn KeyValueStore>, key, ttl);
        (store, cache)
    }

    /// Rewrite the stored entry with a backdated timestamp, keeping the
    /// payload and scope intact.
    fn backdate(store: &MemoryStore, key: &str, by_ms: i64) {
        let raw = store.get_item(key).unwrap().expect("entry must exist");
        let mut entry: CacheEntry<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        entry.timestamp -= by_ms;
        store
            .set_item(key, &serde_json::to_string(&entry).unwrap())
            .unwrap();
    }

    #[test]
    fn test_round_trip_unscoped() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), None);
        assert_eq!(cache.get(None), Some(squat()));
    }

    #[test]
    fn test_round_trip_scoped() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), Some("alice"));
        assert_eq!(cache.get(Some("alice")), Some(squat()));
    }

    #[test]
    fn test_get_missing_entry() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), None);
    }

    #[test]
    fn test_expiry() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), None);

        // 30s old: still fresh with a 60s TTL
        backdate(&store, "fit-groups", 30 * 1000);
        assert_eq!(cache.get(None), Some(squat()));

        // 61s old: expired
        backdate(&store, "fit-groups", 31 * 1000);
        assert_eq!(cache.get(None), None);
    }

    #[test]
    fn test_scope_isolation() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), Some("user1"));

        assert_eq!(cache.get(Some("user2")), None);
        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get(Some("user1")), Some(squat()));
    }

    #[test]
    fn test_unscoped_entry_misses_scoped_read() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), None);
        assert_eq!(cache.get(Some("user1")), None);
        assert_eq!(cache.get_stale_or_null(Some("user1")), None);
    }

    #[test]
    fn test_stale_fallback_after_expiry() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), None);
        backdate(&store, "fit-groups", 10 * 60 * 1000);

        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), Some(squat()));
    }

    #[test]
    fn test_stale_fallback_respects_scope() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), Some("user1"));
        backdate(&store, "fit-groups", 10 * 60 * 1000);

        assert_eq!(cache.get_stale_or_null(Some("user2")), None);
        assert_eq!(cache.get_stale_or_null(None), None);
        assert_eq!(cache.get_stale_or_null(Some("user1")), Some(squat()));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        store.set_item("fit-groups", "definitely not json {{{").unwrap();

        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), None);
    }

    #[test]
    fn test_wrong_shape_entry_is_a_miss() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        store
            .set_item("fit-groups", r#"{"payload": [], "written": 12345}"#)
            .unwrap();

        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), None);
    }

    #[test]
    fn test_set_overwrites_wholesale() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));
        cache.set(&squat(), None);

        let replacement = vec![TestExercise {
            id: 2,
            name: "Lunge".to_string(),
        }];
        cache.set(&replacement, None);
        assert_eq!(cache.get(None), Some(replacement));
    }

    #[test]
    fn test_clear_idempotent() {
        let (_store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));

        // Clearing an empty key is a no-op
        cache.clear();

        cache.set(&squat(), None);
        cache.clear();
        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), None);

        cache.clear();
    }

    #[test]
    fn test_entry_wire_shape() {
        let (store, cache) = memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_secs(60));

        cache.set(&squat(), None);
        let raw = store.get_item("fit-groups").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value.get("data").is_some());
        assert!(value.get("timestamp").unwrap().is_i64());
        // scopeKey is omitted entirely for unscoped entries
        assert!(value.get("scopeKey").is_none());

        cache.set(&squat(), Some("alice"));
        let raw = store.get_item("fit-groups").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.get("scopeKey").unwrap().as_str(), Some("alice"));
    }

    /// Store whose every operation fails, standing in for disabled storage.
    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get_item(&self, _key: &str) -> anyhow::Result<Option<String>> {
            bail!("storage unavailable")
        }
        fn set_item(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            bail!("storage unavailable")
        }
        fn remove_item(&self, _key: &str) -> anyhow::Result<()> {
            bail!("storage unavailable")
        }
    }

    #[test]
    fn test_failing_store_degrades_silently() {
        let cache: SwrCache<Vec<TestExercise>> =
            SwrCache::new(Arc::new(FailingStore), "fit-groups", Duration::from_secs(60));

        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), None);
        cache.set(&squat(), None);
        cache.clear();
    }

    #[test]
    fn test_scenario_exercise_group_cache() {
        // set at t=0, hit at 1h, expired at 25h with stale fallback
        let (store, cache) =
            memory_cache::<Vec<TestExercise>>("fit-groups", Duration::from_millis(DAY_MS as u64));
        cache.set(&squat(), None);

        backdate(&store, "fit-groups", HOUR_MS);
        assert_eq!(cache.get(None), Some(squat()));

        backdate(&store, "fit-groups", DAY_MS);
        assert_eq!(cache.get(None), None);
        assert_eq!(cache.get_stale_or_null(None), Some(squat()));
    }

    #[test]
    fn test_scenario_per_user_training_days() {
        let (_store, cache) =
            memory_cache::<Vec<u8>>("training-days-cache", Duration::from_millis(DAY_MS as u64));
        cache.set(&vec![1, 2], Some("alice"));

        assert_eq!(cache.get(Some("bob")), None);
        assert_eq!(cache.get(Some("alice")), Some(vec![1, 2]));
    }

    #[test]
    fn test_age_display() {
        let fresh = CacheEntry::new(vec![1], None);
        assert_eq!(fresh.age_display(), "just now");

        let mut entry = CacheEntry::new(vec![1], None);
        entry.timestamp -= 5 * 60 * 1000;
        assert_eq!(entry.age_display(), "5m ago");

        entry.timestamp -= 2 * HOUR_MS;
        assert_eq!(entry.age_display(), "2h ago");

        entry.timestamp -= 3 * DAY_MS;
        assert_eq!(entry.age_display(), "3d ago");
    }

    #[test]
    fn test_future_timestamp_reads_as_fresh() {
        // Clock skew: an entry stamped in the future has zero age
        let mut entry = CacheEntry::new(vec![1], None);
        entry.timestamp += HOUR_MS;
        assert!(!entry.is_expired(Duration::from_secs(1)));
        assert_eq!(entry.age_display(), "just now");
    }
}

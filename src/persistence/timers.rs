//! Best-effort load/save of the timer collection

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, warn};

use super::{kv::KeyValueStore, validate::decode_timers};
use crate::{error::PersistenceError, state::Timer};

/// Slot holding the timer collection
pub const TIMERS_KEY: &str = "timers";

/// Persistence adapter for the timer store.
///
/// Never returns an error: failures are logged and the engine carries on in
/// memory. The adapter remembers whether the last write failed so callers can
/// report the degraded mode.
pub struct TimerPersistence {
    store: Arc<dyn KeyValueStore>,
    degraded: AtomicBool,
}

impl TimerPersistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            degraded: AtomicBool::new(false),
        }
    }

    /// Load and validate a collection; `[]` on missing or unreadable data
    pub fn load(&self, key: &str) -> Vec<Timer> {
        match self.store.get(key) {
            Ok(Some(raw)) => decode_timers(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored timers from {}: {}", key, e);
                Vec::new()
            }
        }
    }

    /// Write the full collection through to the store
    pub fn save(&self, key: &str, timers: &[Timer]) {
        match self.try_save(key, timers) {
            Ok(()) => {
                if self.degraded.swap(false, Ordering::Relaxed) {
                    info!("Timer persistence recovered");
                }
            }
            Err(e) => {
                if !self.degraded.swap(true, Ordering::Relaxed) {
                    warn!("Failed to persist timers, continuing in memory: {}", e);
                } else {
                    warn!("Timer persistence still failing: {}", e);
                }
            }
        }
    }

    fn try_save(&self, key: &str, timers: &[Timer]) -> Result<(), PersistenceError> {
        let raw = serde_json::to_string(timers)?;
        self.store.set(key, &raw)
    }

    /// Whether the most recent save failed
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for TimerPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerPersistence")
            .field("degraded", &self.is_degraded())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::state::{Association, Timer};
    use chrono::Utc;

    /// Store whose writes fail while `failing` is set
    #[derive(Default)]
    pub(crate) struct FlakyStore {
        pub inner: MemoryStore,
        pub failing: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
            if self.failing.load(Ordering::Relaxed) {
                return Err(PersistenceError::Unavailable("quota exceeded".into()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), PersistenceError> {
            self.inner.remove(key)
        }
    }

    fn sample(n: u64) -> Vec<Timer> {
        (1..=n)
            .map(|i| {
                Timer::new(
                    i * 10,
                    Association::new(Some(format!("r{i}")), Some(i as u32)),
                    Some(format!("Step {i}")),
                    Utc::now(),
                )
            })
            .collect()
    }

    #[test]
    fn round_trip_preserves_collection() {
        let adapter = TimerPersistence::new(Arc::new(MemoryStore::new()));
        let timers = sample(3);
        adapter.save(TIMERS_KEY, &timers);
        assert_eq!(adapter.load(TIMERS_KEY), timers);
    }

    #[test]
    fn malformed_record_is_dropped_on_reload() {
        let store = Arc::new(MemoryStore::new());
        let timers = sample(2);
        let mut records = serde_json::to_value(&timers).unwrap();
        records
            .as_array_mut()
            .unwrap()
            .insert(1, serde_json::json!({"id": "x", "duration": "abc"}));
        store.set(TIMERS_KEY, &records.to_string()).unwrap();

        let adapter = TimerPersistence::new(store);
        assert_eq!(adapter.load(TIMERS_KEY), timers);
    }

    #[test]
    fn missing_slot_loads_empty() {
        let adapter = TimerPersistence::new(Arc::new(MemoryStore::new()));
        assert!(adapter.load(TIMERS_KEY).is_empty());
    }

    #[test]
    fn failed_save_marks_degraded_until_recovery() {
        let store = Arc::new(FlakyStore::default());
        store.failing.store(true, Ordering::Relaxed);
        let adapter = TimerPersistence::new(store.clone());

        adapter.save(TIMERS_KEY, &sample(1));
        assert!(adapter.is_degraded());
        assert!(adapter.load(TIMERS_KEY).is_empty());

        store.failing.store(false, Ordering::Relaxed);
        adapter.save(TIMERS_KEY, &sample(1));
        assert!(!adapter.is_degraded());
        assert_eq!(adapter.load(TIMERS_KEY).len(), 1);
    }
}

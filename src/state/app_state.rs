//! Main application state management

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use super::{Association, Timer, TimerId, TimerStore};
use crate::{
    alerts::{ActiveAlert, CompletionCoordinator},
    error::EngineError,
    persistence::KeyValueStore,
    utils::{format_uptime, Clock},
};

/// Store and coordinator, always mutated together under one lock
#[derive(Debug)]
struct Engine {
    store: TimerStore,
    coordinator: CompletionCoordinator,
    last_action: Option<(String, DateTime<Utc>)>,
}

/// Counts reported by `/status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub timers: usize,
    pub running: usize,
    pub alerting: Option<TimerId>,
    pub persistence_degraded: bool,
}

/// Shared engine handle.
///
/// Every dispatch locks the engine, applies one store operation, lets the
/// coordinator re-scan, and publishes the new snapshot and alert before the
/// lock is released. No two dispatches interleave.
pub struct AppState {
    engine: Mutex<Engine>,
    clock: Arc<dyn Clock>,
    /// Key-value slots shared with the recipe checklist
    pub slots: Arc<dyn KeyValueStore>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Latest timer collection
    timers_tx: watch::Sender<Vec<Timer>>,
    /// Currently alerting timer
    alert_tx: watch::Sender<Option<ActiveAlert>>,
}

impl AppState {
    pub fn new(
        store: TimerStore,
        coordinator: CompletionCoordinator,
        clock: Arc<dyn Clock>,
        slots: Arc<dyn KeyValueStore>,
        host: String,
        port: u16,
    ) -> Self {
        let (timers_tx, _) = watch::channel(store.snapshot());
        let (alert_tx, _) = watch::channel(None);

        let state = Self {
            engine: Mutex::new(Engine {
                store,
                coordinator,
                last_action: None,
            }),
            clock,
            slots,
            start_time: Instant::now(),
            port,
            host,
            timers_tx,
            alert_tx,
        };
        // Timers restored at zero alert right away
        if let Err(e) = state.dispatch("restore", |_, _| ()) {
            tracing::error!("Failed to scan restored timers: {}", e);
        }
        state
    }

    fn lock(&self) -> Result<MutexGuard<'_, Engine>, EngineError> {
        self.engine
            .lock()
            .map_err(|e| EngineError::LockPoisoned(e.to_string()))
    }

    /// Apply one operation, re-scan for completions and publish
    fn dispatch<F, R>(&self, action: &str, op: F) -> Result<R, EngineError>
    where
        F: FnOnce(&mut Engine, DateTime<Utc>) -> R,
    {
        let mut engine = self.lock()?;
        let now = self.clock.now();
        let result = op(&mut engine, now);

        let Engine {
            store, coordinator, ..
        } = &mut *engine;
        coordinator.observe(store.timers(), now);
        engine.last_action = Some((action.to_string(), now));

        self.timers_tx.send_replace(engine.store.snapshot());
        let alert = engine.coordinator.active().cloned();
        self.alert_tx.send_if_modified(|current| {
            if *current != alert {
                *current = alert;
                true
            } else {
                false
            }
        });
        debug!("Dispatched {}", action);
        Ok(result)
    }

    pub fn create_timer(
        &self,
        duration_secs: f64,
        association: Association,
        label: Option<String>,
    ) -> Result<TimerId, EngineError> {
        self.dispatch("create", |e, now| {
            e.store.create(duration_secs, association, label, now)
        })
    }

    pub fn start_timer(&self, id: &TimerId) -> Result<bool, EngineError> {
        self.dispatch("start", |e, now| e.store.start(id, now))
    }

    pub fn pause_timer(&self, id: &TimerId) -> Result<bool, EngineError> {
        self.dispatch("pause", |e, _| e.store.pause(id))
    }

    pub fn reset_timer(&self, id: &TimerId) -> Result<bool, EngineError> {
        self.dispatch("reset", |e, _| e.store.reset(id))
    }

    pub fn set_remaining(&self, id: &TimerId, seconds: f64) -> Result<bool, EngineError> {
        self.dispatch("set-remaining", |e, now| e.store.set_remaining(id, seconds, now))
    }

    pub fn remove_timer(&self, id: &TimerId) -> Result<Option<Timer>, EngineError> {
        self.dispatch("remove", |e, _| e.store.remove(id))
    }

    /// Advance running timers to the current wall-clock time
    pub fn tick(&self) -> Result<Vec<TimerId>, EngineError> {
        self.dispatch("tick", |e, now| e.store.tick(now))
    }

    pub fn dismiss_alert(&self, id: &TimerId) -> Result<Option<Timer>, EngineError> {
        self.dispatch("dismiss", |e, now| e.coordinator.dismiss(&mut e.store, id, now))
    }

    pub fn snooze_alert(&self, id: &TimerId, extra_secs: Option<u64>) -> Result<bool, EngineError> {
        self.dispatch("snooze", |e, now| {
            e.coordinator.snooze(&mut e.store, id, extra_secs, now)
        })
    }

    /// Get current timer collection
    pub fn get_timers(&self) -> Result<Vec<Timer>, EngineError> {
        Ok(self.lock()?.store.snapshot())
    }

    pub fn get_timer(&self, id: &TimerId) -> Result<Option<Timer>, EngineError> {
        Ok(self.lock()?.store.get(id).cloned())
    }

    /// Timer attached to a recipe step, as the inline step control shows it
    pub fn find_for_step(&self, association: &Association) -> Result<Option<Timer>, EngineError> {
        Ok(self.lock()?.store.find_by_association(association).cloned())
    }

    pub fn get_active_alert(&self) -> Result<Option<ActiveAlert>, EngineError> {
        Ok(self.lock()?.coordinator.active().cloned())
    }

    pub fn get_status(&self) -> Result<EngineStatus, EngineError> {
        let engine = self.lock()?;
        let timers = engine.store.timers();
        Ok(EngineStatus {
            timers: timers.len(),
            running: timers.iter().filter(|t| t.running).count(),
            alerting: engine.coordinator.active().map(|a| a.timer_id.clone()),
            persistence_degraded: engine.store.is_persistence_degraded(),
        })
    }

    pub fn subscribe_timers(&self) -> watch::Receiver<Vec<Timer>> {
        self.timers_tx.subscribe()
    }

    pub fn subscribe_alert(&self) -> watch::Receiver<Option<ActiveAlert>> {
        self.alert_tx.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_uptime(self.start_time.elapsed().as_secs())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.lock().ok().and_then(|e| e.last_action.clone()) {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

//! Write-through timer store

use chrono::{DateTime, Utc};
use tracing::info;

use super::{
    timer::{Association, Timer, TimerId},
    timers::TimerCollection,
};
use crate::persistence::TimerPersistence;

/// Owns the timer collection and flushes it to persistence after every change
#[derive(Debug)]
pub struct TimerStore {
    timers: TimerCollection,
    persistence: TimerPersistence,
    key: String,
}

impl TimerStore {
    /// Restore the collection saved under `key`
    pub fn load(persistence: TimerPersistence, key: impl Into<String>) -> Self {
        let key = key.into();
        let timers = TimerCollection::from_timers(persistence.load(&key));
        info!("Loaded {} timers from slot {}", timers.len(), key);
        Self {
            timers,
            persistence,
            key,
        }
    }

    pub fn timers(&self) -> &[Timer] {
        self.timers.as_slice()
    }

    pub fn snapshot(&self) -> Vec<Timer> {
        self.timers.as_slice().to_vec()
    }

    pub fn get(&self, id: &TimerId) -> Option<&Timer> {
        self.timers.get(id)
    }

    pub fn find_by_association(&self, association: &Association) -> Option<&Timer> {
        self.timers.find_by_association(association)
    }

    pub fn has_running(&self) -> bool {
        self.timers.has_running()
    }

    pub fn is_persistence_degraded(&self) -> bool {
        self.persistence.is_degraded()
    }

    pub fn create(
        &mut self,
        duration_secs: f64,
        association: Association,
        label: Option<String>,
        now: DateTime<Utc>,
    ) -> TimerId {
        let id = self.timers.create(duration_secs, association, label, now);
        self.flush();
        id
    }

    pub fn start(&mut self, id: &TimerId, now: DateTime<Utc>) -> bool {
        let changed = self.timers.start(id, now);
        self.flush_if(changed)
    }

    pub fn pause(&mut self, id: &TimerId) -> bool {
        let changed = self.timers.pause(id);
        self.flush_if(changed)
    }

    pub fn reset(&mut self, id: &TimerId) -> bool {
        let changed = self.timers.reset(id);
        self.flush_if(changed)
    }

    pub fn set_remaining(&mut self, id: &TimerId, seconds: f64, now: DateTime<Utc>) -> bool {
        let changed = self.timers.set_remaining(id, seconds, now);
        self.flush_if(changed)
    }

    pub fn remove(&mut self, id: &TimerId) -> Option<Timer> {
        let removed = self.timers.remove(id);
        if removed.is_some() {
            self.flush();
        }
        removed
    }

    /// Advance all running timers; returns ids that finished on this tick
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerId> {
        if !self.timers.has_running() {
            return Vec::new();
        }
        let finished = self.timers.tick(now);
        self.flush();
        finished
    }

    fn flush_if(&self, changed: bool) -> bool {
        if changed {
            self.flush();
        }
        changed
    }

    fn flush(&self) {
        self.persistence.save(&self.key, self.timers.as_slice());
    }
}

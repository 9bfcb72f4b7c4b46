//! Completion coordinator.
//!
//! Watches store snapshots for timers that reached zero and presents them one
//! at a time. Each zero-crossing is acknowledged exactly once; the
//! acknowledgement set lives only in memory and is never persisted.
//!
//! While an alert is presented, other finished timers wait in the collection.
//! Every dismiss or snooze re-scans, so a backlog drains one alert at a time in
//! collection order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

use super::capabilities::{AlertSound, ChecklistSink, Notifier};
use crate::state::{Association, Timer, TimerId, TimerStore};

/// Default snooze extension in seconds
pub const DEFAULT_SNOOZE_SECS: u64 = 60;

/// The timer currently being alerted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub timer_id: TimerId,
    pub label: String,
    pub association: Association,
    pub since: DateTime<Utc>,
}

pub struct CompletionCoordinator {
    acknowledged: HashSet<TimerId>,
    active: Option<ActiveAlert>,
    playing: bool,
    sound: Arc<dyn AlertSound>,
    notifier: Arc<dyn Notifier>,
    checklist: Arc<dyn ChecklistSink>,
    snooze_secs: u64,
}

impl CompletionCoordinator {
    pub fn new(
        sound: Arc<dyn AlertSound>,
        notifier: Arc<dyn Notifier>,
        checklist: Arc<dyn ChecklistSink>,
    ) -> Self {
        Self {
            acknowledged: HashSet::new(),
            active: None,
            playing: false,
            sound,
            notifier,
            checklist,
            snooze_secs: DEFAULT_SNOOZE_SECS,
        }
    }

    pub fn with_snooze_secs(mut self, snooze_secs: u64) -> Self {
        self.snooze_secs = snooze_secs;
        self
    }

    pub fn active(&self) -> Option<&ActiveAlert> {
        self.active.as_ref()
    }

    pub fn is_acknowledged(&self, id: &TimerId) -> bool {
        self.acknowledged.contains(id)
    }

    /// Sound was started and the player has not given up since
    pub fn is_playing(&self) -> bool {
        self.playing && self.sound.is_playing()
    }

    /// Scan a snapshot and present the first unacknowledged finished timer.
    ///
    /// Returns the alert presented by this call, if any.
    pub fn observe(&mut self, timers: &[Timer], now: DateTime<Utc>) -> Option<ActiveAlert> {
        // Acknowledgements only hold while the timer sits at zero
        self.acknowledged
            .retain(|id| timers.iter().any(|t| &t.id == id && t.is_finished()));

        if let Some(active) = &self.active {
            let still_finished = timers
                .iter()
                .any(|t| t.id == active.timer_id && t.is_finished());
            if !still_finished {
                debug!("Withdrawing stale alert for timer {}", active.timer_id);
                self.active = None;
                self.stop_playback();
            } else {
                return None;
            }
        }

        let timer = timers
            .iter()
            .find(|t| t.is_finished() && !self.acknowledged.contains(&t.id))?;
        self.acknowledged.insert(timer.id.clone());
        Some(self.present(timer, now))
    }

    fn present(&mut self, timer: &Timer, now: DateTime<Utc>) -> ActiveAlert {
        info!("Timer {} finished: {}", timer.id, timer.display_label());
        let alert = ActiveAlert {
            timer_id: timer.id.clone(),
            label: timer.display_label().to_string(),
            association: timer.association(),
            since: now,
        };
        self.active = Some(alert.clone());
        self.start_playback();
        if let Err(e) = self.notifier.notify("Timer finished", &alert.label) {
            warn!("Notification unavailable: {}", e);
        }
        alert
    }

    /// Stop the alert, drop the timer and signal its step as complete
    pub fn dismiss(
        &mut self,
        store: &mut TimerStore,
        id: &TimerId,
        now: DateTime<Utc>,
    ) -> Option<Timer> {
        self.release(id);
        let removed = store.remove(id);
        match &removed {
            Some(timer) => {
                info!("Dismissed timer {}", id);
                let association = timer.association();
                if !association.is_empty() {
                    self.checklist.step_completed(id, &association);
                }
            }
            None => debug!("Dismiss for unknown timer {}", id),
        }
        self.observe(store.timers(), now);
        removed
    }

    /// Extend the timer by `extra_secs` (default snooze length if `None`) and re-arm it
    pub fn snooze(
        &mut self,
        store: &mut TimerStore,
        id: &TimerId,
        extra_secs: Option<u64>,
        now: DateTime<Utc>,
    ) -> bool {
        self.release(id);
        let Some(current) = store.get(id).map(|t| t.remaining) else {
            debug!("Snooze for unknown timer {}", id);
            self.observe(store.timers(), now);
            return false;
        };
        let extra = extra_secs.unwrap_or(self.snooze_secs);
        let target = current.saturating_add(extra);
        store.set_remaining(id, target as f64, now);
        store.start(id, now);
        info!("Snoozed timer {} for {}s", id, extra);
        self.observe(store.timers(), now);
        true
    }

    /// Clear the acknowledgement and, if `id` is presented (or nothing is), silence the alert
    fn release(&mut self, id: &TimerId) {
        self.acknowledged.remove(id);
        let is_active = self.active.as_ref().map(|a| &a.timer_id == id);
        if is_active != Some(false) {
            self.active = None;
            self.stop_playback();
        }
    }

    fn start_playback(&mut self) {
        if self.is_playing() {
            return;
        }
        match self.sound.play() {
            Ok(()) => self.playing = true,
            Err(e) => warn!("Alert sound unavailable, alerting silently: {}", e),
        }
    }

    fn stop_playback(&mut self) {
        self.sound.stop();
        self.playing = false;
    }
}

impl std::fmt::Debug for CompletionCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionCoordinator")
            .field("acknowledged", &self.acknowledged)
            .field("active", &self.active)
            .field("playing", &self.playing)
            .field("snooze_secs", &self.snooze_secs)
            .finish()
    }
}

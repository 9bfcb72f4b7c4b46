//! Pure timer transitions.
//!
//! Every reducer takes the wall-clock `now` it needs explicitly and returns
//! whether the collection changed. No I/O happens here.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::timer::{Association, Timer, TimerId};

/// Ordered collection of timers, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerCollection {
    items: Vec<Timer>,
}

impl TimerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from already validated records, keeping the first of any duplicate id
    pub fn from_timers(timers: Vec<Timer>) -> Self {
        let mut items: Vec<Timer> = Vec::with_capacity(timers.len());
        for timer in timers {
            if items.iter().any(|t| t.id == timer.id) {
                debug!("Dropping duplicate timer id {}", timer.id);
                continue;
            }
            items.push(timer);
        }
        Self { items }
    }

    pub fn as_slice(&self) -> &[Timer] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &TimerId) -> Option<&Timer> {
        self.items.iter().find(|t| &t.id == id)
    }

    fn get_mut(&mut self, id: &TimerId) -> Option<&mut Timer> {
        self.items.iter_mut().find(|t| &t.id == id)
    }

    /// First timer attached to the given recipe step.
    ///
    /// Without a recipe id only timers that also lack one match.
    pub fn find_by_association(&self, association: &Association) -> Option<&Timer> {
        self.items.iter().find(|t| match &association.recipe_id {
            None => t.recipe_id.is_none() && t.step_index == association.step_index,
            Some(recipe_id) => {
                t.recipe_id.as_deref() == Some(recipe_id.as_str())
                    && t.step_index == association.step_index
            }
        })
    }

    /// Add an idle timer; negative and fractional durations are floored to whole seconds >= 0
    pub fn create(
        &mut self,
        duration_secs: f64,
        association: Association,
        label: Option<String>,
        now: DateTime<Utc>,
    ) -> TimerId {
        let timer = Timer::new(whole_seconds(duration_secs), association, label, now);
        let id = timer.id.clone();
        debug!("Created timer {} ({}s)", id, timer.duration);
        self.items.push(timer);
        id
    }

    pub fn start(&mut self, id: &TimerId, now: DateTime<Utc>) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };
        if timer.running || timer.remaining == 0 {
            return false;
        }
        timer.running = true;
        timer.ends_at = Some(ends_at(now, timer.remaining));
        debug!("Started timer {} with {}s left", timer.id, timer.remaining);
        true
    }

    /// Stop counting; `remaining` keeps the value computed by the last tick
    pub fn pause(&mut self, id: &TimerId) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };
        if !timer.running {
            return false;
        }
        timer.running = false;
        timer.ends_at = None;
        debug!("Paused timer {} at {}s", timer.id, timer.remaining);
        true
    }

    pub fn reset(&mut self, id: &TimerId) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };
        let before = (timer.remaining, timer.running);
        timer.remaining = timer.duration;
        timer.running = false;
        timer.ends_at = None;
        before != (timer.duration, false)
    }

    /// Overwrite `remaining` with no upper bound; re-arms `ends_at` when running
    pub fn set_remaining(&mut self, id: &TimerId, seconds: f64, now: DateTime<Utc>) -> bool {
        let Some(timer) = self.get_mut(id) else {
            return false;
        };
        timer.remaining = whole_seconds(seconds);
        if timer.running {
            if timer.remaining == 0 {
                timer.running = false;
                timer.ends_at = None;
            } else {
                timer.ends_at = Some(ends_at(now, timer.remaining));
            }
        }
        true
    }

    pub fn remove(&mut self, id: &TimerId) -> Option<Timer> {
        let index = self.items.iter().position(|t| &t.id == id)?;
        Some(self.items.remove(index))
    }

    /// Recompute every running timer from its `ends_at` against one shared `now`.
    ///
    /// Returns the ids that reached zero on this tick, in collection order.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<TimerId> {
        let mut finished = Vec::new();
        for timer in self.items.iter_mut().filter(|t| t.running) {
            let Some(ends) = timer.ends_at else {
                // Unreachable through the reducers; loaded records are normalized
                timer.running = false;
                continue;
            };
            timer.remaining = seconds_until(ends, now);
            if timer.remaining == 0 {
                timer.running = false;
                timer.ends_at = None;
                finished.push(timer.id.clone());
            }
        }
        finished
    }

    /// Whether a tick at any time would change something
    pub fn has_running(&self) -> bool {
        self.items.iter().any(|t| t.running)
    }
}

/// Floor to whole seconds, mapping negatives and NaN to zero
fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

fn ends_at(now: DateTime<Utc>, remaining: u64) -> DateTime<Utc> {
    i64::try_from(remaining)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `max(0, ceil((ends - now) / 1s))`
fn seconds_until(ends: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (ends - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}

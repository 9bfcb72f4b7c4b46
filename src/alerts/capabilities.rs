//! Side-effect capabilities the coordinator drives

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    error::AlertError,
    state::{Association, TimerId},
};

/// Looped alert sound
pub trait AlertSound: Send + Sync {
    /// Start looping playback
    fn play(&self) -> Result<(), AlertError>;

    /// Stop playback; safe to call when nothing plays
    fn stop(&self);

    /// Whether playback started by `play` is still going
    fn is_playing(&self) -> bool {
        true
    }
}

/// Desktop notification surface
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), AlertError>;
}

/// Receiver of "this recipe step is done" signals
pub trait ChecklistSink: Send + Sync {
    fn step_completed(&self, timer_id: &TimerId, association: &Association);
}

/// Capability that does nothing, for disabled audio/notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AlertSound for Silent {
    fn play(&self) -> Result<(), AlertError> {
        Ok(())
    }

    fn stop(&self) {}
}

impl Notifier for Silent {
    fn notify(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
        Ok(())
    }
}

impl ChecklistSink for Silent {
    fn step_completed(&self, _timer_id: &TimerId, _association: &Association) {}
}

/// Step completion published on the checklist channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEvent {
    pub timer_id: TimerId,
    pub recipe_id: Option<String>,
    pub step_index: Option<u32>,
    pub at: DateTime<Utc>,
}

/// Fans checklist events out over a broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastChecklist {
    tx: broadcast::Sender<ChecklistEvent>,
}

impl BroadcastChecklist {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChecklistEvent> {
        self.tx.subscribe()
    }
}

impl ChecklistSink for BroadcastChecklist {
    fn step_completed(&self, timer_id: &TimerId, association: &Association) {
        let event = ChecklistEvent {
            timer_id: timer_id.clone(),
            recipe_id: association.recipe_id.clone(),
            step_index: association.step_index,
            at: Utc::now(),
        };
        // Fire-and-forget: no subscriber is fine
        if self.tx.send(event).is_err() {
            debug!("No checklist subscribers for timer {}", timer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_checklist_delivers_to_subscribers() {
        let checklist = BroadcastChecklist::new(8);
        let mut rx = checklist.subscribe();
        let id = TimerId::generate();
        checklist.step_completed(&id, &Association::new(Some("r1".into()), Some(2)));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.timer_id, id);
        assert_eq!(event.recipe_id.as_deref(), Some("r1"));
        assert_eq!(event.step_index, Some(2));
    }

    #[test]
    fn broadcast_checklist_without_subscribers_is_silent() {
        let checklist = BroadcastChecklist::new(8);
        checklist.step_completed(&TimerId::generate(), &Association::default());
    }
}

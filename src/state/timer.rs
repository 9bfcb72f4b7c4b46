//! Timer entity and its identity types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque timer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier, refusing empty strings
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Back-reference from a timer to the recipe step it was created for.
///
/// The engine never interprets either half; both may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub recipe_id: Option<String>,
    pub step_index: Option<u32>,
}

impl Association {
    pub fn new(recipe_id: Option<String>, step_index: Option<u32>) -> Self {
        Self { recipe_id, step_index }
    }

    /// A free-standing timer carries neither half
    pub fn is_empty(&self) -> bool {
        self.recipe_id.is_none() && self.step_index.is_none()
    }
}

/// Phase derived from `remaining`, `duration` and `running`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// A countdown attached (optionally) to a recipe step.
///
/// Serialized with camelCase keys; this is also the persisted record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: TimerId,
    pub recipe_id: Option<String>,
    pub step_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Configured length in seconds
    pub duration: u64,
    /// Seconds left
    pub remaining: u64,
    pub running: bool,
    pub created_at: DateTime<Utc>,
    /// Set only while running
    pub ends_at: Option<DateTime<Utc>>,
}

impl Timer {
    /// A new idle timer with `remaining == duration`
    pub fn new(
        duration: u64,
        association: Association,
        label: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TimerId::generate(),
            recipe_id: association.recipe_id,
            step_index: association.step_index,
            label,
            duration,
            remaining: duration,
            running: false,
            created_at: now,
            ends_at: None,
        }
    }

    pub fn association(&self) -> Association {
        Association::new(self.recipe_id.clone(), self.step_index)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    pub fn phase(&self) -> TimerPhase {
        if self.running {
            TimerPhase::Running
        } else if self.remaining == 0 {
            TimerPhase::Finished
        } else if self.remaining == self.duration {
            TimerPhase::Idle
        } else {
            TimerPhase::Paused
        }
    }

    /// Display label with the same fallback the timer panel uses
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or("Timer")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_timer_is_idle_with_full_remaining() {
        let timer = Timer::new(90, Association::default(), None, Utc::now());
        assert_eq!(timer.remaining, 90);
        assert!(!timer.running);
        assert!(timer.ends_at.is_none());
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn zero_duration_timer_is_finished() {
        let timer = Timer::new(0, Association::default(), None, Utc::now());
        assert_eq!(timer.phase(), TimerPhase::Finished);
        assert!(timer.is_finished());
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(TimerId::generate(), TimerId::generate());
        assert!(TimerId::parse("").is_none());
        assert_eq!(TimerId::parse("abc").map(|id| id.to_string()), Some("abc".to_string()));
    }

    #[test]
    fn serializes_camel_case_record() {
        let timer = Timer::new(
            30,
            Association::new(Some("42".into()), Some(2)),
            Some("Boil".into()),
            Utc::now(),
        );
        let value = serde_json::to_value(&timer).unwrap();
        assert_eq!(value["recipeId"], "42");
        assert_eq!(value["stepIndex"], 2);
        assert_eq!(value["endsAt"], serde_json::Value::Null);
        assert!(value.get("createdAt").is_some());
    }
}

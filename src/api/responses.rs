//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    alerts::ActiveAlert,
    state::{EngineStatus, Timer, TimerId, TimerPhase},
    tasks::RecipeChecks,
    utils::{format_mm_ss, progress_pct},
};

/// Timer as the panel and step controls display it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub id: TimerId,
    pub recipe_id: Option<String>,
    pub step_index: Option<u32>,
    pub label: String,
    pub duration: u64,
    pub remaining: u64,
    pub running: bool,
    pub phase: TimerPhase,
    pub created_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    /// `MM:SS`
    pub display: String,
    pub progress_pct: u8,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        Self {
            id: timer.id.clone(),
            recipe_id: timer.recipe_id.clone(),
            step_index: timer.step_index,
            label: timer.display_label().to_string(),
            duration: timer.duration,
            remaining: timer.remaining,
            running: timer.running,
            phase: timer.phase(),
            created_at: timer.created_at,
            ends_at: timer.ends_at,
            display: format_mm_ss(timer.remaining),
            progress_pct: progress_pct(timer.duration, timer.remaining),
        }
    }
}

/// API response structure for timer actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: Option<TimerView>,
}

impl ApiResponse {
    pub fn new(status: &str, message: String, timer: Option<&Timer>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer: timer.map(TimerView::from),
        }
    }

    /// The action changed the timer
    pub fn ok(message: String, timer: Option<&Timer>) -> Self {
        Self::new("ok", message, timer)
    }

    /// The action was accepted but had nothing to do
    pub fn noop(message: String, timer: Option<&Timer>) -> Self {
        Self::new("noop", message, timer)
    }

    /// The request was refused before reaching the engine
    pub fn error(message: String) -> Self {
        Self::new("error", message, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimersResponse {
    pub count: usize,
    pub timers: Vec<TimerView>,
}

impl TimersResponse {
    pub fn from_timers(timers: &[Timer]) -> Self {
        Self {
            count: timers.len(),
            timers: timers.iter().map(TimerView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertResponse {
    pub alert: Option<ActiveAlert>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksResponse {
    pub recipe_id: String,
    #[serde(flatten)]
    pub checks: RecipeChecks,
}

/// Engine status with server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timers: usize,
    pub running: usize,
    pub alerting: Option<TimerId>,
    pub persistence_degraded: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

impl StatusResponse {
    pub fn new(
        status: EngineStatus,
        uptime: String,
        port: u16,
        host: String,
        last_action: (Option<String>, Option<DateTime<Utc>>),
    ) -> Self {
        Self {
            timers: status.timers,
            running: status.running,
            alerting: status.alerting,
            persistence_degraded: status.persistence_degraded,
            uptime,
            port,
            host,
            last_action: last_action.0,
            last_action_time: last_action.1,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Recipe ids arrive as strings or numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeIdInput {
    Text(String),
    Number(i64),
}

impl RecipeIdInput {
    pub fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Body of `POST /timers`, mirroring the add-timer control
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTimerRequest {
    pub duration_secs: Option<f64>,
    pub minutes: Option<f64>,
    pub seconds: Option<f64>,
    pub recipe_id: Option<RecipeIdInput>,
    pub step_index: Option<u32>,
    pub label: Option<String>,
    pub auto_start: Option<bool>,
}

impl CreateTimerRequest {
    /// Whole seconds; every field is floored, seconds capped to 0..=59
    pub fn total_secs(&self) -> f64 {
        if let Some(secs) = self.duration_secs {
            return secs.floor();
        }
        let minutes = self.minutes.unwrap_or(0.0).floor().max(0.0);
        let seconds = self.seconds.unwrap_or(0.0).floor().clamp(0.0, 59.0);
        minutes * 60.0 + seconds
    }

    /// Given label, else `Step N` for step timers, else `Timer`
    pub fn resolved_label(&self) -> String {
        match (&self.label, self.step_index) {
            (Some(label), _) => label.clone(),
            (None, Some(i)) => format!("Step {}", i + 1),
            (None, None) => "Timer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRemainingRequest {
    pub seconds: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnoozeRequest {
    pub seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepQuery {
    pub recipe_id: Option<String>,
    pub step_index: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_prefers_explicit_seconds() {
        let req = CreateTimerRequest {
            duration_secs: Some(42.0),
            minutes: Some(3.0),
            ..Default::default()
        };
        assert_eq!(req.total_secs(), 42.0);
    }

    #[test]
    fn fractional_seconds_are_floored() {
        let req = CreateTimerRequest {
            duration_secs: Some(0.5),
            ..Default::default()
        };
        assert_eq!(req.total_secs(), 0.0);
    }

    #[test]
    fn total_combines_minutes_and_capped_seconds() {
        let req = CreateTimerRequest {
            minutes: Some(2.5),
            seconds: Some(75.0),
            ..Default::default()
        };
        assert_eq!(req.total_secs(), 179.0);
    }

    #[test]
    fn label_falls_back_to_step_number() {
        let req = CreateTimerRequest {
            step_index: Some(0),
            ..Default::default()
        };
        assert_eq!(req.resolved_label(), "Step 1");
        assert_eq!(CreateTimerRequest::default().resolved_label(), "Timer");
    }

    #[test]
    fn recipe_id_accepts_numbers() {
        let req: CreateTimerRequest =
            serde_json::from_str(r#"{"recipe_id": 12, "minutes": 1}"#).unwrap();
        assert_eq!(req.recipe_id.map(RecipeIdInput::into_string).as_deref(), Some("12"));
    }
}

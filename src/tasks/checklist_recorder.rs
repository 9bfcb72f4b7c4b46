//! Checklist recorder background task

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::{alerts::ChecklistEvent, error::PersistenceError, persistence::KeyValueStore};

/// Per-recipe checklist, as the recipe detail view stores it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeChecks {
    #[serde(default)]
    pub ingredients: Vec<bool>,
    #[serde(default)]
    pub steps: Vec<bool>,
}

/// Highest step count a checklist may grow to
pub const MAX_STEPS: usize = 1024;

pub fn checks_key(recipe_id: &str) -> String {
    format!("recipe-checks-{recipe_id}")
}

/// Read a recipe checklist; missing or malformed slots read as empty
pub fn load_checks(store: &dyn KeyValueStore, recipe_id: &str) -> RecipeChecks {
    match store.get(&checks_key(recipe_id)) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!("Replacing malformed checklist for recipe {}: {}", recipe_id, e);
            RecipeChecks::default()
        }),
        Ok(None) => RecipeChecks::default(),
        Err(e) => {
            warn!("Failed to read checklist for recipe {}: {}", recipe_id, e);
            RecipeChecks::default()
        }
    }
}

/// Tick the step's checkbox; events without both halves are ignored
pub fn record_step(
    store: &dyn KeyValueStore,
    event: &ChecklistEvent,
) -> Result<bool, PersistenceError> {
    let (Some(recipe_id), Some(step_index)) = (&event.recipe_id, event.step_index) else {
        return Ok(false);
    };
    let index = step_index as usize;
    if index >= MAX_STEPS {
        warn!(
            "Ignoring step {} of recipe {}: beyond {} steps",
            step_index, recipe_id, MAX_STEPS
        );
        return Ok(false);
    }

    let mut checks = load_checks(store, recipe_id);
    if checks.steps.len() <= index {
        checks.steps.resize(index + 1, false);
    }
    checks.steps[index] = true;

    let raw = serde_json::to_string(&checks)?;
    store.set(&checks_key(recipe_id), &raw)?;
    Ok(true)
}

/// Background task that marks recipe steps complete when their timers are dismissed
pub async fn checklist_recorder_task(
    store: Arc<dyn KeyValueStore>,
    mut events: broadcast::Receiver<ChecklistEvent>,
) {
    info!("Starting checklist recorder task");

    loop {
        match events.recv().await {
            Ok(event) => match record_step(store.as_ref(), &event) {
                Ok(true) => info!(
                    "Checked step {:?} of recipe {:?}",
                    event.step_index, event.recipe_id
                ),
                Ok(false) => debug!("Timer {} has no recipe step to check", event.timer_id),
                Err(e) => warn!("Failed to record checklist step: {}", e),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!("Checklist recorder lagged, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Checklist channel closed, stopping recorder");
                break;
            }
        }
    }
}

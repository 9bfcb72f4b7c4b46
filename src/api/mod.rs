//! HTTP API module
//!
//! Presentation adapters over the timer engine: the panel, the add-timer
//! control, per-step controls and the alert modal.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", get(list_timers).post(create_timer))
        .route("/timers/:id", get(get_timer).delete(delete_timer))
        .route("/timers/:id/start", post(start_timer))
        .route("/timers/:id/pause", post(pause_timer))
        .route("/timers/:id/reset", post(reset_timer))
        .route("/timers/:id/remaining", put(set_remaining))
        .route("/steps", get(find_step_timer))
        .route("/alert", get(get_alert))
        .route("/alert/:id/dismiss", post(dismiss_alert))
        .route("/alert/:id/snooze", post(snooze_alert))
        .route("/recipes/:recipe_id/checks", get(recipe_checks))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

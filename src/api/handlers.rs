//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info};

use crate::{
    error::EngineError,
    state::{AppState, Association, TimerId},
    tasks::load_checks,
};
use super::responses::{
    AlertResponse, ApiResponse, ChecksResponse, CreateTimerRequest, HealthResponse,
    SetRemainingRequest, SnoozeRequest, StatusResponse, StepQuery, TimerView, TimersResponse,
};

fn internal(context: &str, e: EngineError) -> StatusCode {
    error!("Failed to {}: {}", context, e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Build the response for an action on one timer, `noop` when nothing changed
fn action_response(
    state: &AppState,
    id: &TimerId,
    changed: bool,
    done: &str,
) -> Result<Json<ApiResponse>, StatusCode> {
    let timer = state.get_timer(id).map_err(|e| internal("read timer", e))?;
    if changed {
        info!("Timer {} {}", id, done);
        Ok(Json(ApiResponse::ok(format!("Timer {}", done), timer.as_ref())))
    } else {
        Ok(Json(ApiResponse::noop(
            format!("Timer {} unchanged", id),
            timer.as_ref(),
        )))
    }
}

fn unknown_id(raw: &str) -> Json<ApiResponse> {
    Json(ApiResponse::noop(format!("No timer with id {:?}", raw), None))
}

/// Handle GET /timers - List all timers with display fields
pub async fn list_timers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimersResponse>, StatusCode> {
    let timers = state.get_timers().map_err(|e| internal("list timers", e))?;
    Ok(Json(TimersResponse::from_timers(&timers)))
}

/// Handle POST /timers - Add a timer, started unless `auto_start` is false
pub async fn create_timer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), StatusCode> {
    let total = request.total_secs();
    if total.is_nan() || total <= 0.0 {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Please set a duration".to_string())),
        ));
    }

    let label = request.resolved_label();
    let auto_start = request.auto_start.unwrap_or(true);
    let association = Association::new(
        request.recipe_id.map(|r| r.into_string()),
        request.step_index,
    );

    let id = state
        .create_timer(total, association, Some(label))
        .map_err(|e| internal("create timer", e))?;
    if auto_start {
        state.start_timer(&id).map_err(|e| internal("start timer", e))?;
    }

    let timer = state.get_timer(&id).map_err(|e| internal("read timer", e))?;
    info!("Created timer {} ({}s, auto_start={})", id, total, auto_start);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Timer created".to_string(), timer.as_ref())),
    ))
}

/// Handle GET /timers/:id
pub async fn get_timer(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<TimerView>, StatusCode> {
    let id = TimerId::parse(&raw).ok_or(StatusCode::NOT_FOUND)?;
    match state.get_timer(&id).map_err(|e| internal("read timer", e))? {
        Some(timer) => Ok(Json(TimerView::from(&timer))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Handle DELETE /timers/:id
pub async fn delete_timer(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    match state.remove_timer(&id).map_err(|e| internal("remove timer", e))? {
        Some(removed) => {
            info!("Timer {} removed", id);
            Ok(Json(ApiResponse::ok("Timer removed".to_string(), Some(&removed))))
        }
        None => Ok(unknown_id(&raw)),
    }
}

/// Handle POST /timers/:id/start
pub async fn start_timer(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    let changed = state.start_timer(&id).map_err(|e| internal("start timer", e))?;
    action_response(&state, &id, changed, "started")
}

/// Handle POST /timers/:id/pause
pub async fn pause_timer(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    let changed = state.pause_timer(&id).map_err(|e| internal("pause timer", e))?;
    action_response(&state, &id, changed, "paused")
}

/// Handle POST /timers/:id/reset
pub async fn reset_timer(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    let changed = state.reset_timer(&id).map_err(|e| internal("reset timer", e))?;
    action_response(&state, &id, changed, "reset")
}

/// Handle PUT /timers/:id/remaining
pub async fn set_remaining(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    Json(request): Json<SetRemainingRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    let changed = state
        .set_remaining(&id, request.seconds)
        .map_err(|e| internal("set remaining", e))?;
    action_response(&state, &id, changed, "adjusted")
}

/// Handle GET /steps - Timer attached to a recipe step
pub async fn find_step_timer(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StepQuery>,
) -> Result<Json<TimerView>, StatusCode> {
    let association = Association::new(query.recipe_id, query.step_index);
    match state
        .find_for_step(&association)
        .map_err(|e| internal("find step timer", e))?
    {
        Some(timer) => Ok(Json(TimerView::from(&timer))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// Handle GET /alert - Currently alerting timer, if any
pub async fn get_alert(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertResponse>, StatusCode> {
    let alert = state
        .get_active_alert()
        .map_err(|e| internal("read alert", e))?;
    Ok(Json(AlertResponse { alert }))
}

/// Handle POST /alert/:id/dismiss - Acknowledge and remove a finished timer
pub async fn dismiss_alert(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    match state
        .dismiss_alert(&id)
        .map_err(|e| internal("dismiss alert", e))?
    {
        Some(removed) => {
            info!("Alert for timer {} dismissed", id);
            Ok(Json(ApiResponse::ok(
                "Timer dismissed".to_string(),
                Some(&removed),
            )))
        }
        None => Ok(unknown_id(&raw)),
    }
}

/// Handle POST /alert/:id/snooze - Add time and restart a finished timer
pub async fn snooze_alert(
    State(state): State<Arc<AppState>>,
    Path(raw): Path<String>,
    request: Option<Json<SnoozeRequest>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let Some(id) = TimerId::parse(&raw) else {
        return Ok(unknown_id(&raw));
    };
    let seconds = request.and_then(|Json(r)| r.seconds);
    let changed = state
        .snooze_alert(&id, seconds)
        .map_err(|e| internal("snooze alert", e))?;
    action_response(&state, &id, changed, "snoozed")
}

/// Handle GET /recipes/:recipe_id/checks - Step checklist recorded from dismissals
pub async fn recipe_checks(
    State(state): State<Arc<AppState>>,
    Path(recipe_id): Path<String>,
) -> Json<ChecksResponse> {
    let checks = load_checks(state.slots.as_ref(), &recipe_id);
    Json(ChecksResponse { recipe_id, checks })
}

/// Handle GET /status - Return current engine status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let status = state
        .get_status()
        .map_err(|e| internal("get engine status", e))?;

    Ok(Json(StatusResponse::new(
        status,
        state.get_uptime(),
        state.port,
        state.host.clone(),
        state.get_last_action(),
    )))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

//! API v0 endpoints.
//!
//! Version 0 signals an unstable API -- breaking changes are expected
//! until the scheduler reaches 1.0.

use std::future::Future;
use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa_axum::{router::OpenApiRouter, routes};

use super::server::SharedState;
use crate::alarm::{ReminderHandle, Reconciliation};
use crate::api_client::types::{
    AlertPreferences, ArmRequest, ErrorBody, ReconcileResponse, ReminderState,
};
use crate::error::Error;
use crate::tracing::prelude::*;
use crate::types::{AnchorTime, ReminderConfig, ScheduleState};

/// How long a handler waits for the reminder service to answer.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the v0 API routes with OpenAPI metadata.
pub fn routes() -> OpenApiRouter<SharedState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(get_reminder))
        .routes(routes!(arm))
        .routes(routes!(disarm))
        .routes(routes!(acknowledge))
        .routes(routes!(reconcile))
        .routes(routes!(test_alert))
        .routes(routes!(get_preferences, put_preferences))
}

/// Core errors as HTTP responses.
struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::Precondition(_) => StatusCode::PRECONDITION_FAILED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Await a service command, bounded by [`COMMAND_TIMEOUT`].
async fn command<T>(request: impl Future<Output = crate::error::Result<T>>) -> Result<T, ApiError> {
    match tokio::time::timeout(COMMAND_TIMEOUT, request).await {
        Ok(result) => result.map_err(ApiError),
        Err(_) => Err(ApiError(Error::ServiceStopped)),
    }
}

fn snapshot(state: &ScheduleState, now_ms: i64) -> ReminderState {
    ReminderState {
        phase: state.phase().to_string(),
        running: state.running,
        ringing: state.ringing,
        interval_minutes: state.interval_minutes,
        next_fire_epoch_millis: state.running.then_some(state.next_fire_epoch_millis),
        remaining_secs: state
            .remaining_millis(now_ms)
            .map(|ms| u64::try_from(ms).unwrap_or(0).div_ceil(1000)),
    }
}

async fn current(reminder: &ReminderHandle) -> Result<ReminderState, ApiError> {
    let state = reminder.state().await?;
    Ok(snapshot(&state, reminder.now_millis()))
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = OK, description = "Server is running", body = String),
    ),
)]
async fn health() -> &'static str {
    "OK"
}

/// Return the current reminder state, read from the store.
#[utoipa::path(
    get,
    path = "/reminder",
    tag = "reminder",
    responses(
        (status = OK, description = "Current reminder state", body = ReminderState),
        (status = INTERNAL_SERVER_ERROR, description = "State store unreadable", body = ErrorBody),
    ),
)]
async fn get_reminder(State(state): State<SharedState>) -> ApiResult<ReminderState> {
    Ok(Json(current(&state.reminder).await?))
}

/// Start the reminder.
#[utoipa::path(
    post,
    path = "/reminder/arm",
    tag = "reminder",
    request_body = ArmRequest,
    responses(
        (status = OK, description = "Reminder armed", body = ReminderState),
        (status = CONFLICT, description = "Reminder is not idle", body = ErrorBody),
        (status = PRECONDITION_FAILED, description = "Missing platform permission", body = ErrorBody),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid interval or start time", body = ErrorBody),
    ),
)]
async fn arm(
    State(state): State<SharedState>,
    Json(req): Json<ArmRequest>,
) -> ApiResult<ReminderState> {
    let anchor = req
        .start_at
        .as_deref()
        .map(str::parse::<AnchorTime>)
        .transpose()?;
    let config = ReminderConfig {
        interval_minutes: req.interval_minutes,
        anchor,
    };

    let armed = command(state.reminder.arm(config)).await?;
    Ok(Json(snapshot(&armed, state.reminder.now_millis())))
}

/// Stop the reminder and any active alert.
#[utoipa::path(
    post,
    path = "/reminder/disarm",
    tag = "reminder",
    responses(
        (status = OK, description = "Reminder idle", body = ReminderState),
    ),
)]
async fn disarm(State(state): State<SharedState>) -> ApiResult<ReminderState> {
    let idle = command(state.reminder.disarm()).await?;
    Ok(Json(snapshot(&idle, state.reminder.now_millis())))
}

/// Dismiss the ringing alert.
#[utoipa::path(
    post,
    path = "/reminder/acknowledge",
    tag = "reminder",
    responses(
        (status = OK, description = "Alert dismissed", body = ReminderState),
        (status = CONFLICT, description = "Reminder is not ringing", body = ErrorBody),
    ),
)]
async fn acknowledge(State(state): State<SharedState>) -> ApiResult<ReminderState> {
    let acked = command(state.reminder.acknowledge()).await?;
    Ok(Json(snapshot(&acked, state.reminder.now_millis())))
}

/// Run the self-heal check now.
#[utoipa::path(
    post,
    path = "/reminder/reconcile",
    tag = "reminder",
    responses(
        (status = OK, description = "Reconciled", body = ReconcileResponse),
    ),
)]
async fn reconcile(State(state): State<SharedState>) -> ApiResult<ReconcileResponse> {
    let outcome = command(state.reminder.reconcile()).await?;
    let (outcome, missed) = match outcome {
        Reconciliation::Idle => ("idle", None),
        Reconciliation::Resumed { .. } => ("resumed", None),
        Reconciliation::Healed { missed_ms, .. } => ("healed", Some(missed_ms)),
        Reconciliation::Repaired => ("repaired", None),
    };

    Ok(Json(ReconcileResponse {
        outcome: outcome.into(),
        missed_fire_epoch_millis: missed,
        state: current(&state.reminder).await?,
    }))
}

/// Show one alert without touching the schedule.
#[utoipa::path(
    post,
    path = "/reminder/test-alert",
    tag = "reminder",
    responses(
        (status = OK, description = "Alert shown", body = ReminderState),
        (status = CONFLICT, description = "Reminder is already ringing", body = ErrorBody),
    ),
)]
async fn test_alert(State(state): State<SharedState>) -> ApiResult<ReminderState> {
    command(state.reminder.test_alert()).await?;
    Ok(Json(current(&state.reminder).await?))
}

/// Return the alert preferences.
#[utoipa::path(
    get,
    path = "/preferences",
    tag = "preferences",
    responses(
        (status = OK, description = "Alert preferences", body = AlertPreferences),
    ),
)]
async fn get_preferences(State(state): State<SharedState>) -> ApiResult<AlertPreferences> {
    Ok(Json(state.reminder.preferences().await?.into()))
}

/// Replace the alert preferences.
#[utoipa::path(
    put,
    path = "/preferences",
    tag = "preferences",
    request_body = AlertPreferences,
    responses(
        (status = OK, description = "Preferences saved", body = AlertPreferences),
    ),
)]
async fn put_preferences(
    State(state): State<SharedState>,
    Json(req): Json<AlertPreferences>,
) -> ApiResult<AlertPreferences> {
    let saved = command(state.reminder.set_preferences(req.into())).await?;
    Ok(Json(saved.into()))
}

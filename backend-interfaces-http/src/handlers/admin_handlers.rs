use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::admin_attendance_commands;
use backend_application::dtos::{
    AttendanceOutcome, BulkRemovalOutcome, BulkRemovePayload, BulkUpdateOutcome, MoveStatusPayload,
    RemovePayload, SetAttendancePayload,
};
use backend_application::AppState;
use backend_domain::{EventId, UserId};

use crate::error::HttpError;
use crate::middleware::acting_user;

pub async fn move_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((event_id, user_id)): Path<(i64, String)>,
    Json(payload): Json<MoveStatusPayload>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let outcome = admin_attendance_commands::admin_move_status(
        &state,
        EventId(event_id),
        &UserId(user_id),
        &acting,
        payload,
    )
    .await?;
    Ok(Json(outcome))
}

/// The body is optional; notification defaults to on.
pub async fn remove_attendee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((event_id, user_id)): Path<(i64, String)>,
    payload: Option<Json<RemovePayload>>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let outcome = admin_attendance_commands::admin_remove(
        &state,
        EventId(event_id),
        &UserId(user_id),
        &acting,
        payload,
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn remove_attendees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
    Json(payload): Json<BulkRemovePayload>,
) -> Result<Json<BulkRemovalOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let outcome =
        admin_attendance_commands::admin_remove_many(&state, EventId(event_id), &acting, payload)
            .await?;
    Ok(Json(outcome))
}

pub async fn set_attendees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
    Json(payload): Json<SetAttendancePayload>,
) -> Result<Json<BulkUpdateOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let outcome =
        admin_attendance_commands::admin_set_many(&state, EventId(event_id), &acting, payload)
            .await?;
    Ok(Json(outcome))
}

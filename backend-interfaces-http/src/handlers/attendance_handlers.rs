use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::rsvp_commands;
use backend_application::dtos::{AttendanceOutcome, AttendanceSummary, ManagementRoster, RsvpPayload};
use backend_application::queries::attendance_queries;
use backend_application::AppState;
use backend_domain::{AttendanceRecord, EventId};

use crate::error::HttpError;
use crate::middleware::{acting_user, authorize};

pub async fn set_rsvp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
    Json(payload): Json<RsvpPayload>,
) -> Result<Json<AttendanceOutcome>, HttpError> {
    let user_id = acting_user(&state.config, &headers)?;
    let outcome = rsvp_commands::set_status(&state, EventId(event_id), &user_id, payload).await?;
    Ok(Json(outcome))
}

pub async fn get_my_rsvp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
) -> Result<Json<Option<AttendanceRecord>>, HttpError> {
    let user_id = acting_user(&state.config, &headers)?;
    let record = attendance_queries::my_attendance(&state, EventId(event_id), &user_id).await?;
    Ok(Json(record))
}

pub async fn get_attendance_summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
) -> Result<Json<AttendanceSummary>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summary = attendance_queries::attendance_summary(&state, EventId(event_id)).await?;
    Ok(Json(summary))
}

pub async fn get_management_roster(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<i64>,
) -> Result<Json<ManagementRoster>, HttpError> {
    let user_id = acting_user(&state.config, &headers)?;
    let roster = attendance_queries::management_roster(&state, EventId(event_id), &user_id).await?;
    Ok(Json(roster))
}

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use backend_application::commands::no_show_commands;
use backend_application::dtos::{NoShowOutcome, NoShowPayload};
use backend_application::AppState;
use backend_domain::{EventId, UserId};

use crate::error::HttpError;
use crate::middleware::acting_user;

pub async fn mark_no_show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((event_id, user_id)): Path<(i64, String)>,
    payload: Option<Json<NoShowPayload>>,
) -> Result<Json<NoShowOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    let outcome = no_show_commands::mark_no_show(
        &state,
        EventId(event_id),
        &UserId(user_id),
        &acting,
        payload,
    )
    .await?;
    Ok(Json(outcome))
}

pub async fn clear_no_show(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((event_id, user_id)): Path<(i64, String)>,
) -> Result<Json<NoShowOutcome>, HttpError> {
    let acting = acting_user(&state.config, &headers)?;
    let outcome =
        no_show_commands::clear_no_show(&state, EventId(event_id), &UserId(user_id), &acting).await?;
    Ok(Json(outcome))
}

use chrono::Utc;
use tracing::info;

use backend_domain::{
    normalize_optional_text, AttendanceError, AttendanceStatus, EventId, NoShowRecord, UserId,
};

use crate::dtos::{NoShowOutcome, NoShowPayload};
use crate::lookups::{display_name, load_active_event, load_user, storage_error};
use crate::{AppError, AppState};

pub async fn mark_no_show(
    state: &AppState,
    event_id: EventId,
    target: &UserId,
    acting_user: &UserId,
    payload: NoShowPayload,
) -> Result<NoShowOutcome, AppError> {
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let now = Utc::now();
    if !event.has_started(now) {
        return Err(AttendanceError::EventNotStarted.into());
    }
    let record = state
        .attendance_repo
        .find_record(event_id, target)
        .await
        .map_err(|err| storage_error("load attendance", err))?;
    if record.map(|record| record.status) != Some(AttendanceStatus::Yes) {
        return Err(AttendanceError::NotAttending.into());
    }

    let inserted = state
        .no_show_repo
        .insert(&NoShowRecord {
            event_id,
            user_id: target.clone(),
            marked_at: now,
            marked_by: acting_user.clone(),
            notes: normalize_optional_text(payload.notes),
        })
        .await
        .map_err(|err| storage_error("insert no-show", err))?;
    if !inserted {
        return Err(AttendanceError::AlreadyMarked.into());
    }

    info!("no-show marked event={} user={} by={}", event_id, target, acting_user);
    Ok(NoShowOutcome {
        event_id,
        user_id: target.clone(),
        marked: true,
        message: format!("{} marked as no-show", display_name(state, target).await),
    })
}

pub async fn clear_no_show(
    state: &AppState,
    event_id: EventId,
    target: &UserId,
    acting_user: &UserId,
) -> Result<NoShowOutcome, AppError> {
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let deleted = state
        .no_show_repo
        .delete(event_id, target)
        .await
        .map_err(|err| storage_error("delete no-show", err))?;
    if !deleted {
        return Err(AppError::NotFound(format!(
            "no no-show recorded for {} at event {}",
            target, event_id
        )));
    }

    info!("no-show cleared event={} user={} by={}", event_id, target, acting_user);
    Ok(NoShowOutcome {
        event_id,
        user_id: target.clone(),
        marked: false,
        message: format!("No-show cleared for {}", display_name(state, target).await),
    })
}

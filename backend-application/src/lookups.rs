// Loaders and post-commit dispatch shared by commands and queries

use std::collections::HashSet;

use tracing::{error, warn};

use backend_domain::{
    AttendanceChange, AttendanceRecord, Event, EventId, Notification, OutboundNotification,
    TransitionPlan, User, UserId,
};

use crate::dtos::PromotedUser;
use crate::{AppError, AppState};

pub(crate) fn storage_error(action: &str, err: anyhow::Error) -> AppError {
    error!("failed to {}: {}", action, err);
    AppError::Internal(err)
}

/// Inactive events are treated as absent.
pub(crate) async fn load_active_event(state: &AppState, event_id: EventId) -> Result<Event, AppError> {
    let event = state
        .event_repo
        .find_event(event_id)
        .await
        .map_err(|err| storage_error("load event", err))?;
    match event {
        Some(event) if event.is_active => Ok(event),
        _ => Err(AppError::NotFound(format!("event {} not found", event_id))),
    }
}

pub(crate) async fn load_user(state: &AppState, user_id: &UserId) -> Result<User, AppError> {
    state
        .user_repo
        .find_user(user_id)
        .await
        .map_err(|err| storage_error("load user", err))?
        .ok_or_else(|| AppError::NotFound(format!("user {} not found", user_id)))
}

pub(crate) async fn load_records(
    state: &AppState,
    event_id: EventId,
) -> Result<Vec<AttendanceRecord>, AppError> {
    state
        .attendance_repo
        .list_for_event(event_id)
        .await
        .map_err(|err| storage_error("list attendance", err))
}

pub(crate) async fn commit(state: &AppState, changes: &[AttendanceChange]) -> Result<(), AppError> {
    if changes.is_empty() {
        return Ok(());
    }
    state
        .attendance_repo
        .apply_changes(changes)
        .await
        .map_err(|err| storage_error("commit attendance changes", err))?;
    state.metrics.record_mutation();
    Ok(())
}

pub(crate) async fn display_name(state: &AppState, user_id: &UserId) -> String {
    match state.user_repo.find_user(user_id).await {
        Ok(Some(user)) => user.name,
        Ok(None) => user_id.to_string(),
        Err(err) => {
            warn!("failed to resolve user {}: {}", user_id, err);
            user_id.to_string()
        }
    }
}

pub(crate) async fn promoted_user(state: &AppState, plan: &TransitionPlan) -> Option<PromotedUser> {
    let record = plan.promoted.as_ref()?;
    state.metrics.record_promotion();
    Some(PromotedUser {
        user_id: record.user_id.clone(),
        name: display_name(state, &record.user_id).await,
    })
}

/// Resolves recipients and hands the batch to the notifier. Runs after the
/// commit; nothing here can fail the operation.
pub(crate) async fn dispatch(state: &AppState, event: &Event, notifications: Vec<Notification>) {
    if notifications.is_empty() {
        return;
    }
    let ids = notifications
        .iter()
        .map(|item| item.recipient.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let users = match state.user_repo.find_users(&ids).await {
        Ok(users) => users,
        Err(err) => {
            warn!("failed to resolve notification recipients: {}", err);
            return;
        }
    };
    let outbound = notifications
        .into_iter()
        .filter_map(|item| {
            let Some(recipient) = users.get(&item.recipient) else {
                warn!("notification recipient {} not found", item.recipient);
                return None;
            };
            Some(OutboundNotification {
                recipient: recipient.clone(),
                event: event.clone(),
                kind: item.kind,
            })
        })
        .collect::<Vec<_>>();
    if !outbound.is_empty() {
        state
            .notification_service
            .spawn_notifications(state.config.clone(), outbound);
    }
}

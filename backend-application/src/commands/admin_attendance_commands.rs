use chrono::Utc;
use tracing::info;

use backend_domain::{
    apply_changes, plan_admin_move, plan_admin_set, plan_removal, AttendanceCounts,
    AttendanceError, AttendanceStatus, BatchPlan, EventId, UserId,
};

use crate::dtos::{
    AttendanceOutcome, AttendeeEntry, BulkRemovalOutcome, BulkRemovePayload, BulkUpdateOutcome,
    MoveStatusPayload, PromotedUser, RemovePayload, SetAttendancePayload, StatusUpdate,
};
use crate::lookups::{
    commit, display_name, dispatch, load_active_event, load_records, load_user, promoted_user,
    storage_error,
};
use crate::{AppError, AppState};

fn moved_phrase(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Yes => "attending",
        AttendanceStatus::No => "not attending",
        AttendanceStatus::Maybe => "maybe attending",
        AttendanceStatus::Waitlist => "waitlist",
    }
}

/// Forced status change by a host or staff member. Yes on a full event is
/// rejected instead of waitlisted.
pub async fn admin_move_status(
    state: &AppState,
    event_id: EventId,
    target: &UserId,
    acting_user: &UserId,
    payload: MoveStatusPayload,
) -> Result<AttendanceOutcome, AppError> {
    let new_status = AttendanceStatus::parse(&payload.status)?;
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let (plan, counts) = {
        let _guard = state.event_locks.acquire(event_id).await;
        let mut records = load_records(state, event_id).await?;
        let plan = match plan_admin_move(&event, &records, target, new_status, Utc::now()) {
            Ok(plan) => plan,
            Err(err @ AttendanceError::CapacityExceeded { .. }) => {
                state.metrics.record_capacity_rejection();
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };
        commit(state, &plan.changes).await?;
        apply_changes(&mut records, &plan.changes);
        (plan, AttendanceCounts::tally(&records))
    };

    info!(
        "admin move event={} user={} by={} {:?} -> {}",
        event_id, target, acting_user, plan.previous, new_status
    );

    let promoted = promoted_user(state, &plan).await;
    let mut message = format!(
        "{} moved to {}.",
        display_name(state, target).await,
        moved_phrase(new_status)
    );
    if let Some(promoted) = &promoted {
        message.push_str(&format!(
            " {} has been moved from waitlist to attending.",
            promoted.name
        ));
    }

    dispatch(state, &event, plan.outbound(payload.notify)).await;

    Ok(AttendanceOutcome {
        event_id,
        user_id: target.clone(),
        status: plan.resulting,
        waitlisted: false,
        message,
        counts,
        promoted,
    })
}

/// Deletes another user's record.
pub async fn admin_remove(
    state: &AppState,
    event_id: EventId,
    target: &UserId,
    acting_user: &UserId,
    payload: RemovePayload,
) -> Result<AttendanceOutcome, AppError> {
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let (plan, counts) = {
        let _guard = state.event_locks.acquire(event_id).await;
        let mut records = load_records(state, event_id).await?;
        let plan = plan_removal(&event, &records, target, Utc::now())?;
        commit(state, &plan.changes).await?;
        apply_changes(&mut records, &plan.changes);
        (plan, AttendanceCounts::tally(&records))
    };

    info!(
        "admin remove event={} user={} by={} was {:?}",
        event_id, target, acting_user, plan.previous
    );

    let promoted = promoted_user(state, &plan).await;
    let mut message = format!("RSVP removed for {}", display_name(state, target).await);
    if let Some(promoted) = &promoted {
        message.push_str(&format!(
            ". {} has been moved from waitlist to attending.",
            promoted.name
        ));
    }

    dispatch(state, &event, plan.outbound(payload.notify)).await;

    Ok(AttendanceOutcome {
        event_id,
        user_id: target.clone(),
        status: None,
        waitlisted: false,
        message,
        counts,
        promoted,
    })
}

/// Removes several records in one transaction. Every removal runs its own
/// promotion check; users without a record are skipped.
pub async fn admin_remove_many(
    state: &AppState,
    event_id: EventId,
    acting_user: &UserId,
    payload: BulkRemovePayload,
) -> Result<BulkRemovalOutcome, AppError> {
    if payload.user_ids.is_empty() {
        return Err(AppError::BadRequest("user_ids must not be empty".to_string()));
    }
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let mut removed = Vec::new();
    let mut skipped = Vec::new();
    let mut batch = BatchPlan::default();

    let counts = {
        let _guard = state.event_locks.acquire(event_id).await;
        let mut records = load_records(state, event_id).await?;
        let now = Utc::now();
        for target in payload.user_ids.iter() {
            let plan = match plan_removal(&event, &records, target, now) {
                Ok(plan) => plan,
                Err(AttendanceError::RecordNotFound) => {
                    skipped.push(target.clone());
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            apply_changes(&mut records, &plan.changes);
            batch.absorb(&plan, payload.notify);
            removed.push(target.clone());
        }
        commit(state, &batch.changes).await?;
        AttendanceCounts::tally(&records)
    };

    info!(
        "admin bulk remove event={} by={} removed={} skipped={} promoted={}",
        event_id,
        acting_user,
        removed.len(),
        skipped.len(),
        batch.promoted.len()
    );

    let promoted = promoted_users(state, &batch).await;
    let mut message = format!("Removed {} RSVP(s)", removed.len());
    if !skipped.is_empty() {
        message.push_str(&format!(", {} without an RSVP skipped", skipped.len()));
    }
    message.push_str(&promotion_suffix(&promoted));
    message.push('.');

    dispatch(state, &event, batch.notifications).await;

    Ok(BulkRemovalOutcome {
        event_id,
        removed,
        skipped,
        promoted,
        message,
        counts,
    })
}

/// Sets many users to yes, no or maybe in one transaction. Yes on a full
/// event lands on the waitlist; confirmed attendees are never demoted.
/// Hosts are skipped and every listed user must exist.
pub async fn admin_set_many(
    state: &AppState,
    event_id: EventId,
    acting_user: &UserId,
    payload: SetAttendancePayload,
) -> Result<BulkUpdateOutcome, AppError> {
    let entries = payload
        .no
        .iter()
        .map(|entry| (entry, AttendanceStatus::No))
        .chain(payload.yes.iter().map(|entry| (entry, AttendanceStatus::Yes)))
        .chain(payload.maybe.iter().map(|entry| (entry, AttendanceStatus::Maybe)))
        .collect::<Vec<_>>();
    if entries.is_empty() {
        return Err(AppError::BadRequest("no attendees given".to_string()));
    }
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;
    ensure_users_exist(state, &entries).await?;

    let mut updated = Vec::new();
    let mut waitlisted = Vec::new();
    let mut skipped = Vec::new();
    let mut batch = BatchPlan::default();

    let counts = {
        let _guard = state.event_locks.acquire(event_id).await;
        let mut records = load_records(state, event_id).await?;
        let now = Utc::now();
        for (entry, status) in entries.iter() {
            let target = entry.user_id();
            let plan = match plan_admin_set(&event, &records, target, *status, now) {
                Ok(plan) => plan,
                Err(AttendanceError::HostSelfRsvp) => {
                    if !skipped.contains(target) {
                        skipped.push(target.clone());
                    }
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            if plan.changes.is_empty() {
                continue;
            }
            apply_changes(&mut records, &plan.changes);
            batch.absorb(&plan, entry.notify());
            if plan.waitlisted {
                waitlisted.push(target.clone());
            }
            if let Some(resulting) = plan.resulting {
                updated.push(StatusUpdate {
                    user_id: target.clone(),
                    previous: plan.previous,
                    status: resulting,
                });
            }
        }
        commit(state, &batch.changes).await?;
        AttendanceCounts::tally(&records)
    };

    for _ in waitlisted.iter() {
        state.metrics.record_waitlisted();
    }
    info!(
        "admin bulk set event={} by={} updated={} waitlisted={} promoted={}",
        event_id,
        acting_user,
        updated.len(),
        waitlisted.len(),
        batch.promoted.len()
    );

    let promoted = promoted_users(state, &batch).await;
    let mut message = "Attendance updated successfully".to_string();
    message.push_str(&promotion_suffix(&promoted));
    message.push('.');

    dispatch(state, &event, batch.notifications).await;

    Ok(BulkUpdateOutcome {
        event_id,
        updated,
        waitlisted,
        skipped,
        promoted,
        message,
        counts,
    })
}

async fn ensure_users_exist(
    state: &AppState,
    entries: &[(&AttendeeEntry, AttendanceStatus)],
) -> Result<(), AppError> {
    let mut ids = entries
        .iter()
        .map(|(entry, _)| entry.user_id().clone())
        .collect::<Vec<_>>();
    ids.sort();
    ids.dedup();
    let users = state
        .user_repo
        .find_users(&ids)
        .await
        .map_err(|err| storage_error("load users", err))?;
    match ids.iter().find(|id| !users.contains_key(*id)) {
        Some(missing) => Err(AppError::NotFound(format!("user {} not found", missing))),
        None => Ok(()),
    }
}

async fn promoted_users(state: &AppState, batch: &BatchPlan) -> Vec<PromotedUser> {
    let mut promoted = Vec::with_capacity(batch.promoted.len());
    for record in batch.promoted.iter() {
        state.metrics.record_promotion();
        promoted.push(PromotedUser {
            user_id: record.user_id.clone(),
            name: display_name(state, &record.user_id).await,
        });
    }
    promoted
}

fn promotion_suffix(promoted: &[PromotedUser]) -> String {
    promoted
        .iter()
        .map(|item| format!(". {} has been moved from waitlist to attending", item.name))
        .collect()
}

use std::collections::HashMap;

use chrono::Utc;

use backend_domain::{
    consolidate, AttendanceCounts, AttendanceRecord, AttendanceStatus, EventId, User, UserId,
};

use crate::dtos::{AttendanceSummary, ManagementRoster, RosterMember};
use crate::lookups::{load_active_event, load_records, load_user, storage_error};
use crate::{AppError, AppState};

async fn load_users(
    state: &AppState,
    ids: Vec<UserId>,
) -> Result<HashMap<UserId, User>, AppError> {
    state
        .user_repo
        .find_users(&ids)
        .await
        .map_err(|err| storage_error("load users", err))
}

/// Public projection: counts and one consolidated list with the hosts.
pub async fn attendance_summary(
    state: &AppState,
    event_id: EventId,
) -> Result<AttendanceSummary, AppError> {
    let event = load_active_event(state, event_id).await?;
    let records = load_records(state, event_id).await?;

    let mut ids = records
        .iter()
        .map(|record| record.user_id.clone())
        .collect::<Vec<_>>();
    ids.push(event.organizer_id.clone());
    ids.extend(event.co_host_id.clone());
    let users = load_users(state, ids).await?;

    Ok(AttendanceSummary {
        event_id,
        counts: AttendanceCounts::tally(&records),
        max_attendees: event.max_attendees,
        attendees: consolidate(&event, &records, &users),
    })
}

pub async fn management_roster(
    state: &AppState,
    event_id: EventId,
    acting_user: &UserId,
) -> Result<ManagementRoster, AppError> {
    let event = load_active_event(state, event_id).await?;
    load_user(state, acting_user).await?.ensure_can_manage(&event)?;

    let records = load_records(state, event_id).await?;
    let ids = records
        .iter()
        .map(|record| record.user_id.clone())
        .collect::<Vec<_>>();
    let users = load_users(state, ids.clone()).await?;

    let now = Utc::now();
    let event_has_started = event.has_started(now);
    let event_has_passed = event.has_ended(now);

    let no_show_user_ids = if event_has_started {
        state
            .no_show_repo
            .list_for_event(event_id)
            .await
            .map_err(|err| storage_error("list no-shows", err))?
            .into_iter()
            .map(|record| record.user_id)
            .collect()
    } else {
        Vec::new()
    };
    let no_show_counts = if event_has_passed || ids.is_empty() {
        HashMap::new()
    } else {
        state
            .no_show_repo
            .count_by_user(&ids)
            .await
            .map_err(|err| storage_error("count no-shows", err))?
    };

    let members = |status: AttendanceStatus| {
        records
            .iter()
            .filter(|record| record.status == status)
            .map(|record| RosterMember::new(record, users.get(&record.user_id)))
            .collect::<Vec<_>>()
    };

    Ok(ManagementRoster {
        event_id,
        counts: AttendanceCounts::tally(&records),
        max_attendees: event.max_attendees,
        yes: members(AttendanceStatus::Yes),
        maybe: members(AttendanceStatus::Maybe),
        waitlist: members(AttendanceStatus::Waitlist),
        no: members(AttendanceStatus::No),
        organizer_id: event.organizer_id.clone(),
        co_host_id: event.co_host_id.clone(),
        event_has_started,
        event_has_passed,
        no_show_user_ids,
        no_show_counts,
    })
}

/// The acting user's own record, if any.
pub async fn my_attendance(
    state: &AppState,
    event_id: EventId,
    acting_user: &UserId,
) -> Result<Option<AttendanceRecord>, AppError> {
    load_active_event(state, event_id).await?;
    state
        .attendance_repo
        .find_record(event_id, acting_user)
        .await
        .map_err(|err| storage_error("load attendance", err))
}

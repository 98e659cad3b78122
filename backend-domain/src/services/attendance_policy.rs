// Attendance state machine
//
// Every function here is pure: it receives the event, a snapshot of the
// event's records (oldest first) and the clock, and returns the writes to
// commit. Callers hold the per-event lock between reading the snapshot and
// committing the plan.

use chrono::{DateTime, Utc};

use crate::entities::{
    apply_changes, AttendanceChange, AttendanceCounts, AttendanceRecord, Event, Notification,
    NotificationKind,
};
use crate::errors::AttendanceError;
use crate::value_objects::{AttendanceStatus, RsvpRequest, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// The user whose record the operation targets.
    pub subject: UserId,
    pub changes: Vec<AttendanceChange>,
    pub previous: Option<AttendanceStatus>,
    pub resulting: Option<AttendanceStatus>,
    /// A Yes request that landed on the waitlist.
    pub waitlisted: bool,
    pub promoted: Option<AttendanceRecord>,
    pub notifications: Vec<Notification>,
}

impl TransitionPlan {
    fn new(subject: &UserId, previous: Option<AttendanceStatus>) -> Self {
        Self {
            subject: subject.clone(),
            changes: Vec::new(),
            previous,
            resulting: None,
            waitlisted: false,
            promoted: None,
            notifications: Vec::new(),
        }
    }

    /// Notifications to send. The subject's own notice can be suppressed;
    /// a promoted attendee is always told.
    pub fn outbound(&self, notify_subject: bool) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|item| notify_subject || item.recipient != self.subject)
            .cloned()
            .collect()
    }

    fn notify_subject(&mut self, kind: NotificationKind) {
        self.notifications.push(Notification {
            recipient: self.subject.clone(),
            kind,
        });
    }

    /// Runs one promotion check against the snapshot with this plan's
    /// changes applied.
    fn promote_after(&mut self, event: &Event, records: &[AttendanceRecord], now: DateTime<Utc>) {
        let mut projected = records.to_vec();
        apply_changes(&mut projected, &self.changes);
        let Some(candidate) = next_promotion(event, &projected, &self.subject) else {
            return;
        };
        let promoted = candidate.with_status(AttendanceStatus::Yes, now);
        self.changes.push(AttendanceChange::Upsert(promoted.clone()));
        self.notifications.push(Notification {
            recipient: promoted.user_id.clone(),
            kind: NotificationKind::WaitlistPromoted,
        });
        self.promoted = Some(promoted);
    }
}

/// Several planned steps committed together. Each step is planned against
/// the snapshot with the earlier steps applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    pub changes: Vec<AttendanceChange>,
    pub promoted: Vec<AttendanceRecord>,
    pub notifications: Vec<Notification>,
}

impl BatchPlan {
    /// Folds one step into the batch. A user promoted by an earlier step and
    /// changed again by this one is no longer reported as promoted, and the
    /// promotion notice is withdrawn.
    pub fn absorb(&mut self, plan: &TransitionPlan, notify_subject: bool) {
        if plan.changes.is_empty() {
            return;
        }
        let before = self.promoted.len();
        self.promoted.retain(|record| record.user_id != plan.subject);
        if self.promoted.len() != before {
            self.notifications.retain(|item| {
                !(item.recipient == plan.subject && item.kind == NotificationKind::WaitlistPromoted)
            });
        }
        self.changes.extend(plan.changes.iter().cloned());
        self.notifications.extend(plan.outbound(notify_subject));
        if let Some(record) = &plan.promoted {
            self.promoted.push(record.clone());
        }
    }
}

pub fn find_record<'a>(records: &'a [AttendanceRecord], user_id: &UserId) -> Option<&'a AttendanceRecord> {
    records.iter().find(|record| record.user_id == *user_id)
}

pub fn attending_count(records: &[AttendanceRecord]) -> u32 {
    AttendanceCounts::tally(records).yes
}

/// The earliest waitlisted record, if the event has a free confirmed seat.
/// `exclude` is never chosen: it is the attendee whose change freed the seat.
pub fn next_promotion<'a>(
    event: &Event,
    records: &'a [AttendanceRecord],
    exclude: &UserId,
) -> Option<&'a AttendanceRecord> {
    let capacity = event.max_attendees?;
    if attending_count(records) >= capacity {
        return None;
    }
    // min_by_key keeps the first of equal keys, so snapshot order breaks ties.
    records
        .iter()
        .filter(|record| record.status == AttendanceStatus::Waitlist && record.user_id != *exclude)
        .min_by_key(|record| record.created_at)
}

/// Status granted for a request. A confirmed attendee asking for Yes again
/// keeps the seat even if the event is now over capacity; anyone else asking
/// for Yes on a full event is waitlisted.
fn seat_for(
    event: &Event,
    records: &[AttendanceRecord],
    previous: Option<AttendanceStatus>,
    requested: AttendanceStatus,
) -> AttendanceStatus {
    if requested != AttendanceStatus::Yes || previous == Some(AttendanceStatus::Yes) {
        return requested;
    }
    if event.is_full(attending_count(records)) {
        AttendanceStatus::Waitlist
    } else {
        AttendanceStatus::Yes
    }
}

/// Self-service RSVP. Yes on a full event lands on the waitlist instead of
/// failing; an empty request cancels.
pub fn plan_self_rsvp(
    event: &Event,
    records: &[AttendanceRecord],
    user_id: &UserId,
    request: RsvpRequest,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, AttendanceError> {
    if event.is_host(user_id) {
        return Err(AttendanceError::HostSelfRsvp);
    }
    let existing = find_record(records, user_id);

    let requested = match request {
        RsvpRequest::Cancel => {
            let existing = existing.ok_or(AttendanceError::RecordNotFound)?;
            return Ok(plan_delete(event, records, existing, now));
        }
        RsvpRequest::Attend(status) => status,
    };

    let previous = existing.map(|record| record.status);
    let resulting = seat_for(event, records, previous, requested);

    let record = match existing {
        Some(record) => AttendanceRecord {
            status: resulting,
            notes: notes.or_else(|| record.notes.clone()),
            updated_at: now,
            ..record.clone()
        },
        None => AttendanceRecord::new(event.id, user_id.clone(), resulting, notes, now),
    };

    let mut plan = TransitionPlan::new(user_id, previous);
    plan.changes.push(AttendanceChange::Upsert(record));
    plan.resulting = Some(resulting);
    plan.waitlisted = requested == AttendanceStatus::Yes && resulting == AttendanceStatus::Waitlist;
    match previous {
        None => plan.notify_subject(NotificationKind::RsvpConfirmed { status: resulting }),
        Some(prev) if prev != resulting => plan.notify_subject(NotificationKind::StatusChanged {
            status: Some(resulting),
        }),
        Some(_) => {}
    }
    if previous == Some(AttendanceStatus::Yes) && resulting != AttendanceStatus::Yes {
        plan.promote_after(event, records, now);
    }
    Ok(plan)
}

/// Privileged status change. Unlike self-service, Yes on a full event is an
/// error so the caller must choose the waitlist explicitly.
pub fn plan_admin_move(
    event: &Event,
    records: &[AttendanceRecord],
    target: &UserId,
    new_status: AttendanceStatus,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, AttendanceError> {
    let existing = find_record(records, target).ok_or(AttendanceError::RecordNotFound)?;

    if new_status == AttendanceStatus::Yes && existing.status != AttendanceStatus::Yes {
        let attending = attending_count(records);
        if let Some(capacity) = event.max_attendees {
            if attending >= capacity {
                return Err(AttendanceError::CapacityExceeded {
                    attending,
                    capacity,
                });
            }
        }
    }

    let mut plan = TransitionPlan::new(target, Some(existing.status));
    plan.changes
        .push(AttendanceChange::Upsert(existing.with_status(new_status, now)));
    plan.resulting = Some(new_status);
    plan.notify_subject(NotificationKind::StatusChanged {
        status: Some(new_status),
    });
    if existing.status == AttendanceStatus::Yes && new_status != AttendanceStatus::Yes {
        plan.promote_after(event, records, now);
    }
    Ok(plan)
}

/// Privileged bulk status assignment. Creates the record when missing, sends
/// Yes to the waitlist when the event is full and never demotes a confirmed
/// attendee. Hosts cannot hold an RSVP on their own event.
pub fn plan_admin_set(
    event: &Event,
    records: &[AttendanceRecord],
    target: &UserId,
    requested: AttendanceStatus,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, AttendanceError> {
    if event.is_host(target) {
        return Err(AttendanceError::HostSelfRsvp);
    }
    let existing = find_record(records, target);
    let previous = existing.map(|record| record.status);
    let resulting = seat_for(event, records, previous, requested);

    let mut plan = TransitionPlan::new(target, previous);
    plan.resulting = Some(resulting);
    plan.waitlisted = requested == AttendanceStatus::Yes && resulting == AttendanceStatus::Waitlist;
    match existing {
        Some(record) if record.status == resulting => return Ok(plan),
        Some(record) => {
            plan.changes
                .push(AttendanceChange::Upsert(record.with_status(resulting, now)));
            plan.notify_subject(NotificationKind::StatusChanged {
                status: Some(resulting),
            });
        }
        None => {
            plan.changes.push(AttendanceChange::Upsert(AttendanceRecord::new(
                event.id,
                target.clone(),
                resulting,
                None,
                now,
            )));
            plan.notify_subject(NotificationKind::RsvpConfirmed { status: resulting });
        }
    }
    if previous == Some(AttendanceStatus::Yes) && resulting != AttendanceStatus::Yes {
        plan.promote_after(event, records, now);
    }
    Ok(plan)
}

/// Privileged deletion of another user's record.
pub fn plan_removal(
    event: &Event,
    records: &[AttendanceRecord],
    target: &UserId,
    now: DateTime<Utc>,
) -> Result<TransitionPlan, AttendanceError> {
    let existing = find_record(records, target).ok_or(AttendanceError::RecordNotFound)?;
    Ok(plan_delete(event, records, existing, now))
}

fn plan_delete(
    event: &Event,
    records: &[AttendanceRecord],
    existing: &AttendanceRecord,
    now: DateTime<Utc>,
) -> TransitionPlan {
    let mut plan = TransitionPlan::new(&existing.user_id, Some(existing.status));
    plan.changes.push(AttendanceChange::Remove {
        event_id: existing.event_id,
        user_id: existing.user_id.clone(),
    });
    plan.notify_subject(NotificationKind::StatusChanged { status: None });
    if existing.status == AttendanceStatus::Yes {
        plan.promote_after(event, records, now);
    }
    plan
}

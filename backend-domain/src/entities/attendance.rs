// Attendance entity
// One record per (event, user); created on first RSVP, deleted on cancellation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{AttendanceStatus, EventId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Set once; defines waitlist order.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(
        event_id: EventId,
        user_id: UserId,
        status: AttendanceStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id,
            user_id,
            status,
            notes,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(&self, status: AttendanceStatus, now: DateTime<Utc>) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// A single write against the attendance table. An operation's changes
/// are committed together or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceChange {
    Upsert(AttendanceRecord),
    Remove { event_id: EventId, user_id: UserId },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub yes: u32,
    pub no: u32,
    pub maybe: u32,
    pub waitlist: u32,
}

impl AttendanceCounts {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.status {
                AttendanceStatus::Yes => counts.yes += 1,
                AttendanceStatus::No => counts.no += 1,
                AttendanceStatus::Maybe => counts.maybe += 1,
                AttendanceStatus::Waitlist => counts.waitlist += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> u32 {
        self.yes + self.no + self.maybe + self.waitlist
    }
}

/// Applies `changes` to an in-memory snapshot, keeping insertion order.
pub fn apply_changes(records: &mut Vec<AttendanceRecord>, changes: &[AttendanceChange]) {
    for change in changes {
        match change {
            AttendanceChange::Upsert(record) => {
                match records.iter_mut().find(|existing| {
                    existing.event_id == record.event_id && existing.user_id == record.user_id
                }) {
                    Some(existing) => *existing = record.clone(),
                    None => records.push(record.clone()),
                }
            }
            AttendanceChange::Remove { event_id, user_id } => {
                records.retain(|existing| {
                    !(existing.event_id == *event_id && existing.user_id == *user_id)
                });
            }
        }
    }
}

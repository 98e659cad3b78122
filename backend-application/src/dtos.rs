// Request and response shapes for the attendance use cases

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use backend_domain::{
    AttendanceCounts, AttendanceRecord, AttendanceStatus, EventId, RosterEntry, User, UserId,
};

fn default_notify() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RsvpPayload {
    /// `yes`, `no` or `maybe`; empty or absent cancels.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveStatusPayload {
    pub status: String,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovePayload {
    #[serde(default = "default_notify")]
    pub notify: bool,
}

impl Default for RemovePayload {
    fn default() -> Self {
        Self { notify: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkRemovePayload {
    pub user_ids: Vec<UserId>,
    #[serde(default = "default_notify")]
    pub notify: bool,
}

/// A user id, optionally paired with its own notify flag:
/// `"google_1"` or `{"user_id": "google_1", "notify": false}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttendeeEntry {
    Plain(UserId),
    Detailed {
        user_id: UserId,
        #[serde(default = "default_notify")]
        notify: bool,
    },
}

impl AttendeeEntry {
    pub fn user_id(&self) -> &UserId {
        match self {
            AttendeeEntry::Plain(user_id) => user_id,
            AttendeeEntry::Detailed { user_id, .. } => user_id,
        }
    }

    pub fn notify(&self) -> bool {
        match self {
            AttendeeEntry::Plain(_) => true,
            AttendeeEntry::Detailed { notify, .. } => *notify,
        }
    }
}

/// Applied in the order no, yes, maybe.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SetAttendancePayload {
    pub yes: Vec<AttendeeEntry>,
    pub no: Vec<AttendeeEntry>,
    pub maybe: Vec<AttendeeEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoShowPayload {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromotedUser {
    pub user_id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceOutcome {
    pub event_id: EventId,
    pub user_id: UserId,
    /// None once the record is gone.
    pub status: Option<AttendanceStatus>,
    pub waitlisted: bool,
    pub message: String,
    pub counts: AttendanceCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<PromotedUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkRemovalOutcome {
    pub event_id: EventId,
    pub removed: Vec<UserId>,
    pub skipped: Vec<UserId>,
    pub promoted: Vec<PromotedUser>,
    pub message: String,
    pub counts: AttendanceCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub user_id: UserId,
    pub previous: Option<AttendanceStatus>,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkUpdateOutcome {
    pub event_id: EventId,
    pub updated: Vec<StatusUpdate>,
    /// Asked for Yes but placed on the waitlist.
    pub waitlisted: Vec<UserId>,
    /// Hosts of the event, who cannot hold an RSVP.
    pub skipped: Vec<UserId>,
    pub promoted: Vec<PromotedUser>,
    pub message: String,
    pub counts: AttendanceCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceSummary {
    pub event_id: EventId,
    pub counts: AttendanceCounts,
    pub max_attendees: Option<u32>,
    pub attendees: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterMember {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RosterMember {
    pub fn new(record: &AttendanceRecord, user: Option<&User>) -> Self {
        Self {
            user_id: record.user_id.clone(),
            name: user
                .map(|user| user.name.clone())
                .unwrap_or_else(|| record.user_id.to_string()),
            email: user.map(|user| user.email.clone()).unwrap_or_default(),
            notes: record.notes.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagementRoster {
    pub event_id: EventId,
    pub counts: AttendanceCounts,
    pub max_attendees: Option<u32>,
    pub yes: Vec<RosterMember>,
    pub maybe: Vec<RosterMember>,
    pub waitlist: Vec<RosterMember>,
    pub no: Vec<RosterMember>,
    pub organizer_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub co_host_id: Option<UserId>,
    pub event_has_started: bool,
    pub event_has_passed: bool,
    /// Marked for this event; empty until it starts.
    pub no_show_user_ids: Vec<UserId>,
    /// Lifetime marks per listed user; empty once the event has passed.
    pub no_show_counts: HashMap<UserId, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoShowOutcome {
    pub event_id: EventId,
    pub user_id: UserId,
    pub marked: bool,
    pub message: String,
}

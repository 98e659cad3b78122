// Notification entity

use serde::{Deserialize, Serialize};

use crate::entities::{Event, User};
use crate::value_objects::{AttendanceStatus, EventId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationKind {
    /// First RSVP for this event.
    RsvpConfirmed { status: AttendanceStatus },
    /// Existing RSVP moved; `None` means the record was removed.
    StatusChanged { status: Option<AttendanceStatus> },
    WaitlistPromoted,
    EventReminder,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::RsvpConfirmed { .. } => "rsvp_confirmed",
            NotificationKind::StatusChanged { .. } => "status_changed",
            NotificationKind::WaitlistPromoted => "waitlist_promoted",
            NotificationKind::EventReminder => "event_reminder",
        }
    }
}

/// Planned by the attendance policy before recipients are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: UserId,
    pub kind: NotificationKind,
}

/// Ready to deliver: recipient and event are fully loaded.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundNotification {
    pub recipient: User,
    pub event: Event,
    pub kind: NotificationKind,
}

/// One delivery attempt series for a single recipient.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationDeliveryRecord {
    pub delivery_id: String,
    pub timestamp_ms: i64,
    pub status: String,
    pub mode: String,
    pub attempts: u8,
    pub recipient: UserId,
    pub event_id: EventId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// Event entity
// Events are created elsewhere; attendance reads capacity, timing and hosts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{EventId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<u32>,
    pub organizer_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_host_id: Option<UserId>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Event {
    pub fn is_host(&self, user_id: &UserId) -> bool {
        self.organizer_id == *user_id || self.co_host_id.as_ref() == Some(user_id)
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        now > self.ends_at.unwrap_or(self.starts_at)
    }

    /// Whether `attending` confirmed seats leave no room for another.
    pub fn is_full(&self, attending: u32) -> bool {
        self.max_attendees
            .map(|capacity| attending >= capacity)
            .unwrap_or(false)
    }
}

// No-show entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{EventId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoShowRecord {
    pub event_id: EventId,
    pub user_id: UserId,
    pub marked_at: DateTime<Utc>,
    pub marked_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

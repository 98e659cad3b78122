use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AttendanceChange, AttendanceRecord, Directory, Event, NoShowRecord, User};
use crate::value_objects::{EventId, UserId};

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn find_event(&self, event_id: EventId) -> anyhow::Result<Option<Event>>;
    /// Active events whose start falls in `[from, to)`.
    async fn list_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Event>>;
    async fn save_event(&self, event: &Event) -> anyhow::Result<()>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, user_id: &UserId) -> anyhow::Result<Option<User>>;
    async fn find_users(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, User>>;
    async fn save_user(&self, user: &User) -> anyhow::Result<()>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// All records of the event, oldest `created_at` first; ties keep
    /// insertion order.
    async fn list_for_event(&self, event_id: EventId) -> anyhow::Result<Vec<AttendanceRecord>>;
    async fn find_record(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> anyhow::Result<Option<AttendanceRecord>>;
    /// Commits every change in one transaction. On error nothing is written.
    async fn apply_changes(&self, changes: &[AttendanceChange]) -> anyhow::Result<()>;
}

#[async_trait]
pub trait NoShowRepository: Send + Sync {
    async fn list_for_event(&self, event_id: EventId) -> anyhow::Result<Vec<NoShowRecord>>;
    async fn count_by_user(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, u64>>;
    /// Returns false when the pair is already marked.
    async fn insert(&self, record: &NoShowRecord) -> anyhow::Result<bool>;
    /// Returns false when there was nothing to delete.
    async fn delete(&self, event_id: EventId, user_id: &UserId) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn load_directory(&self, path: &str) -> anyhow::Result<Directory>;
}

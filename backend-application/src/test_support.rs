// In-memory ports for application tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use backend_domain::ports::{
    AttendanceRepository, EventRepository, NoShowRepository, NotificationService, UserRepository,
};
use backend_domain::{
    apply_changes, AttendanceChange, AttendanceRecord, AttendanceStatus, Event, EventId,
    NoShowRecord, NotificationDeliveryRecord, OutboundNotification, RuntimeConfig, User, UserId,
    UserRole,
};

use crate::ops::EventLocks;
use crate::{AppState, Metrics};

#[derive(Default)]
struct StoreData {
    events: HashMap<EventId, Event>,
    users: HashMap<UserId, User>,
    /// Insertion ordered, like rowid order in the real table.
    attendance: Vec<AttendanceRecord>,
    no_shows: Vec<NoShowRecord>,
    fail_writes: bool,
}

#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn add_event(&self, event: Event) {
        self.data.lock().unwrap().events.insert(event.id, event);
    }

    pub fn add_user(&self, user: User) {
        self.data.lock().unwrap().users.insert(user.id.clone(), user);
    }

    pub fn put_record(&self, event_id: i64, user: &str, status: AttendanceStatus, minute: i64) {
        let record = AttendanceRecord::new(
            EventId(event_id),
            UserId::from(user),
            status,
            None,
            base_time() + Duration::minutes(minute),
        );
        let mut data = self.data.lock().unwrap();
        apply_changes(&mut data.attendance, &[AttendanceChange::Upsert(record)]);
    }

    pub fn put_no_show(&self, record: NoShowRecord) {
        self.data.lock().unwrap().no_shows.push(record);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.data.lock().unwrap().fail_writes = fail;
    }

    pub fn status_of(&self, event_id: i64, user: &str) -> Option<AttendanceStatus> {
        let data = self.data.lock().unwrap();
        data.attendance
            .iter()
            .find(|record| record.event_id == EventId(event_id) && record.user_id.as_str() == user)
            .map(|record| record.status)
    }

    pub fn record_count(&self, event_id: i64) -> usize {
        let data = self.data.lock().unwrap();
        data.attendance
            .iter()
            .filter(|record| record.event_id == EventId(event_id))
            .count()
    }

    pub fn count_with(&self, event_id: i64, status: AttendanceStatus) -> usize {
        let data = self.data.lock().unwrap();
        data.attendance
            .iter()
            .filter(|record| record.event_id == EventId(event_id) && record.status == status)
            .count()
    }
}

#[async_trait]
impl EventRepository for InMemoryStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn find_event(&self, event_id: EventId) -> anyhow::Result<Option<Event>> {
        Ok(self.data.lock().unwrap().events.get(&event_id).cloned())
    }

    async fn list_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<Event>> {
        let data = self.data.lock().unwrap();
        let mut events = data
            .events
            .values()
            .filter(|event| event.is_active && event.starts_at >= from && event.starts_at < to)
            .cloned()
            .collect::<Vec<_>>();
        events.sort_by_key(|event| (event.starts_at, event.id));
        Ok(events)
    }

    async fn save_event(&self, event: &Event) -> anyhow::Result<()> {
        self.add_event(event.clone());
        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, user_id: &UserId) -> anyhow::Result<Option<User>> {
        Ok(self.data.lock().unwrap().users.get(user_id).cloned())
    }

    async fn find_users(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, User>> {
        let data = self.data.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| data.users.get(id).map(|user| (id.clone(), user.clone())))
            .collect())
    }

    async fn save_user(&self, user: &User) -> anyhow::Result<()> {
        self.add_user(user.clone());
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for InMemoryStore {
    async fn list_for_event(&self, event_id: EventId) -> anyhow::Result<Vec<AttendanceRecord>> {
        let data = self.data.lock().unwrap();
        let mut records = data
            .attendance
            .iter()
            .filter(|record| record.event_id == event_id)
            .cloned()
            .collect::<Vec<_>>();
        // Stable sort keeps insertion order for equal timestamps.
        records.sort_by_key(|record| record.created_at);
        Ok(records)
    }

    async fn find_record(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> anyhow::Result<Option<AttendanceRecord>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .attendance
            .iter()
            .find(|record| record.event_id == event_id && record.user_id == *user_id)
            .cloned())
    }

    async fn apply_changes(&self, changes: &[AttendanceChange]) -> anyhow::Result<()> {
        let mut data = self.data.lock().unwrap();
        if data.fail_writes {
            return Err(anyhow!("disk full"));
        }
        apply_changes(&mut data.attendance, changes);
        Ok(())
    }
}

#[async_trait]
impl NoShowRepository for InMemoryStore {
    async fn list_for_event(&self, event_id: EventId) -> anyhow::Result<Vec<NoShowRecord>> {
        let data = self.data.lock().unwrap();
        Ok(data
            .no_shows
            .iter()
            .filter(|record| record.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn count_by_user(&self, user_ids: &[UserId]) -> anyhow::Result<HashMap<UserId, u64>> {
        let data = self.data.lock().unwrap();
        let mut counts = HashMap::new();
        for record in data.no_shows.iter() {
            if user_ids.contains(&record.user_id) {
                *counts.entry(record.user_id.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn insert(&self, record: &NoShowRecord) -> anyhow::Result<bool> {
        let mut data = self.data.lock().unwrap();
        let exists = data
            .no_shows
            .iter()
            .any(|item| item.event_id == record.event_id && item.user_id == record.user_id);
        if exists {
            return Ok(false);
        }
        data.no_shows.push(record.clone());
        Ok(true)
    }

    async fn delete(&self, event_id: EventId, user_id: &UserId) -> anyhow::Result<bool> {
        let mut data = self.data.lock().unwrap();
        let before = data.no_shows.len();
        data.no_shows
            .retain(|item| !(item.event_id == event_id && item.user_id == *user_id));
        Ok(data.no_shows.len() != before)
    }
}

/// Records every batch synchronously instead of delivering it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutboundNotification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<OutboundNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    fn spawn_notifications(&self, _config: RuntimeConfig, notifications: Vec<OutboundNotification>) {
        self.sent.lock().unwrap().extend(notifications);
    }

    async fn check_notify_target(&self, _config: &RuntimeConfig) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_deliveries(&self, _limit: usize) -> Vec<NotificationDeliveryRecord> {
        Vec::new()
    }

    async fn last_delivery(&self) -> Option<NotificationDeliveryRecord> {
        None
    }
}

pub struct Harness {
    pub state: AppState,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let state = AppState {
        config: RuntimeConfig::default(),
        event_repo: store.clone(),
        user_repo: store.clone(),
        attendance_repo: store.clone(),
        no_show_repo: store.clone(),
        notification_service: notifier.clone(),
        event_locks: Arc::new(EventLocks::default()),
        metrics: Arc::new(Metrics::default()),
    };
    Harness {
        state,
        store,
        notifier,
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub fn member(id: &str, role: UserRole) -> User {
    User {
        id: UserId::from(id),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
        role,
    }
}

pub fn event_at(id: i64, starts_at: DateTime<Utc>) -> Event {
    Event {
        id: EventId(id),
        title: format!("Event {id}"),
        starts_at,
        ends_at: None,
        max_attendees: None,
        organizer_id: UserId::from("host"),
        co_host_id: Some(UserId::from("cohost")),
        is_active: true,
    }
}

pub fn future_event(id: i64, max_attendees: Option<u32>) -> Event {
    Event {
        max_attendees,
        ..event_at(id, Utc::now() + Duration::days(7))
    }
}

/// Started two hours ago with no explicit end, so it has also passed.
pub fn started_event(id: i64) -> Event {
    event_at(id, Utc::now() - Duration::hours(2))
}

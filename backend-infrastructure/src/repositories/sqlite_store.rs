use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};

use backend_domain::ports::{
    AttendanceRepository, EventRepository, NoShowRepository, UserRepository,
};
use backend_domain::{
    millis_to_utc, AttendanceChange, AttendanceRecord, AttendanceStatus, DbConfig, Event, EventId,
    NoShowRecord, User, UserId, UserRole,
};

const SCHEMA: [&str; 5] = [
    r#"
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    starts_at INTEGER NOT NULL,
    ends_at INTEGER,
    max_attendees INTEGER CHECK (max_attendees IS NULL OR max_attendees >= 0),
    organizer_id TEXT NOT NULL,
    co_host_id TEXT,
    is_active INTEGER NOT NULL DEFAULT 1
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS attendance (
    event_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    status TEXT NOT NULL,
    notes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (event_id, user_id)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS no_shows (
    event_id INTEGER NOT NULL,
    user_id TEXT NOT NULL,
    marked_at INTEGER NOT NULL,
    marked_by TEXT NOT NULL,
    notes TEXT,
    PRIMARY KEY (event_id, user_id)
)
"#,
    "CREATE INDEX IF NOT EXISTS idx_events_starts_at ON events(starts_at)",
];

/// SQLite-backed storage for every repository port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        // Each in-memory connection is its own database.
        let in_memory = config.database_url.contains(":memory:");
        let max_connections = if in_memory { 1 } else { config.max_connections.max(1) };
        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }
        let pool = options.connect(&config.database_url).await?;
        Ok(Self { pool })
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: EventId(row.try_get("id")?),
        title: row.try_get("title")?,
        starts_at: millis_to_utc(row.try_get("starts_at")?),
        ends_at: row
            .try_get::<Option<i64>, _>("ends_at")?
            .map(millis_to_utc),
        max_attendees: row
            .try_get::<Option<i64>, _>("max_attendees")?
            .and_then(|value| u32::try_from(value).ok()),
        organizer_id: UserId(row.try_get("organizer_id")?),
        co_host_id: row.try_get::<Option<String>, _>("co_host_id")?.map(UserId),
        is_active: row.try_get("is_active")?,
    })
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: UserId(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        role: UserRole::from(role.as_str()),
    })
}

fn attendance_from_row(row: &SqliteRow) -> Result<AttendanceRecord> {
    let status: String = row.try_get("status")?;
    Ok(AttendanceRecord {
        event_id: EventId(row.try_get("event_id")?),
        user_id: UserId(row.try_get("user_id")?),
        status: AttendanceStatus::parse(&status)?,
        notes: row.try_get("notes")?,
        created_at: millis_to_utc(row.try_get("created_at")?),
        updated_at: millis_to_utc(row.try_get("updated_at")?),
    })
}

fn no_show_from_row(row: &SqliteRow) -> Result<NoShowRecord> {
    Ok(NoShowRecord {
        event_id: EventId(row.try_get("event_id")?),
        user_id: UserId(row.try_get("user_id")?),
        marked_at: millis_to_utc(row.try_get("marked_at")?),
        marked_by: UserId(row.try_get("marked_by")?),
        notes: row.try_get("notes")?,
    })
}

#[async_trait]
impl EventRepository for SqliteStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn find_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(
            "SELECT id, title, starts_at, ends_at, max_attendees, organizer_id, co_host_id, is_active \
             FROM events WHERE id = ?",
        )
        .bind(event_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_events_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT id, title, starts_at, ends_at, max_attendees, organizer_id, co_host_id, is_active \
             FROM events WHERE is_active = 1 AND starts_at >= ? AND starts_at < ? \
             ORDER BY starts_at, id",
        )
        .bind(from.timestamp_millis())
        .bind(to.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(event_from_row).collect()
    }

    async fn save_event(&self, event: &Event) -> Result<()> {
        sqlx::query(
            "INSERT INTO events (id, title, starts_at, ends_at, max_attendees, organizer_id, co_host_id, is_active) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET title = excluded.title, starts_at = excluded.starts_at, \
             ends_at = excluded.ends_at, max_attendees = excluded.max_attendees, \
             organizer_id = excluded.organizer_id, co_host_id = excluded.co_host_id, \
             is_active = excluded.is_active",
        )
        .bind(event.id.0)
        .bind(&event.title)
        .bind(event.starts_at.timestamp_millis())
        .bind(event.ends_at.map(|value| value.timestamp_millis()))
        .bind(event.max_attendees.map(i64::from))
        .bind(event.organizer_id.as_str())
        .bind(event.co_host_id.as_ref().map(|id| id.as_str()))
        .bind(event.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, name, email, role FROM users WHERE id = ?")
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_users(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, User>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT id, name, email, role FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for user_id in user_ids {
            separated.push_bind(user_id.0.clone());
        }
        separated.push_unseparated(")");
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| user_from_row(row).map(|user| (user.id.clone(), user)))
            .collect()
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, name, email, role) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email, \
             role = excluded.role",
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AttendanceRepository for SqliteStore {
    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query(
            "SELECT event_id, user_id, status, notes, created_at, updated_at \
             FROM attendance WHERE event_id = ? ORDER BY created_at, rowid",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(attendance_from_row).collect()
    }

    async fn find_record(&self, event_id: EventId, user_id: &UserId) -> Result<Option<AttendanceRecord>> {
        let row = sqlx::query(
            "SELECT event_id, user_id, status, notes, created_at, updated_at \
             FROM attendance WHERE event_id = ? AND user_id = ?",
        )
        .bind(event_id.0)
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(attendance_from_row).transpose()
    }

    async fn apply_changes(&self, changes: &[AttendanceChange]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for change in changes {
            match change {
                // created_at is only written on insert.
                AttendanceChange::Upsert(record) => {
                    sqlx::query(
                        "INSERT INTO attendance (event_id, user_id, status, notes, created_at, updated_at) \
                         VALUES (?, ?, ?, ?, ?, ?) \
                         ON CONFLICT(event_id, user_id) DO UPDATE SET status = excluded.status, \
                         notes = excluded.notes, updated_at = excluded.updated_at",
                    )
                    .bind(record.event_id.0)
                    .bind(record.user_id.as_str())
                    .bind(record.status.as_str())
                    .bind(record.notes.as_deref())
                    .bind(record.created_at.timestamp_millis())
                    .bind(record.updated_at.timestamp_millis())
                    .execute(&mut *tx)
                    .await?;
                }
                AttendanceChange::Remove { event_id, user_id } => {
                    sqlx::query("DELETE FROM attendance WHERE event_id = ? AND user_id = ?")
                        .bind(event_id.0)
                        .bind(user_id.as_str())
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl NoShowRepository for SqliteStore {
    async fn list_for_event(&self, event_id: EventId) -> Result<Vec<NoShowRecord>> {
        let rows = sqlx::query(
            "SELECT event_id, user_id, marked_at, marked_by, notes \
             FROM no_shows WHERE event_id = ? ORDER BY marked_at, rowid",
        )
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(no_show_from_row).collect()
    }

    async fn count_by_user(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, u64>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT user_id, COUNT(*) AS total FROM no_shows WHERE user_id IN (",
        );
        let mut separated = builder.separated(", ");
        for user_id in user_ids {
            separated.push_bind(user_id.0.clone());
        }
        separated.push_unseparated(") GROUP BY user_id");
        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut counts = HashMap::new();
        for row in rows.iter() {
            let user_id: String = row.try_get("user_id")?;
            let total: i64 = row.try_get("total")?;
            counts.insert(UserId(user_id), total.max(0) as u64);
        }
        Ok(counts)
    }

    async fn insert(&self, record: &NoShowRecord) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO no_shows (event_id, user_id, marked_at, marked_by, notes) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(record.event_id.0)
        .bind(record.user_id.as_str())
        .bind(record.marked_at.timestamp_millis())
        .bind(record.marked_by.as_str())
        .bind(record.notes.as_deref())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, event_id: EventId, user_id: &UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM no_shows WHERE event_id = ? AND user_id = ?")
            .bind(event_id.0)
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

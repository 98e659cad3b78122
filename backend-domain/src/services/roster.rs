use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::{AttendanceRecord, Event, User};
use crate::value_objects::{AttendanceStatus, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RosterStatus {
    Yes,
    Maybe,
    Waitlist,
    No,
    CoHost,
    Host,
}

impl RosterStatus {
    fn priority(&self) -> u8 {
        match self {
            RosterStatus::Yes => 0,
            RosterStatus::Maybe => 1,
            RosterStatus::Waitlist => 2,
            RosterStatus::No => 3,
            RosterStatus::CoHost => 4,
            RosterStatus::Host => 5,
        }
    }
}

impl From<AttendanceStatus> for RosterStatus {
    fn from(status: AttendanceStatus) -> Self {
        match status {
            AttendanceStatus::Yes => RosterStatus::Yes,
            AttendanceStatus::Maybe => RosterStatus::Maybe,
            AttendanceStatus::Waitlist => RosterStatus::Waitlist,
            AttendanceStatus::No => RosterStatus::No,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub name: String,
    pub status: RosterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

/// Everyone connected to the event in one list. Hosts always appear under
/// their host role; any RSVP they hold is hidden.
pub fn consolidate(
    event: &Event,
    records: &[AttendanceRecord],
    users: &HashMap<UserId, User>,
) -> Vec<RosterEntry> {
    let display_name = |user_id: &UserId| {
        users
            .get(user_id)
            .map(|user| user.name.clone())
            .unwrap_or_else(|| user_id.to_string())
    };

    let mut entries = records
        .iter()
        .filter(|record| !event.is_host(&record.user_id))
        .map(|record| RosterEntry {
            user_id: record.user_id.clone(),
            name: display_name(&record.user_id),
            status: record.status.into(),
            responded_at: Some(record.created_at),
        })
        .collect::<Vec<_>>();

    entries.push(RosterEntry {
        user_id: event.organizer_id.clone(),
        name: display_name(&event.organizer_id),
        status: RosterStatus::Host,
        responded_at: None,
    });
    if let Some(co_host) = &event.co_host_id {
        entries.push(RosterEntry {
            user_id: co_host.clone(),
            name: display_name(co_host),
            status: RosterStatus::CoHost,
            responded_at: None,
        });
    }

    entries.sort_by_cached_key(|entry| {
        let (first, rest) = split_name(&entry.name);
        (entry.status.priority(), first, rest)
    });
    entries
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or("").to_lowercase();
    let rest = parts.collect::<Vec<_>>().join(" ").to_lowercase();
    (first, rest)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::value_objects::{EventId, UserRole};

    fn user(id: &str, name: &str) -> (UserId, User) {
        (
            UserId::from(id),
            User {
                id: UserId::from(id),
                name: name.to_string(),
                email: format!("{id}@example.org"),
                role: UserRole::Approved,
            },
        )
    }

    fn record(user: &str, status: AttendanceStatus, minute: u32) -> AttendanceRecord {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, minute, 0).unwrap();
        AttendanceRecord::new(EventId(1), UserId::from(user), status, None, now)
    }

    #[test]
    fn consolidated_list_orders_by_status_then_name() {
        let event = Event {
            id: EventId(1),
            title: "Walk".to_string(),
            starts_at: Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap(),
            ends_at: None,
            max_attendees: Some(10),
            organizer_id: UserId::from("h"),
            co_host_id: Some(UserId::from("c")),
            is_active: true,
        };
        let users = HashMap::from([
            user("h", "Hana Host"),
            user("c", "Cleo Cohost"),
            user("z", "zed Adams"),
            user("a", "Zed Brown"),
            user("m", "Mia Maybe"),
            user("n", "Ned No"),
        ]);
        let records = vec![
            record("z", AttendanceStatus::Yes, 0),
            record("n", AttendanceStatus::No, 1),
            record("a", AttendanceStatus::Yes, 2),
            record("m", AttendanceStatus::Maybe, 3),
            record("h", AttendanceStatus::Yes, 4),
        ];

        let roster = consolidate(&event, &records, &users);
        let order = roster
            .iter()
            .map(|entry| (entry.user_id.as_str(), entry.status))
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                ("z", RosterStatus::Yes),
                ("a", RosterStatus::Yes),
                ("m", RosterStatus::Maybe),
                ("n", RosterStatus::No),
                ("c", RosterStatus::CoHost),
                ("h", RosterStatus::Host),
            ]
        );
    }
}

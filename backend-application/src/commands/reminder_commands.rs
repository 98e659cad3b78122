use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use tracing::info;

use backend_domain::{AttendanceStatus, Notification, NotificationKind};

use crate::lookups::{dispatch, load_records, storage_error};
use crate::{AppError, AppState};

/// Reminds Yes and Waitlist attendees of every active event starting on the
/// UTC calendar day of `now`. Returns how many reminders were queued.
pub async fn send_event_reminders(state: &AppState, now: DateTime<Utc>) -> Result<usize, AppError> {
    let day_start = Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN));
    let day_end = day_start + Duration::days(1);
    let events = state
        .event_repo
        .list_events_starting_between(day_start, day_end)
        .await
        .map_err(|err| storage_error("list today's events", err))?;

    let mut total = 0;
    for event in events.iter().filter(|event| event.is_active) {
        let records = load_records(state, event.id).await?;
        let notifications = records
            .into_iter()
            .filter(|record| {
                matches!(record.status, AttendanceStatus::Yes | AttendanceStatus::Waitlist)
            })
            .map(|record| Notification {
                recipient: record.user_id,
                kind: NotificationKind::EventReminder,
            })
            .collect::<Vec<_>>();
        if notifications.is_empty() {
            continue;
        }
        info!("event={} sending {} reminders", event.id, notifications.len());
        total += notifications.len();
        dispatch(state, event, notifications).await;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use backend_domain::{EventId, UserRole};

    use super::*;
    use crate::test_support::{event_at, harness, member};

    #[tokio::test]
    async fn reminds_yes_and_waitlist_for_todays_events() {
        let h = harness();
        let now = Utc.with_ymd_and_hms(2026, 6, 10, 9, 0, 0).unwrap();
        h.store
            .add_event(event_at(1, Utc.with_ymd_and_hms(2026, 6, 10, 19, 0, 0).unwrap()));
        h.store
            .add_event(event_at(2, Utc.with_ymd_and_hms(2026, 6, 11, 19, 0, 0).unwrap()));
        for id in ["a", "b", "c", "d"] {
            h.store.add_user(member(id, UserRole::Approved));
        }
        h.store.put_record(1, "a", AttendanceStatus::Yes, 0);
        h.store.put_record(1, "b", AttendanceStatus::Waitlist, 1);
        h.store.put_record(1, "c", AttendanceStatus::Maybe, 2);
        h.store.put_record(2, "d", AttendanceStatus::Yes, 3);

        let sent = send_event_reminders(&h.state, now).await.expect("reminders");
        assert_eq!(sent, 2);

        let recipients = h
            .notifier
            .sent()
            .iter()
            .map(|item| (item.event.id, item.recipient.id.to_string(), item.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            recipients,
            vec![
                (EventId(1), "a".to_string(), NotificationKind::EventReminder),
                (EventId(1), "b".to_string(), NotificationKind::EventReminder),
            ]
        );
    }
}

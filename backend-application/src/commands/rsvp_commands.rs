use chrono::Utc;
use tracing::info;

use backend_domain::{
    apply_changes, normalize_optional_text, plan_self_rsvp, AttendanceCounts, EventId, RsvpRequest,
    UserId,
};

use crate::dtos::{AttendanceOutcome, RsvpPayload};
use crate::lookups::{commit, dispatch, load_active_event, load_records, load_user, promoted_user};
use crate::{AppError, AppState};

/// Self-service RSVP for the acting user.
pub async fn set_status(
    state: &AppState,
    event_id: EventId,
    acting_user: &UserId,
    payload: RsvpPayload,
) -> Result<AttendanceOutcome, AppError> {
    let request = RsvpRequest::parse(payload.status.as_deref())?;
    let notes = normalize_optional_text(payload.notes);

    let event = load_active_event(state, event_id).await?;
    let user = load_user(state, acting_user).await?;
    user.ensure_can_rsvp()?;

    let (plan, counts) = {
        let _guard = state.event_locks.acquire(event_id).await;
        let mut records = load_records(state, event_id).await?;
        let plan = plan_self_rsvp(&event, &records, acting_user, request, notes, Utc::now())?;
        commit(state, &plan.changes).await?;
        apply_changes(&mut records, &plan.changes);
        (plan, AttendanceCounts::tally(&records))
    };

    if plan.waitlisted {
        state.metrics.record_waitlisted();
    }
    info!(
        "rsvp event={} user={} {:?} -> {:?}",
        event_id, acting_user, plan.previous, plan.resulting
    );

    let promoted = promoted_user(state, &plan).await;
    let mut message = match plan.resulting {
        None => "Attendance cancelled".to_string(),
        Some(_) if plan.waitlisted => {
            "Event is full. You have been added to the waitlist.".to_string()
        }
        Some(status) => format!("Attendance confirmed: {}", status.label()),
    };
    if let Some(promoted) = &promoted {
        info!("event={} promoted {} from waitlist", event_id, promoted.user_id);
        let separator = if plan.resulting.is_none() { ". " } else { " " };
        message.push_str(&format!(
            "{}{} has been moved from waitlist to attending.",
            separator, promoted.name
        ));
    }

    dispatch(state, &event, plan.outbound(payload.notify)).await;

    Ok(AttendanceOutcome {
        event_id,
        user_id: acting_user.clone(),
        status: plan.resulting,
        waitlisted: plan.waitlisted,
        message,
        counts,
        promoted,
    })
}

#[cfg(test)]
mod tests {
    use backend_domain::{AttendanceStatus, NotificationKind, UserRole};

    use super::*;
    use crate::test_support::{future_event, harness, member, Harness};

    fn payload(status: Option<&str>) -> RsvpPayload {
        RsvpPayload {
            status: status.map(str::to_string),
            notes: None,
            notify: true,
        }
    }

    async fn rsvp(h: &Harness, user: &str, status: Option<&str>) -> AttendanceOutcome {
        set_status(&h.state, EventId(1), &UserId::from(user), payload(status))
            .await
            .expect("rsvp")
    }

    fn seeded(capacity: Option<u32>) -> Harness {
        let h = harness();
        h.store.add_event(future_event(1, capacity));
        for id in ["a", "b", "c", "d"] {
            h.store.add_user(member(id, UserRole::Approved));
        }
        h
    }

    #[tokio::test]
    async fn full_event_waitlists_then_promotes_on_cancel() {
        let h = seeded(Some(2));
        rsvp(&h, "a", Some("yes")).await;
        rsvp(&h, "b", Some("yes")).await;

        let c = rsvp(&h, "c", Some("yes")).await;
        assert_eq!(c.status, Some(AttendanceStatus::Waitlist));
        assert!(c.waitlisted);
        assert_eq!(c.message, "Event is full. You have been added to the waitlist.");
        assert_eq!(c.counts.waitlist, 1);

        let cancel = rsvp(&h, "a", None).await;
        assert_eq!(cancel.status, None);
        let promoted = cancel.promoted.expect("promoted");
        assert_eq!(promoted.user_id, UserId::from("c"));
        assert_eq!(
            cancel.message,
            "Attendance cancelled. User c has been moved from waitlist to attending."
        );
        assert_eq!(cancel.counts.yes, 2);
        assert_eq!(cancel.counts.waitlist, 0);

        assert_eq!(h.store.status_of(1, "a"), None);
        assert_eq!(h.store.status_of(1, "b"), Some(AttendanceStatus::Yes));
        assert_eq!(h.store.status_of(1, "c"), Some(AttendanceStatus::Yes));
        assert_eq!(h.state.metrics.promotions(), 1);
    }

    #[tokio::test]
    async fn confirmation_message_uses_label() {
        let h = seeded(None);
        let outcome = rsvp(&h, "a", Some("maybe")).await;
        assert_eq!(outcome.message, "Attendance confirmed: Maybe");
        let outcome = rsvp(&h, "a", Some("no")).await;
        assert_eq!(outcome.message, "Attendance confirmed: Not Going");
    }

    #[tokio::test]
    async fn declining_names_promoted_user_after_confirmation() {
        let h = seeded(Some(1));
        rsvp(&h, "a", Some("yes")).await;
        rsvp(&h, "b", Some("yes")).await;

        let outcome = rsvp(&h, "a", Some("no")).await;
        assert_eq!(
            outcome.message,
            "Attendance confirmed: Not Going User b has been moved from waitlist to attending."
        );
    }

    #[tokio::test]
    async fn notifications_are_sent_after_commit() {
        let h = seeded(Some(1));
        rsvp(&h, "a", Some("yes")).await;
        rsvp(&h, "b", Some("yes")).await;
        rsvp(&h, "a", Some("no")).await;

        let sent = h.notifier.sent();
        let kinds = sent
            .iter()
            .map(|item| (item.recipient.id.to_string(), item.kind))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (
                    "a".to_string(),
                    NotificationKind::RsvpConfirmed {
                        status: AttendanceStatus::Yes
                    }
                ),
                (
                    "b".to_string(),
                    NotificationKind::RsvpConfirmed {
                        status: AttendanceStatus::Waitlist
                    }
                ),
                (
                    "a".to_string(),
                    NotificationKind::StatusChanged {
                        status: Some(AttendanceStatus::No)
                    }
                ),
                ("b".to_string(), NotificationKind::WaitlistPromoted),
            ]
        );
    }

    #[tokio::test]
    async fn suppressed_notify_still_tells_promoted_user() {
        let h = seeded(Some(1));
        rsvp(&h, "a", Some("yes")).await;
        rsvp(&h, "b", Some("yes")).await;
        h.notifier.clear();

        let mut quiet = payload(None);
        quiet.notify = false;
        set_status(&h.state, EventId(1), &UserId::from("a"), quiet)
            .await
            .expect("cancel");

        let sent = h.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient.id, UserId::from("b"));
        assert_eq!(sent[0].kind, NotificationKind::WaitlistPromoted);
    }

    #[tokio::test]
    async fn repeated_yes_is_idempotent() {
        let h = seeded(Some(1));
        rsvp(&h, "a", Some("yes")).await;
        let again = rsvp(&h, "a", Some("yes")).await;
        assert_eq!(again.status, Some(AttendanceStatus::Yes));
        assert!(!again.waitlisted);
        assert_eq!(again.counts.yes, 1);
        assert_eq!(h.store.record_count(1), 1);
        assert_eq!(h.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn host_cannot_rsvp() {
        let h = seeded(None);
        h.store.add_user(member("host", UserRole::Organizer));
        let err = set_status(&h.state, EventId(1), &UserId::from("host"), payload(Some("yes")))
            .await
            .expect_err("host rsvp");
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn pending_member_is_rejected() {
        let h = seeded(None);
        h.store.add_user(member("p", UserRole::Pending));
        let err = set_status(&h.state, EventId(1), &UserId::from("p"), payload(Some("yes")))
            .await
            .expect_err("pending rsvp");
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(h.store.record_count(1), 0);
    }

    #[tokio::test]
    async fn cancel_without_record_is_not_found() {
        let h = seeded(None);
        let err = set_status(&h.state, EventId(1), &UserId::from("a"), payload(None))
            .await
            .expect_err("cancel");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn waitlist_is_not_requestable() {
        let h = seeded(None);
        let err = set_status(&h.state, EventId(1), &UserId::from("a"), payload(Some("waitlist")))
            .await
            .expect_err("waitlist");
        assert!(matches!(err, AppError::InvalidStatus(_)));
    }

    #[tokio::test]
    async fn inactive_event_is_not_found() {
        let h = seeded(None);
        let mut event = future_event(2, None);
        event.is_active = false;
        h.store.add_event(event);
        let err = set_status(&h.state, EventId(2), &UserId::from("a"), payload(Some("yes")))
            .await
            .expect_err("inactive");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn storage_failure_leaves_state_and_sends_nothing() {
        let h = seeded(Some(1));
        rsvp(&h, "a", Some("yes")).await;
        rsvp(&h, "b", Some("yes")).await;
        h.notifier.clear();
        h.store.fail_writes(true);

        let err = set_status(&h.state, EventId(1), &UserId::from("a"), payload(None))
            .await
            .expect_err("write failure");
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(h.store.status_of(1, "a"), Some(AttendanceStatus::Yes));
        assert_eq!(h.store.status_of(1, "b"), Some(AttendanceStatus::Waitlist));
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn concurrent_yes_requests_respect_capacity() {
        let h = seeded(Some(2));
        let mut tasks = Vec::new();
        for id in ["a", "b", "c", "d"] {
            let state = h.state.clone();
            tasks.push(tokio::spawn(async move {
                set_status(&state, EventId(1), &UserId::from(id), payload(Some("yes"))).await
            }));
        }
        for task in tasks {
            task.await.expect("join").expect("rsvp");
        }
        assert_eq!(h.store.count_with(1, AttendanceStatus::Yes), 2);
        assert_eq!(h.store.count_with(1, AttendanceStatus::Waitlist), 2);
    }
}

use thiserror::Error;

use crate::value_objects::UserRole;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttendanceError {
    #[error("no attendance record found")]
    RecordNotFound,
    #[error("hosts and co-hosts cannot RSVP to their own events")]
    HostSelfRsvp,
    #[error("{}", approval_message(*.0))]
    NotApproved(UserRole),
    #[error("only administrators, organizers, or event hosts can manage attendance")]
    NotPermitted,
    #[error("invalid attendance status '{0}'")]
    InvalidStatus(String),
    #[error("event is full ({attending} attending, max {capacity}); move the attendee to the waitlist instead")]
    CapacityExceeded { attending: u32, capacity: u32 },
    #[error("no-shows can only be recorded once the event has started")]
    EventNotStarted,
    #[error("no-show already recorded")]
    AlreadyMarked,
    #[error("only confirmed attendees can be marked as no-show")]
    NotAttending,
}

fn approval_message(role: UserRole) -> &'static str {
    match role {
        UserRole::Pending => "your application is pending review; you'll receive access once approved",
        UserRole::Rejected => "your application was not approved for community access",
        _ => "community approval required to access this feature",
    }
}

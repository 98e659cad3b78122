// Attendance status value objects

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AttendanceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Yes,
    No,
    Maybe,
    Waitlist,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Yes => "yes",
            AttendanceStatus::No => "no",
            AttendanceStatus::Maybe => "maybe",
            AttendanceStatus::Waitlist => "waitlist",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AttendanceError> {
        match value.trim().to_lowercase().as_str() {
            "yes" => Ok(AttendanceStatus::Yes),
            "no" => Ok(AttendanceStatus::No),
            "maybe" => Ok(AttendanceStatus::Maybe),
            "waitlist" => Ok(AttendanceStatus::Waitlist),
            _ => Err(AttendanceError::InvalidStatus(value.to_string())),
        }
    }

    /// Label used in confirmation messages.
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Yes => "Going",
            AttendanceStatus::No => "Not Going",
            AttendanceStatus::Maybe => "Maybe",
            AttendanceStatus::Waitlist => "Waitlisted",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an end user may ask for on their own behalf. Waitlist is never
/// requestable directly; it is only reached through capacity overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpRequest {
    Attend(AttendanceStatus),
    Cancel,
}

impl RsvpRequest {
    pub fn parse(value: Option<&str>) -> Result<Self, AttendanceError> {
        let raw = value.map(str::trim).unwrap_or("");
        if raw.is_empty() {
            return Ok(RsvpRequest::Cancel);
        }
        match AttendanceStatus::parse(raw)? {
            AttendanceStatus::Waitlist => Err(AttendanceError::InvalidStatus(raw.to_string())),
            status => Ok(RsvpRequest::Attend(status)),
        }
    }
}

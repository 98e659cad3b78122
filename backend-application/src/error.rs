use thiserror::Error;

use backend_domain::AttendanceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("{0}")]
    CapacityExceeded(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        let message = err.to_string();
        match err {
            AttendanceError::RecordNotFound => AppError::NotFound(message),
            AttendanceError::HostSelfRsvp
            | AttendanceError::NotApproved(_)
            | AttendanceError::NotPermitted => AppError::Forbidden(message),
            AttendanceError::InvalidStatus(_) => AppError::InvalidStatus(message),
            AttendanceError::CapacityExceeded { .. } => AppError::CapacityExceeded(message),
            AttendanceError::EventNotStarted
            | AttendanceError::AlreadyMarked
            | AttendanceError::NotAttending => AppError::BadRequest(message),
        }
    }
}

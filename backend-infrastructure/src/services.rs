pub mod notification_service;
pub mod reminder_service;

pub use notification_service::*;
pub use reminder_service::*;

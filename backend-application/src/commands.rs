pub mod admin_attendance_commands;
pub mod no_show_commands;
pub mod reminder_commands;
pub mod rsvp_commands;

pub use admin_attendance_commands::*;
pub use no_show_commands::*;
pub use reminder_commands::*;
pub use rsvp_commands::*;

pub mod admin_handlers;
pub mod attendance_handlers;
pub mod no_show_handlers;
pub mod ops_handlers;

pub use admin_handlers::*;
pub use attendance_handlers::*;
pub use no_show_handlers::*;
pub use ops_handlers::*;

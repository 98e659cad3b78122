// Domain value objects
pub mod attendance_status;
pub mod identifiers;
pub mod user_role;

pub use attendance_status::*;
pub use identifiers::*;
pub use user_role::*;

// Domain services
pub mod attendance_policy;
pub mod roster;

pub use attendance_policy::*;
pub use roster::*;

// Domain entities
pub mod attendance;
pub mod config;
pub mod directory;
pub mod event;
pub mod no_show;
pub mod notification;
pub mod user;

pub use attendance::*;
pub use config::*;
pub use directory::*;
pub use event::*;
pub use no_show::*;
pub use notification::*;
pub use user::*;

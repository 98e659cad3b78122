pub mod event_locks;

pub use event_locks::*;

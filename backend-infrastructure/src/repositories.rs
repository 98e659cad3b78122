pub mod directory_file;
pub mod sqlite_store;

pub use directory_file::*;
pub use sqlite_store::*;

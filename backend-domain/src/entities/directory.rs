// Directory snapshot
// Users and events mirrored from the account and event screens.

use serde::{Deserialize, Serialize};

use crate::entities::{Event, User};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Directory {
    pub users: Vec<User>,
    pub events: Vec<Event>,
}

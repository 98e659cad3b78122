// User entity
// Accounts are owned by the login flow; attendance only reads them.

use serde::{Deserialize, Serialize};

use crate::entities::Event;
use crate::errors::AttendanceError;
use crate::value_objects::{UserId, UserRole};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
}

impl User {
    pub fn ensure_can_rsvp(&self) -> Result<(), AttendanceError> {
        if self.role.is_member() {
            Ok(())
        } else {
            Err(AttendanceError::NotApproved(self.role))
        }
    }

    pub fn can_manage(&self, event: &Event) -> bool {
        self.role.is_staff() || event.is_host(&self.id)
    }

    pub fn ensure_can_manage(&self, event: &Event) -> Result<(), AttendanceError> {
        if self.can_manage(event) {
            Ok(())
        } else {
            Err(AttendanceError::NotPermitted)
        }
    }
}

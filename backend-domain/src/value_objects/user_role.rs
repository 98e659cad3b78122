// User role value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Pending,
    Approved,
    Organizer,
    Admin,
    Rejected,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Pending => "pending",
            UserRole::Approved => "approved",
            UserRole::Organizer => "organizer",
            UserRole::Admin => "admin",
            UserRole::Rejected => "rejected",
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Organizer | UserRole::Admin)
    }

    pub fn is_member(&self) -> bool {
        matches!(self, UserRole::Approved | UserRole::Organizer | UserRole::Admin)
    }
}

impl From<&str> for UserRole {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "approved" => UserRole::Approved,
            "organizer" => UserRole::Organizer,
            "admin" => UserRole::Admin,
            "rejected" => UserRole::Rejected,
            _ => UserRole::Pending,
        }
    }
}

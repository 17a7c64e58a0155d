//! Profile models.

use serde::{Deserialize, Serialize};

/// Role carried by an authenticated profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "patient" => Some(Role::Patient),
            "doctor" => Some(Role::Doctor),
            _ => None,
        }
    }
}

/// A person known to the clinic, patient or doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Identity issued by the session provider
    pub id: String,
    pub full_name: String,
    pub role: Role,
    pub created_at: String,
}

impl Profile {
    /// Create a new profile with a fresh ID.
    pub fn new(full_name: String, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            full_name,
            role,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

//! Doctor directory models.

use serde::{Deserialize, Serialize};

/// A doctor taking patients from a queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Doctor ID (queue owner)
    pub id: String,
    /// Profile this doctor row belongs to
    pub profile_id: String,
    /// Display name, copied from the profile
    pub full_name: String,
    pub specialization: String,
    /// Minutes per patient, used for wait estimates
    pub average_consultation_minutes: u32,
    /// Whether patients may currently book
    pub is_available: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Doctor {
    pub fn new(
        profile_id: String,
        full_name: String,
        specialization: String,
        average_consultation_minutes: u32,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile_id,
            full_name,
            specialization,
            average_consultation_minutes,
            is_available: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Minutes a patient with `patients_ahead` in front of them should expect to wait.
    pub fn wait_minutes(&self, patients_ahead: u32) -> u32 {
        patients_ahead.saturating_mul(self.average_consultation_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_minutes() {
        let doctor = Doctor::new("p1".into(), "Dr. Okafor".into(), "Cardiology".into(), 12);
        assert_eq!(doctor.wait_minutes(0), 0);
        assert_eq!(doctor.wait_minutes(3), 36);
        assert_eq!(doctor.wait_minutes(u32::MAX), u32::MAX);
    }
}

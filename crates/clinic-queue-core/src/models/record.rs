//! Medical record models.

use serde::{Deserialize, Serialize};

use super::booking::Booking;

/// Consultation notes supplied by the doctor when completing a booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordDraft {
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

/// A medical record written for a completed booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub id: String,
    /// One record per booking
    pub booking_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl MedicalRecord {
    /// Build the record for a booking from the doctor's draft.
    pub fn for_booking(booking: &Booking, draft: RecordDraft) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: booking.id.clone(),
            patient_id: booking.patient_id.clone(),
            doctor_id: booking.doctor_id.clone(),
            diagnosis: draft.diagnosis,
            prescription: draft.prescription,
            notes: draft.notes,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

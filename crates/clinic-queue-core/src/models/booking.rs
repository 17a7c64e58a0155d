//! Queue booking models.

use serde::{Deserialize, Serialize};

/// Booking status. Transitions only move forward: waiting, called, completed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// In the queue, not yet called
    Waiting,
    /// The doctor's current patient
    Called,
    /// Consultation finished (terminal)
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Waiting => "waiting",
            BookingStatus::Called => "called",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "waiting" => Some(BookingStatus::Waiting),
            "called" => Some(BookingStatus::Called),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Whether the booking still holds a place in the queue.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Waiting | BookingStatus::Called)
    }

    /// Single-step transitions of the booking state machine.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Waiting, BookingStatus::Called)
                | (BookingStatus::Called, BookingStatus::Completed)
        )
    }
}

/// A patient's place in a doctor's queue. Bookings are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    /// Position number, unique and increasing per doctor
    pub queue_number: u32,
    pub status: BookingStatus,
    pub booked_at: String,
    pub called_at: Option<String>,
    pub completed_at: Option<String>,
}

impl Booking {
    /// Create a waiting booking with an already assigned queue number.
    pub fn new(doctor_id: String, patient_id: String, queue_number: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            doctor_id,
            patient_id,
            queue_number,
            status: BookingStatus::Waiting,
            booked_at: chrono::Utc::now().to_rfc3339(),
            called_at: None,
            completed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

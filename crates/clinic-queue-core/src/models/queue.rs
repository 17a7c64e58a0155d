//! Read views over a doctor's queue.

use serde::{Deserialize, Serialize};

use super::booking::Booking;

/// A row of the doctor-facing queue list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub booking: Booking,
    pub patient_name: String,
}

/// Headline numbers for a doctor's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueSummary {
    pub doctor_id: String,
    pub waiting_count: u32,
    /// The booking currently called, if any
    pub current: Option<Booking>,
}

/// A patient's own view of one active booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueuePosition {
    pub booking: Booking,
    pub doctor_name: String,
    pub specialization: String,
    /// Active bookings ahead of this one, never who they are
    pub patients_ahead: u32,
    pub estimated_wait_minutes: u32,
}

impl QueuePosition {
    /// Whether the patient is being seen or is next in line.
    pub fn is_up_next(&self) -> bool {
        self.patients_ahead == 0
    }
}

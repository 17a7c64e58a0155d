//! Booking change notifications.

use serde::{Deserialize, Serialize};

use super::booking::BookingStatus;

/// What happened to a booking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Booked,
    Called,
    Completed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Booked => "booked",
            ChangeKind::Called => "called",
            ChangeKind::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(ChangeKind::Booked),
            "called" => Some(ChangeKind::Called),
            "completed" => Some(ChangeKind::Completed),
            _ => None,
        }
    }

    /// Booking status right after this change.
    pub fn resulting_status(&self) -> BookingStatus {
        match self {
            ChangeKind::Booked => BookingStatus::Waiting,
            ChangeKind::Called => BookingStatus::Called,
            ChangeKind::Completed => BookingStatus::Completed,
        }
    }
}

/// One entry of the booking change log.
///
/// Carries only the booking and doctor IDs: subscribers re-read whatever view
/// they are allowed to see instead of receiving other patients' data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingChange {
    /// Log sequence number, increasing in commit order
    pub seq: i64,
    pub booking_id: String,
    pub doctor_id: String,
    pub kind: ChangeKind,
    pub occurred_at: String,
}

impl BookingChange {
    pub fn status(&self) -> BookingStatus {
        self.kind.resulting_status()
    }
}

//! Queue ledger: numbering, status transitions and position queries.
//!
//! Lifecycle of a booking: `waiting → called → completed`, one step at a time.
//!
//! Every mutation runs in an immediate SQLite transaction, so the
//! read-check-write sequence is serialized against all other connections to
//! the same database file, including other processes. The change log row is
//! written inside the same transaction; in-process subscribers are notified
//! only after commit.

mod directory;
mod position;
mod transitions;

use thiserror::Error;

use crate::config::LedgerConfig;
use crate::db::{Database, DbError};
use crate::models::{BookingChange, BookingStatus};
use crate::notify::ChangeFeed;

/// Shown for failures the user cannot act on.
pub const INTERNAL_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Queue ledger errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Doctor {0} is not accepting bookings")]
    DoctorUnavailable(String),

    #[error("Patient {patient_id} already has an active booking (requested doctor {doctor_id})")]
    DuplicateBooking {
        patient_id: String,
        doctor_id: String,
    },

    #[error("No waiting patients for doctor {0}")]
    NoWaitingPatients(String),

    #[error("Doctor {doctor_id} is already seeing queue #{queue_number}")]
    AlreadyCalled { doctor_id: String, queue_number: u32 },

    #[error("Booking {booking_id} cannot move from {} to {}", .from.as_str(), .to.as_str())]
    InvalidStateTransition {
        booking_id: String,
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Queue for doctor {doctor_id} is busy after {attempts} attempt(s)")]
    ConcurrencyConflict { doctor_id: String, attempts: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Database(e.into())
    }
}

impl LedgerError {
    /// Message suitable for showing to a patient or doctor.
    pub fn user_message(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "We couldn't find that booking or doctor.",
            LedgerError::DoctorUnavailable(_) => "This doctor is not taking bookings right now.",
            LedgerError::DuplicateBooking { .. } => "You are already in the queue.",
            LedgerError::NoWaitingPatients(_) => "No patients are waiting.",
            LedgerError::AlreadyCalled { .. } => {
                "Finish the current patient before calling the next one."
            }
            LedgerError::InvalidStateTransition { .. } => {
                "This booking can't be updated in its current state."
            }
            LedgerError::ConcurrencyConflict { .. } => {
                "The queue is busy. Please try again in a moment."
            }
            LedgerError::InvalidInput(_) => "Some of the details entered are not valid.",
            LedgerError::Database(_) => INTERNAL_FAILURE_MESSAGE,
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::ConcurrencyConflict { .. } => true,
            LedgerError::Database(e) => e.is_busy(),
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Queue ledger over a database connection.
pub struct QueueLedger<'a> {
    db: &'a Database,
    config: &'a LedgerConfig,
    feed: Option<&'a ChangeFeed>,
}

impl<'a> QueueLedger<'a> {
    /// Create a ledger that does not notify in-process subscribers.
    pub fn new(db: &'a Database, config: &'a LedgerConfig) -> Self {
        Self {
            db,
            config,
            feed: None,
        }
    }

    /// Publish committed changes to `feed`.
    pub fn with_feed(mut self, feed: &'a ChangeFeed) -> Self {
        self.feed = Some(feed);
        self
    }

    fn publish(&self, changes: &[BookingChange]) {
        if let Some(feed) = self.feed {
            for change in changes {
                feed.publish(change);
            }
        }
    }

    /// Classify a write failure: lock timeouts and lost unique races are contention.
    fn contention(&self, doctor_id: &str, err: DbError) -> LedgerError {
        if err.is_busy() || err.is_unique_violation() {
            LedgerError::ConcurrencyConflict {
                doctor_id: doctor_id.to_string(),
                attempts: 1,
            }
        } else {
            LedgerError::Database(err)
        }
    }
}

pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

//! Clinic Queue Core Library
//!
//! Per-doctor patient queues with persistent, gap-free queue numbers.
//!
//! # Architecture
//!
//! ```text
//!   Patient books ──► create_booking ──► queue #N (waiting)
//!                                              │
//!                       Doctor dashboard ──► call_next
//!                                              │
//!                                        queue #N (called)
//!                                              │
//!                 complete_booking / complete_with_record
//!                                              │
//!                                       queue #N (completed)
//!
//!   every transition ──► booking_events (same transaction)
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//!        ChangeFeed (in-process)        ChangeCursor::poll
//!                                       (any process)
//! ```
//!
//! # Core Principle
//!
//! **Numbers are issued and transitions applied inside one immediate SQLite
//! transaction.** Any number of processes may share the database file; the
//! database lock, not the caller, serializes them.
//!
//! # Modules
//!
//! - [`config`]: Ledger tunables
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Profile, Doctor, Booking, MedicalRecord, etc.)
//! - [`queue`]: Queue ledger (numbering, transitions, positions)
//! - [`notify`]: Change feed and change-log cursor

pub mod config;
pub mod db;
pub mod models;
pub mod notify;
pub mod queue;

// Re-export commonly used types
pub use config::{ActiveBookingScope, LedgerConfig};
pub use db::Database;
pub use models::{
    Booking, BookingChange, BookingStatus, ChangeKind, Doctor, MedicalRecord, Profile,
    QueueEntry, QueuePosition, QueueSummary, RecordDraft, Role,
};
pub use notify::{ChangeCursor, ChangeFeed, Subscription};
pub use queue::{LedgerError, LedgerResult, QueueLedger};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

/// Errors surfaced to the host app.
///
/// `message` is safe to show to a patient or doctor; `detail` carries the
/// identifiers and cause for logs.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicQueueError {
    #[error("{message}")]
    DatabaseError { message: String, detail: String },

    #[error("{message}")]
    NotFound { message: String, detail: String },

    #[error("{message}")]
    DoctorUnavailable { message: String, detail: String },

    #[error("{message}")]
    DuplicateBooking { message: String, detail: String },

    #[error("{message}")]
    NoWaitingPatients { message: String, detail: String },

    #[error("{message}")]
    AlreadyCalled { message: String, detail: String },

    #[error("{message}")]
    InvalidStateTransition { message: String, detail: String },

    #[error("{message}")]
    ConcurrencyConflict { message: String, detail: String },

    #[error("{message}")]
    InvalidInput { message: String, detail: String },

    #[error("{message}")]
    SerializationError { message: String, detail: String },
}

impl ClinicQueueError {
    /// Non-technical text for display.
    pub fn user_message(&self) -> &str {
        match self {
            ClinicQueueError::DatabaseError { message, .. }
            | ClinicQueueError::NotFound { message, .. }
            | ClinicQueueError::DoctorUnavailable { message, .. }
            | ClinicQueueError::DuplicateBooking { message, .. }
            | ClinicQueueError::NoWaitingPatients { message, .. }
            | ClinicQueueError::AlreadyCalled { message, .. }
            | ClinicQueueError::InvalidStateTransition { message, .. }
            | ClinicQueueError::ConcurrencyConflict { message, .. }
            | ClinicQueueError::InvalidInput { message, .. }
            | ClinicQueueError::SerializationError { message, .. } => message,
        }
    }

    /// Technical description, including identifiers.
    pub fn detail(&self) -> &str {
        match self {
            ClinicQueueError::DatabaseError { detail, .. }
            | ClinicQueueError::NotFound { detail, .. }
            | ClinicQueueError::DoctorUnavailable { detail, .. }
            | ClinicQueueError::DuplicateBooking { detail, .. }
            | ClinicQueueError::NoWaitingPatients { detail, .. }
            | ClinicQueueError::AlreadyCalled { detail, .. }
            | ClinicQueueError::InvalidStateTransition { detail, .. }
            | ClinicQueueError::ConcurrencyConflict { detail, .. }
            | ClinicQueueError::InvalidInput { detail, .. }
            | ClinicQueueError::SerializationError { detail, .. } => detail,
        }
    }

    fn internal(detail: String) -> Self {
        ClinicQueueError::DatabaseError {
            message: queue::INTERNAL_FAILURE_MESSAGE.to_string(),
            detail,
        }
    }
}

impl From<LedgerError> for ClinicQueueError {
    fn from(e: LedgerError) -> Self {
        let message = e.user_message().to_string();
        let detail = e.to_string();
        match e {
            LedgerError::NotFound(_) => ClinicQueueError::NotFound { message, detail },
            LedgerError::DoctorUnavailable(_) => {
                ClinicQueueError::DoctorUnavailable { message, detail }
            }
            LedgerError::DuplicateBooking { .. } => {
                ClinicQueueError::DuplicateBooking { message, detail }
            }
            LedgerError::NoWaitingPatients(_) => {
                ClinicQueueError::NoWaitingPatients { message, detail }
            }
            LedgerError::AlreadyCalled { .. } => ClinicQueueError::AlreadyCalled { message, detail },
            LedgerError::InvalidStateTransition { .. } => {
                ClinicQueueError::InvalidStateTransition { message, detail }
            }
            LedgerError::ConcurrencyConflict { .. } => {
                ClinicQueueError::ConcurrencyConflict { message, detail }
            }
            LedgerError::InvalidInput(_) => ClinicQueueError::InvalidInput { message, detail },
            LedgerError::Database(_) => ClinicQueueError::DatabaseError { message, detail },
        }
    }
}

impl From<db::DbError> for ClinicQueueError {
    fn from(e: db::DbError) -> Self {
        ClinicQueueError::internal(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicQueueError {
    fn from(e: serde_json::Error) -> Self {
        ClinicQueueError::SerializationError {
            message: "The clinic settings could not be read.".to_string(),
            detail: e.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicQueueError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicQueueError::internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let config = LedgerConfig::default();
    let db = Database::open_with_config(&path, &config)?;
    Ok(Arc::new(ClinicQueueCore::new(db, config)))
}

/// Open or create a database, with ledger settings given as JSON.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let config = LedgerConfig::from_json(&config_json)?;
    let db = Database::open_with_config(&path, &config)?;
    Ok(Arc::new(ClinicQueueCore::new(db, config)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicQueueCore>, ClinicQueueError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(ClinicQueueCore::new(db, LedgerConfig::default())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe ledger wrapper for FFI.
///
/// The mutex only guards the connection; cross-process ordering comes from
/// the database lock taken by each ledger transaction.
#[derive(uniffi::Object)]
pub struct ClinicQueueCore {
    db: Arc<Mutex<Database>>,
    config: LedgerConfig,
    feed: Arc<ChangeFeed>,
}

impl ClinicQueueCore {
    fn new(db: Database, config: LedgerConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
            feed: Arc::new(ChangeFeed::new()),
        }
    }

    /// Feed of changes made through this handle, for Rust callers.
    pub fn feed(&self) -> Arc<ChangeFeed> {
        Arc::clone(&self.feed)
    }

    fn with_ledger<T>(
        &self,
        op: impl FnOnce(&QueueLedger<'_>) -> LedgerResult<T>,
    ) -> Result<T, ClinicQueueError> {
        let db = self.db.lock()?;
        let ledger = QueueLedger::new(&db, &self.config).with_feed(&self.feed);
        Ok(op(&ledger)?)
    }
}

#[uniffi::export]
impl ClinicQueueCore {
    // =========================================================================
    // Profile and Doctor Operations
    // =========================================================================

    /// Create a profile. `role` is "patient" or "doctor".
    pub fn create_profile(
        &self,
        full_name: String,
        role: String,
    ) -> Result<FfiProfile, ClinicQueueError> {
        let role = Role::parse(&role).ok_or_else(|| {
            LedgerError::InvalidInput(format!("unknown role {}", role))
        })?;
        let profile = self.with_ledger(|ledger| ledger.create_profile(&full_name, role))?;
        Ok(profile.into())
    }

    /// Get a profile by ID.
    pub fn get_profile(&self, profile_id: String) -> Result<FfiProfile, ClinicQueueError> {
        let profile = self.with_ledger(|ledger| ledger.profile(&profile_id))?;
        Ok(profile.into())
    }

    /// Get the doctor row for a doctor profile, creating it on first use.
    pub fn ensure_doctor(&self, profile_id: String) -> Result<FfiDoctor, ClinicQueueError> {
        let doctor = self.with_ledger(|ledger| ledger.ensure_doctor(&profile_id))?;
        Ok(doctor.into())
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, doctor_id: String) -> Result<FfiDoctor, ClinicQueueError> {
        let doctor = self.with_ledger(|ledger| ledger.doctor(&doctor_id))?;
        Ok(doctor.into())
    }

    /// List doctors accepting bookings.
    pub fn list_available_doctors(&self) -> Result<Vec<FfiDoctor>, ClinicQueueError> {
        let doctors = self.with_ledger(|ledger| ledger.available_doctors())?;
        Ok(doctors.into_iter().map(|d| d.into()).collect())
    }

    /// Set the consultation length for the doctor owning a profile.
    pub fn update_consultation_minutes(
        &self,
        profile_id: String,
        minutes: u32,
    ) -> Result<(), ClinicQueueError> {
        self.with_ledger(|ledger| ledger.update_consultation_minutes(&profile_id, minutes))
    }

    /// Open or close a doctor's queue to new bookings.
    pub fn set_availability(
        &self,
        doctor_id: String,
        is_available: bool,
    ) -> Result<(), ClinicQueueError> {
        self.with_ledger(|ledger| ledger.set_availability(&doctor_id, is_available))
    }

    // =========================================================================
    // Queue Operations
    // =========================================================================

    /// Book the patient into the doctor's queue.
    pub fn create_booking(
        &self,
        doctor_id: String,
        patient_id: String,
    ) -> Result<FfiBooking, ClinicQueueError> {
        let booking = self.with_ledger(|ledger| ledger.create_booking(&doctor_id, &patient_id))?;
        Ok(booking.into())
    }

    /// Call the next waiting patient.
    pub fn call_next(&self, doctor_id: String) -> Result<FfiBooking, ClinicQueueError> {
        let booking = self.with_ledger(|ledger| ledger.call_next(&doctor_id))?;
        Ok(booking.into())
    }

    /// Complete a called booking.
    pub fn complete_booking(&self, booking_id: String) -> Result<FfiBooking, ClinicQueueError> {
        let booking = self.with_ledger(|ledger| ledger.complete_booking(&booking_id))?;
        Ok(booking.into())
    }

    /// Complete a called booking and store its medical record.
    pub fn complete_with_record(
        &self,
        booking_id: String,
        draft: FfiRecordDraft,
    ) -> Result<FfiMedicalRecord, ClinicQueueError> {
        let (_, record) =
            self.with_ledger(|ledger| ledger.complete_with_record(&booking_id, draft.into()))?;
        Ok(record.into())
    }

    /// Number of active bookings ahead of the given queue number.
    pub fn count_ahead(
        &self,
        doctor_id: String,
        queue_number: u32,
        patient_id: String,
    ) -> Result<u32, ClinicQueueError> {
        self.with_ledger(|ledger| ledger.count_ahead(&doctor_id, queue_number, &patient_id))
    }

    /// Expected wait in minutes.
    pub fn estimated_wait(
        &self,
        doctor_id: String,
        queue_number: u32,
        patient_id: String,
    ) -> Result<u32, ClinicQueueError> {
        self.with_ledger(|ledger| ledger.estimated_wait(&doctor_id, queue_number, &patient_id))
    }

    // =========================================================================
    // Dashboard Views
    // =========================================================================

    /// The patient's active bookings with positions.
    pub fn get_queue_positions(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiQueuePosition>, ClinicQueueError> {
        let positions = self.with_ledger(|ledger| ledger.queue_positions(&patient_id))?;
        Ok(positions.into_iter().map(|p| p.into()).collect())
    }

    /// The doctor's active queue in order.
    pub fn get_doctor_queue(
        &self,
        doctor_id: String,
    ) -> Result<Vec<FfiQueueEntry>, ClinicQueueError> {
        let entries = self.with_ledger(|ledger| ledger.doctor_queue(&doctor_id))?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Waiting count and current patient.
    pub fn get_queue_summary(&self, doctor_id: String) -> Result<FfiQueueSummary, ClinicQueueError> {
        let summary = self.with_ledger(|ledger| ledger.queue_summary(&doctor_id))?;
        Ok(summary.into())
    }

    /// All bookings of a patient, most recent first.
    pub fn get_booking_history(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiBooking>, ClinicQueueError> {
        let bookings = self.with_ledger(|ledger| ledger.booking_history(&patient_id))?;
        Ok(bookings.into_iter().map(|b| b.into()).collect())
    }

    /// Medical records of a patient, newest first.
    pub fn get_medical_records(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiMedicalRecord>, ClinicQueueError> {
        let records = self.with_ledger(|ledger| ledger.medical_records(&patient_id))?;
        Ok(records.into_iter().map(|r| r.into()).collect())
    }

    // =========================================================================
    // Change Log
    // =========================================================================

    /// Changes committed after `after_seq`, optionally for one doctor.
    pub fn poll_changes(
        &self,
        after_seq: i64,
        doctor_id: Option<String>,
        limit: u32,
    ) -> Result<Vec<FfiBookingChange>, ClinicQueueError> {
        let db = self.db.lock()?;
        let changes = db.list_booking_events(after_seq, doctor_id.as_deref(), limit.max(1) as usize)?;
        Ok(changes.into_iter().map(|c| c.into()).collect())
    }

    /// Sequence number of the latest change.
    pub fn latest_change_seq(&self) -> Result<i64, ClinicQueueError> {
        let db = self.db.lock()?;
        Ok(db.latest_event_seq()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProfile {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub created_at: String,
}

impl From<Profile> for FfiProfile {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
            role: profile.role.as_str().to_string(),
            created_at: profile.created_at,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub profile_id: String,
    pub full_name: String,
    pub specialization: String,
    pub average_consultation_minutes: u32,
    pub is_available: bool,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            profile_id: doctor.profile_id,
            full_name: doctor.full_name,
            specialization: doctor.specialization,
            average_consultation_minutes: doctor.average_consultation_minutes,
            is_available: doctor.is_available,
        }
    }
}

/// FFI-safe booking.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBooking {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub queue_number: u32,
    pub status: String,
    pub booked_at: String,
    pub called_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<Booking> for FfiBooking {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id,
            doctor_id: booking.doctor_id,
            patient_id: booking.patient_id,
            queue_number: booking.queue_number,
            status: booking.status.as_str().to_string(),
            booked_at: booking.booked_at,
            called_at: booking.called_at,
            completed_at: booking.completed_at,
        }
    }
}

/// FFI-safe doctor queue row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueueEntry {
    pub booking: FfiBooking,
    pub patient_name: String,
}

impl From<QueueEntry> for FfiQueueEntry {
    fn from(entry: QueueEntry) -> Self {
        Self {
            booking: entry.booking.into(),
            patient_name: entry.patient_name,
        }
    }
}

/// FFI-safe queue summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueueSummary {
    pub doctor_id: String,
    pub waiting_count: u32,
    pub current: Option<FfiBooking>,
}

impl From<QueueSummary> for FfiQueueSummary {
    fn from(summary: QueueSummary) -> Self {
        Self {
            doctor_id: summary.doctor_id,
            waiting_count: summary.waiting_count,
            current: summary.current.map(|b| b.into()),
        }
    }
}

/// FFI-safe queue position.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueuePosition {
    pub booking: FfiBooking,
    pub doctor_name: String,
    pub specialization: String,
    pub patients_ahead: u32,
    pub estimated_wait_minutes: u32,
}

impl From<QueuePosition> for FfiQueuePosition {
    fn from(position: QueuePosition) -> Self {
        Self {
            booking: position.booking.into(),
            doctor_name: position.doctor_name,
            specialization: position.specialization,
            patients_ahead: position.patients_ahead,
            estimated_wait_minutes: position.estimated_wait_minutes,
        }
    }
}

/// FFI-safe record input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordDraft {
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
}

impl From<FfiRecordDraft> for RecordDraft {
    fn from(draft: FfiRecordDraft) -> Self {
        RecordDraft {
            diagnosis: draft.diagnosis,
            prescription: draft.prescription,
            notes: draft.notes,
        }
    }
}

/// FFI-safe medical record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecord {
    pub id: String,
    pub booking_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub diagnosis: String,
    pub prescription: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl From<MedicalRecord> for FfiMedicalRecord {
    fn from(record: MedicalRecord) -> Self {
        Self {
            id: record.id,
            booking_id: record.booking_id,
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            diagnosis: record.diagnosis,
            prescription: record.prescription,
            notes: record.notes,
            created_at: record.created_at,
        }
    }
}

/// FFI-safe change log entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBookingChange {
    pub seq: i64,
    pub booking_id: String,
    pub doctor_id: String,
    pub kind: String,
    pub status: String,
    pub occurred_at: String,
}

impl From<BookingChange> for FfiBookingChange {
    fn from(change: BookingChange) -> Self {
        Self {
            seq: change.seq,
            status: change.status().as_str().to_string(),
            kind: change.kind.as_str().to_string(),
            booking_id: change.booking_id,
            doctor_id: change.doctor_id,
            occurred_at: change.occurred_at,
        }
    }
}

//! SQLite schema definition.

/// Complete database schema for the clinic queue.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Profiles (identities supplied by the session provider)
-- ============================================================================

CREATE TABLE IF NOT EXISTS profiles (
    id TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('patient', 'doctor')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Doctor Directory
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id TEXT PRIMARY KEY,
    profile_id TEXT NOT NULL UNIQUE REFERENCES profiles(id),
    full_name TEXT NOT NULL,
    specialization TEXT NOT NULL,
    average_consultation_minutes INTEGER NOT NULL CHECK (average_consultation_minutes > 0),
    is_available INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_doctors_available ON doctors(is_available);

-- ============================================================================
-- Queue Bookings (append + forward-only status updates)
-- ============================================================================

CREATE TABLE IF NOT EXISTS queue_bookings (
    id TEXT PRIMARY KEY,
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    patient_id TEXT NOT NULL REFERENCES profiles(id),
    queue_number INTEGER NOT NULL CHECK (queue_number > 0),
    status TEXT NOT NULL DEFAULT 'waiting',      -- waiting, called, completed
    booked_at TEXT NOT NULL,
    called_at TEXT,
    completed_at TEXT,
    UNIQUE (doctor_id, queue_number),
    CHECK (
        (status = 'waiting' AND called_at IS NULL AND completed_at IS NULL)
        OR (status = 'called' AND called_at IS NOT NULL AND completed_at IS NULL)
        OR (status = 'completed' AND called_at IS NOT NULL AND completed_at IS NOT NULL)
    )
);

-- One active booking per patient per doctor
CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_active_patient
    ON queue_bookings(doctor_id, patient_id)
    WHERE status IN ('waiting', 'called');

-- One current patient per doctor
CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_called
    ON queue_bookings(doctor_id)
    WHERE status = 'called';

CREATE INDEX IF NOT EXISTS idx_bookings_patient ON queue_bookings(patient_id, booked_at);
CREATE INDEX IF NOT EXISTS idx_bookings_doctor_status ON queue_bookings(doctor_id, status, queue_number);

-- Identity and ordering columns never change; status only moves forward
CREATE TRIGGER IF NOT EXISTS queue_bookings_check_update BEFORE UPDATE ON queue_bookings
BEGIN
    SELECT CASE
        WHEN new.id IS NOT old.id
            OR new.doctor_id IS NOT old.doctor_id
            OR new.patient_id IS NOT old.patient_id
            OR new.queue_number IS NOT old.queue_number
            OR new.booked_at IS NOT old.booked_at THEN
            RAISE(ABORT, 'Booking identity columns are immutable')
        WHEN old.status = 'completed' THEN
            RAISE(ABORT, 'Completed bookings are final')
        WHEN old.status = 'called' AND new.status = 'waiting' THEN
            RAISE(ABORT, 'Called bookings cannot return to waiting')
    END;
END;

CREATE TRIGGER IF NOT EXISTS queue_bookings_no_delete BEFORE DELETE ON queue_bookings
BEGIN
    SELECT RAISE(ABORT, 'Bookings are permanent history');
END;

-- ============================================================================
-- Medical Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_records (
    id TEXT PRIMARY KEY,
    booking_id TEXT NOT NULL UNIQUE REFERENCES queue_bookings(id),
    patient_id TEXT NOT NULL REFERENCES profiles(id),
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    diagnosis TEXT NOT NULL CHECK (length(trim(diagnosis)) > 0),
    prescription TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_patient ON medical_records(patient_id, created_at);

-- ============================================================================
-- Booking Change Log (append-only, no patient identity)
-- ============================================================================

CREATE TABLE IF NOT EXISTS booking_events (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id TEXT NOT NULL REFERENCES queue_bookings(id),
    doctor_id TEXT NOT NULL REFERENCES doctors(id),
    kind TEXT NOT NULL CHECK (kind IN ('booked', 'called', 'completed')),
    occurred_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_doctor ON booking_events(doctor_id, seq);
"#;

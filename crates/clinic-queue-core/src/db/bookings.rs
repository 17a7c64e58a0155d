//! Queue booking database operations.
//!
//! These are single statements. Anything that must read, check and then write
//! runs inside a transaction opened by the queue ledger.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{Booking, BookingStatus, QueueEntry};

const BOOKING_COLUMNS: &str =
    "id, doctor_id, patient_id, queue_number, status, booked_at, called_at, completed_at";

impl Database {
    /// Insert a new booking.
    pub fn insert_booking(&self, booking: &Booking) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO queue_bookings (
                id, doctor_id, patient_id, queue_number,
                status, booked_at, called_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                booking.id,
                booking.doctor_id,
                booking.patient_id,
                booking.queue_number,
                booking.status.as_str(),
                booking.booked_at,
                booking.called_at,
                booking.completed_at,
            ],
        )?;
        Ok(())
    }

    /// Write a booking's status and transition timestamps.
    ///
    /// Only applies if the stored status still equals `expected`, so a
    /// transition computed from a stale read is never written.
    pub fn update_booking_status(
        &self,
        booking: &Booking,
        expected: BookingStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE queue_bookings SET
                status = ?2,
                called_at = ?3,
                completed_at = ?4
            WHERE id = ?1 AND status = ?5
            "#,
            params![
                booking.id,
                booking.status.as_str(),
                booking.called_at,
                booking.completed_at,
                expected.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a booking by ID.
    pub fn get_booking(&self, id: &str) -> DbResult<Option<Booking>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM queue_bookings WHERE id = ?", BOOKING_COLUMNS),
                [id],
                booking_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Highest queue number issued for a doctor, 0 if none.
    pub fn max_queue_number(&self, doctor_id: &str) -> DbResult<u32> {
        let max: u32 = self.conn.query_row(
            "SELECT COALESCE(MAX(queue_number), 0) FROM queue_bookings WHERE doctor_id = ?",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    /// Whether the patient holds a waiting or called booking, with one doctor or any.
    pub fn has_active_booking(&self, patient_id: &str, doctor_id: Option<&str>) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM queue_bookings
                WHERE patient_id = ?1
                  AND (?2 IS NULL OR doctor_id = ?2)
                  AND status IN ('waiting', 'called')
            )
            "#,
            params![patient_id, doctor_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// The doctor's current (called) booking.
    pub fn get_called_booking(&self, doctor_id: &str) -> DbResult<Option<Booking>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM queue_bookings WHERE doctor_id = ? AND status = 'called'",
                    BOOKING_COLUMNS
                ),
                [doctor_id],
                booking_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// The waiting booking with the lowest queue number.
    pub fn get_next_waiting_booking(&self, doctor_id: &str) -> DbResult<Option<Booking>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {} FROM queue_bookings
                    WHERE doctor_id = ? AND status = 'waiting'
                    ORDER BY queue_number ASC
                    LIMIT 1
                    "#,
                    BOOKING_COLUMNS
                ),
                [doctor_id],
                booking_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Count active bookings ahead of `queue_number`, not counting `patient_id`'s own.
    pub fn count_active_ahead(
        &self,
        doctor_id: &str,
        queue_number: u32,
        patient_id: &str,
    ) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM queue_bookings
            WHERE doctor_id = ?1
              AND status IN ('waiting', 'called')
              AND queue_number < ?2
              AND patient_id != ?3
            "#,
            params![doctor_id, queue_number, patient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count waiting bookings for a doctor.
    pub fn count_waiting(&self, doctor_id: &str) -> DbResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM queue_bookings WHERE doctor_id = ? AND status = 'waiting'",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// A doctor's active queue with patient names, by queue number.
    pub fn list_doctor_queue(&self, doctor_id: &str) -> DbResult<Vec<QueueEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT b.id, b.doctor_id, b.patient_id, b.queue_number, b.status,
                   b.booked_at, b.called_at, b.completed_at, p.full_name
            FROM queue_bookings b
            JOIN profiles p ON p.id = b.patient_id
            WHERE b.doctor_id = ? AND b.status IN ('waiting', 'called')
            ORDER BY b.queue_number ASC
            "#,
        )?;

        let rows = stmt.query_map([doctor_id], |row| {
            Ok((booking_row(row)?, row.get::<_, String>(8)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (booking, patient_name) = row?;
            entries.push(QueueEntry {
                booking: booking.try_into()?,
                patient_name,
            });
        }
        Ok(entries)
    }

    /// A patient's waiting or called bookings, most recent first.
    pub fn list_active_bookings_for_patient(&self, patient_id: &str) -> DbResult<Vec<Booking>> {
        self.query_bookings(
            &format!(
                r#"
                SELECT {} FROM queue_bookings
                WHERE patient_id = ? AND status IN ('waiting', 'called')
                ORDER BY booked_at DESC, rowid DESC
                "#,
                BOOKING_COLUMNS
            ),
            patient_id,
        )
    }

    /// All of a patient's bookings, most recent first.
    pub fn list_bookings_for_patient(&self, patient_id: &str) -> DbResult<Vec<Booking>> {
        self.query_bookings(
            &format!(
                r#"
                SELECT {} FROM queue_bookings
                WHERE patient_id = ?
                ORDER BY booked_at DESC, rowid DESC
                "#,
                BOOKING_COLUMNS
            ),
            patient_id,
        )
    }

    fn query_bookings(&self, sql: &str, key: &str) -> DbResult<Vec<Booking>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([key], booking_row)?;

        let mut bookings = Vec::new();
        for row in rows {
            bookings.push(row?.try_into()?);
        }
        Ok(bookings)
    }
}

/// Intermediate row struct for database mapping.
struct BookingRow {
    id: String,
    doctor_id: String,
    patient_id: String,
    queue_number: u32,
    status: String,
    booked_at: String,
    called_at: Option<String>,
    completed_at: Option<String>,
}

fn booking_row(row: &Row<'_>) -> rusqlite::Result<BookingRow> {
    Ok(BookingRow {
        id: row.get(0)?,
        doctor_id: row.get(1)?,
        patient_id: row.get(2)?,
        queue_number: row.get(3)?,
        status: row.get(4)?,
        booked_at: row.get(5)?,
        called_at: row.get(6)?,
        completed_at: row.get(7)?,
    })
}

impl TryFrom<BookingRow> for Booking {
    type Error = DbError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status = BookingStatus::parse(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown booking status: {}", row.status)))?;

        Ok(Booking {
            id: row.id,
            doctor_id: row.doctor_id,
            patient_id: row.patient_id,
            queue_number: row.queue_number,
            status,
            booked_at: row.booked_at,
            called_at: row.called_at,
            completed_at: row.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doctor, Profile, Role};

    struct Fixture {
        db: Database,
        doctor: Doctor,
        patients: Vec<Profile>,
    }

    fn setup_db() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let doctor_profile = Profile::new("Dr. Patel".into(), Role::Doctor);
        db.insert_profile(&doctor_profile).unwrap();
        let doctor = Doctor::new(doctor_profile.id, "Dr. Patel".into(), "Pediatrics".into(), 10);
        db.insert_doctor(&doctor).unwrap();

        let patients: Vec<Profile> = ["Ada", "Ben", "Cy"]
            .iter()
            .map(|name| {
                let p = Profile::new(name.to_string(), Role::Patient);
                db.insert_profile(&p).unwrap();
                p
            })
            .collect();

        Fixture {
            db,
            doctor,
            patients,
        }
    }

    #[test]
    fn test_insert_and_get_booking() {
        let fx = setup_db();
        let booking = Booking::new(fx.doctor.id.clone(), fx.patients[0].id.clone(), 1);
        fx.db.insert_booking(&booking).unwrap();

        let retrieved = fx.db.get_booking(&booking.id).unwrap().unwrap();
        assert_eq!(retrieved, booking);
        assert_eq!(fx.db.max_queue_number(&fx.doctor.id).unwrap(), 1);
    }

    #[test]
    fn test_max_queue_number_empty() {
        let fx = setup_db();
        assert_eq!(fx.db.max_queue_number(&fx.doctor.id).unwrap(), 0);
    }

    #[test]
    fn test_update_status_checks_expected() {
        let fx = setup_db();
        let mut booking = Booking::new(fx.doctor.id.clone(), fx.patients[0].id.clone(), 1);
        fx.db.insert_booking(&booking).unwrap();

        booking.status = BookingStatus::Called;
        booking.called_at = Some(chrono::Utc::now().to_rfc3339());

        // Stored status is waiting, not called
        assert!(!fx.db.update_booking_status(&booking, BookingStatus::Called).unwrap());
        assert!(fx.db.update_booking_status(&booking, BookingStatus::Waiting).unwrap());

        let called = fx.db.get_called_booking(&fx.doctor.id).unwrap().unwrap();
        assert_eq!(called.id, booking.id);
    }

    #[test]
    fn test_next_waiting_is_lowest_number() {
        let fx = setup_db();
        for (i, patient) in fx.patients.iter().enumerate() {
            let booking = Booking::new(fx.doctor.id.clone(), patient.id.clone(), (i + 1) as u32);
            fx.db.insert_booking(&booking).unwrap();
        }

        let next = fx.db.get_next_waiting_booking(&fx.doctor.id).unwrap().unwrap();
        assert_eq!(next.queue_number, 1);
        assert_eq!(fx.db.count_waiting(&fx.doctor.id).unwrap(), 3);
    }

    #[test]
    fn test_has_active_booking_scopes() {
        let fx = setup_db();
        let booking = Booking::new(fx.doctor.id.clone(), fx.patients[0].id.clone(), 1);
        fx.db.insert_booking(&booking).unwrap();

        assert!(fx.db.has_active_booking(&fx.patients[0].id, None).unwrap());
        assert!(fx
            .db
            .has_active_booking(&fx.patients[0].id, Some(&fx.doctor.id))
            .unwrap());
        assert!(!fx
            .db
            .has_active_booking(&fx.patients[0].id, Some("other-doctor"))
            .unwrap());
        assert!(!fx.db.has_active_booking(&fx.patients[1].id, None).unwrap());
    }

    #[test]
    fn test_doctor_queue_includes_names() {
        let fx = setup_db();
        let second = Booking::new(fx.doctor.id.clone(), fx.patients[1].id.clone(), 2);
        let first = Booking::new(fx.doctor.id.clone(), fx.patients[0].id.clone(), 1);
        fx.db.insert_booking(&second).unwrap();
        fx.db.insert_booking(&first).unwrap();

        let queue = fx.db.list_doctor_queue(&fx.doctor.id).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].patient_name, "Ada");
        assert_eq!(queue[1].patient_name, "Ben");
    }
}

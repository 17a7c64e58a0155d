//! Doctor directory database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Doctor;

const DOCTOR_COLUMNS: &str = "id, profile_id, full_name, specialization, \
    average_consultation_minutes, is_available, created_at, updated_at";

fn doctor_from_row(row: &Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        profile_id: row.get(1)?,
        full_name: row.get(2)?,
        specialization: row.get(3)?,
        average_consultation_minutes: row.get(4)?,
        is_available: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a new doctor.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO doctors (
                id, profile_id, full_name, specialization,
                average_consultation_minutes, is_available, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                doctor.id,
                doctor.profile_id,
                doctor.full_name,
                doctor.specialization,
                doctor.average_consultation_minutes,
                doctor.is_available,
                doctor.created_at,
                doctor.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE id = ?", DOCTOR_COLUMNS),
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the doctor row owned by a profile.
    pub fn get_doctor_by_profile(&self, profile_id: &str) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM doctors WHERE profile_id = ?", DOCTOR_COLUMNS),
                [profile_id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List doctors accepting bookings.
    pub fn list_available_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM doctors WHERE is_available = 1 ORDER BY full_name",
            DOCTOR_COLUMNS
        ))?;
        let rows = stmt.query_map([], doctor_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Update consultation length, keyed by the doctor's profile.
    pub fn update_consultation_minutes(&self, profile_id: &str, minutes: u32) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE doctors SET
                average_consultation_minutes = ?2,
                updated_at = ?3
            WHERE profile_id = ?1
            "#,
            params![profile_id, minutes, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Open or close a doctor's queue to new bookings.
    pub fn set_doctor_availability(&self, doctor_id: &str, is_available: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE doctors SET is_available = ?2, updated_at = ?3 WHERE id = ?1",
            params![doctor_id, is_available, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(rows_affected > 0)
    }
}

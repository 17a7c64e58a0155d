//! Medical record database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::MedicalRecord;

const RECORD_COLUMNS: &str =
    "id, booking_id, patient_id, doctor_id, diagnosis, prescription, notes, created_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        diagnosis: row.get(4)?,
        prescription: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a medical record.
    pub fn insert_medical_record(&self, record: &MedicalRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medical_records (
                id, booking_id, patient_id, doctor_id,
                diagnosis, prescription, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.id,
                record.booking_id,
                record.patient_id,
                record.doctor_id,
                record.diagnosis,
                record.prescription,
                record.notes,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get the record written for a booking.
    pub fn get_record_for_booking(&self, booking_id: &str) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM medical_records WHERE booking_id = ?",
                    RECORD_COLUMNS
                ),
                [booking_id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's records, newest first.
    pub fn list_records_for_patient(&self, patient_id: &str) -> DbResult<Vec<MedicalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM medical_records
            WHERE patient_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
            RECORD_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

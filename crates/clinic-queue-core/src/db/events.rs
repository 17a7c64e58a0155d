//! Booking change log database operations.

use rusqlite::{params, Row};

use super::{Database, DbError, DbResult};
use crate::models::{BookingChange, ChangeKind};

impl Database {
    /// Append a change and return it with its assigned sequence number.
    pub fn append_booking_event(
        &self,
        booking_id: &str,
        doctor_id: &str,
        kind: ChangeKind,
        occurred_at: &str,
    ) -> DbResult<BookingChange> {
        self.conn.execute(
            "INSERT INTO booking_events (booking_id, doctor_id, kind, occurred_at) VALUES (?1, ?2, ?3, ?4)",
            params![booking_id, doctor_id, kind.as_str(), occurred_at],
        )?;
        Ok(BookingChange {
            seq: self.conn.last_insert_rowid(),
            booking_id: booking_id.to_string(),
            doctor_id: doctor_id.to_string(),
            kind,
            occurred_at: occurred_at.to_string(),
        })
    }

    /// Changes after `after_seq`, for one doctor or all, in commit order.
    pub fn list_booking_events(
        &self,
        after_seq: i64,
        doctor_id: Option<&str>,
        limit: usize,
    ) -> DbResult<Vec<BookingChange>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT seq, booking_id, doctor_id, kind, occurred_at
            FROM booking_events
            WHERE seq > ?1 AND (?2 IS NULL OR doctor_id = ?2)
            ORDER BY seq ASC
            LIMIT ?3
            "#,
        )?;

        let rows = stmt.query_map(params![after_seq, doctor_id, limit as i64], event_row)?;

        let mut changes = Vec::new();
        for row in rows {
            let (seq, booking_id, doctor_id, kind, occurred_at) = row?;
            let kind = ChangeKind::parse(&kind)
                .ok_or_else(|| DbError::Constraint(format!("Unknown change kind: {}", kind)))?;
            changes.push(BookingChange {
                seq,
                booking_id,
                doctor_id,
                kind,
                occurred_at,
            });
        }
        Ok(changes)
    }

    /// Highest sequence number written so far, 0 for an empty log.
    pub fn latest_event_seq(&self) -> DbResult<i64> {
        let seq: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM booking_events",
            [],
            |row| row.get(0),
        )?;
        Ok(seq)
    }
}

type EventRow = (i64, String, String, String, String);

fn event_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

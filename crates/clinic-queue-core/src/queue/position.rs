//! Position queries and derived queue views.

use log::debug;

use super::{LedgerError, LedgerResult, QueueLedger};
use crate::models::{Booking, MedicalRecord, QueueEntry, QueuePosition, QueueSummary};

impl<'a> QueueLedger<'a> {
    /// Number of active bookings ahead of `queue_number` in the doctor's queue,
    /// not counting the patient's own. Zero means next to be called.
    ///
    /// Returns a count only; who is ahead is never exposed to the patient.
    pub fn count_ahead(
        &self,
        doctor_id: &str,
        queue_number: u32,
        patient_id: &str,
    ) -> LedgerResult<u32> {
        if self.db.get_doctor(doctor_id)?.is_none() {
            return Err(LedgerError::NotFound(format!("doctor {}", doctor_id)));
        }
        Ok(self
            .db
            .count_active_ahead(doctor_id, queue_number, patient_id)?)
    }

    /// Expected wait in minutes, from the doctor's current consultation length.
    pub fn estimated_wait(
        &self,
        doctor_id: &str,
        queue_number: u32,
        patient_id: &str,
    ) -> LedgerResult<u32> {
        let doctor = self
            .db
            .get_doctor(doctor_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("doctor {}", doctor_id)))?;
        let ahead = self
            .db
            .count_active_ahead(doctor_id, queue_number, patient_id)?;
        Ok(doctor.wait_minutes(ahead))
    }

    /// The patient's active bookings with their positions, most recent first.
    pub fn queue_positions(&self, patient_id: &str) -> LedgerResult<Vec<QueuePosition>> {
        let bookings = self.db.list_active_bookings_for_patient(patient_id)?;
        debug!(
            "Patient {} has {} active booking(s)",
            patient_id,
            bookings.len()
        );

        bookings
            .into_iter()
            .map(|booking| -> LedgerResult<QueuePosition> {
                let doctor = self.db.get_doctor(&booking.doctor_id)?.ok_or_else(|| {
                    LedgerError::NotFound(format!("doctor {}", booking.doctor_id))
                })?;
                let patients_ahead = self.db.count_active_ahead(
                    &booking.doctor_id,
                    booking.queue_number,
                    patient_id,
                )?;
                Ok(QueuePosition {
                    estimated_wait_minutes: doctor.wait_minutes(patients_ahead),
                    patients_ahead,
                    doctor_name: doctor.full_name,
                    specialization: doctor.specialization,
                    booking,
                })
            })
            .collect()
    }

    /// The doctor's waiting and called bookings in queue order.
    pub fn doctor_queue(&self, doctor_id: &str) -> LedgerResult<Vec<QueueEntry>> {
        Ok(self.db.list_doctor_queue(doctor_id)?)
    }

    /// Waiting count and current patient for a doctor.
    pub fn queue_summary(&self, doctor_id: &str) -> LedgerResult<QueueSummary> {
        if self.db.get_doctor(doctor_id)?.is_none() {
            return Err(LedgerError::NotFound(format!("doctor {}", doctor_id)));
        }
        Ok(QueueSummary {
            doctor_id: doctor_id.to_string(),
            waiting_count: self.db.count_waiting(doctor_id)?,
            current: self.db.get_called_booking(doctor_id)?,
        })
    }

    /// Every booking the patient has made, most recent first.
    pub fn booking_history(&self, patient_id: &str) -> LedgerResult<Vec<Booking>> {
        Ok(self.db.list_bookings_for_patient(patient_id)?)
    }

    /// The patient's medical records, newest first.
    pub fn medical_records(&self, patient_id: &str) -> LedgerResult<Vec<MedicalRecord>> {
        Ok(self.db.list_records_for_patient(patient_id)?)
    }
}

//! Booking creation and status transitions.

use std::thread;
use std::time::Duration;

use log::{info, warn};

use super::{now, LedgerError, LedgerResult, QueueLedger};
use crate::config::ActiveBookingScope;
use crate::models::{Booking, BookingStatus, ChangeKind, MedicalRecord, RecordDraft, Role};

impl<'a> QueueLedger<'a> {
    /// Put a patient at the back of a doctor's queue.
    ///
    /// The queue number is one more than the highest ever issued for the
    /// doctor. Lost races against other writers are retried up to
    /// `max_booking_attempts` times before `ConcurrencyConflict` is returned.
    pub fn create_booking(&self, doctor_id: &str, patient_id: &str) -> LedgerResult<Booking> {
        let max_attempts = self.config.max_booking_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.try_create_booking(doctor_id, patient_id) {
                Err(LedgerError::ConcurrencyConflict { .. }) if attempt < max_attempts => {
                    warn!(
                        "Booking contention for doctor {} (attempt {}/{}), retrying",
                        doctor_id, attempt, max_attempts
                    );
                    let backoff = self.config.retry_backoff_ms.saturating_mul(attempt as u64);
                    thread::sleep(Duration::from_millis(backoff));
                }
                Err(LedgerError::ConcurrencyConflict { doctor_id, .. }) => {
                    warn!(
                        "Giving up booking for doctor {} after {} attempts",
                        doctor_id, attempt
                    );
                    return Err(LedgerError::ConcurrencyConflict {
                        doctor_id,
                        attempts: attempt,
                    });
                }
                result => return result,
            }
        }
    }

    fn try_create_booking(&self, doctor_id: &str, patient_id: &str) -> LedgerResult<Booking> {
        let tx = self
            .db
            .immediate_transaction()
            .map_err(|e| self.contention(doctor_id, e))?;

        let doctor = self
            .db
            .get_doctor(doctor_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("doctor {}", doctor_id)))?;
        if !doctor.is_available {
            return Err(LedgerError::DoctorUnavailable(doctor_id.to_string()));
        }

        let patient = self
            .db
            .get_profile(patient_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("patient {}", patient_id)))?;
        if patient.role != Role::Patient {
            return Err(LedgerError::InvalidInput(format!(
                "profile {} is not a patient",
                patient_id
            )));
        }

        let scope = match self.config.active_booking_scope {
            ActiveBookingScope::PerDoctor => Some(doctor_id),
            ActiveBookingScope::AnyDoctor => None,
        };
        if self.db.has_active_booking(patient_id, scope)? {
            return Err(LedgerError::DuplicateBooking {
                patient_id: patient_id.to_string(),
                doctor_id: doctor_id.to_string(),
            });
        }

        let queue_number = self.db.max_queue_number(doctor_id)? + 1;
        let booking = Booking::new(doctor_id.to_string(), patient_id.to_string(), queue_number);
        self.db
            .insert_booking(&booking)
            .map_err(|e| self.contention(doctor_id, e))?;

        let change =
            self.db
                .append_booking_event(&booking.id, doctor_id, ChangeKind::Booked, &booking.booked_at)?;

        tx.commit()
            .map_err(|e| self.contention(doctor_id, e.into()))?;

        info!(
            "Booked queue #{} with doctor {} (booking {})",
            booking.queue_number, doctor_id, booking.id
        );
        self.publish(&[change]);
        Ok(booking)
    }

    /// Call the waiting patient with the lowest queue number.
    pub fn call_next(&self, doctor_id: &str) -> LedgerResult<Booking> {
        let tx = self
            .db
            .immediate_transaction()
            .map_err(|e| self.contention(doctor_id, e))?;

        if self.db.get_doctor(doctor_id)?.is_none() {
            return Err(LedgerError::NotFound(format!("doctor {}", doctor_id)));
        }

        if let Some(current) = self.db.get_called_booking(doctor_id)? {
            return Err(LedgerError::AlreadyCalled {
                doctor_id: doctor_id.to_string(),
                queue_number: current.queue_number,
            });
        }

        let mut booking = self
            .db
            .get_next_waiting_booking(doctor_id)?
            .ok_or_else(|| LedgerError::NoWaitingPatients(doctor_id.to_string()))?;

        let called_at = now();
        booking.status = BookingStatus::Called;
        booking.called_at = Some(called_at.clone());

        if !self.db.update_booking_status(&booking, BookingStatus::Waiting)? {
            return Err(LedgerError::ConcurrencyConflict {
                doctor_id: doctor_id.to_string(),
                attempts: 1,
            });
        }

        let change = self
            .db
            .append_booking_event(&booking.id, doctor_id, ChangeKind::Called, &called_at)?;

        tx.commit()
            .map_err(|e| self.contention(doctor_id, e.into()))?;

        info!(
            "Doctor {} called queue #{} (booking {})",
            doctor_id, booking.queue_number, booking.id
        );
        self.publish(&[change]);
        Ok(booking)
    }

    /// Mark the called booking as completed.
    pub fn complete_booking(&self, booking_id: &str) -> LedgerResult<Booking> {
        let (booking, ()) = self.complete_with(booking_id, |_| Ok(()))?;
        Ok(booking)
    }

    /// Complete a booking and store its medical record as one unit.
    ///
    /// If the record cannot be written, the booking keeps its previous status.
    pub fn complete_with_record(
        &self,
        booking_id: &str,
        draft: RecordDraft,
    ) -> LedgerResult<(Booking, MedicalRecord)> {
        self.complete_with(booking_id, |booking| {
            let record = MedicalRecord::for_booking(booking, draft);
            self.db.insert_medical_record(&record).map_err(|e| {
                if e.is_check_violation() {
                    LedgerError::InvalidInput("a diagnosis is required".into())
                } else {
                    e.into()
                }
            })?;
            Ok(record)
        })
    }

    /// Shared completion path. `attach` runs inside the transaction after the
    /// status write; an error from it rolls the transition back.
    fn complete_with<T>(
        &self,
        booking_id: &str,
        attach: impl FnOnce(&Booking) -> LedgerResult<T>,
    ) -> LedgerResult<(Booking, T)> {
        // doctor_id is immutable, so it can be read before taking the lock
        let doctor_id = self
            .db
            .get_booking(booking_id)?
            .map(|booking| booking.doctor_id)
            .ok_or_else(|| LedgerError::NotFound(format!("booking {}", booking_id)))?;

        let tx = self
            .db
            .immediate_transaction()
            .map_err(|e| self.contention(&doctor_id, e))?;

        let mut booking = self
            .db
            .get_booking(booking_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("booking {}", booking_id)))?;
        let from = booking.status;
        let completed_at = now();

        let mut kinds = Vec::with_capacity(2);
        match from {
            _ if from.can_transition_to(BookingStatus::Completed) => {}
            BookingStatus::Waiting if self.config.allow_complete_from_waiting => {
                // Recorded as passing through called at the same instant
                booking.called_at = Some(completed_at.clone());
                kinds.push(ChangeKind::Called);
            }
            _ => {
                return Err(LedgerError::InvalidStateTransition {
                    booking_id: booking_id.to_string(),
                    from,
                    to: BookingStatus::Completed,
                })
            }
        }
        kinds.push(ChangeKind::Completed);

        booking.status = BookingStatus::Completed;
        booking.completed_at = Some(completed_at.clone());

        if !self.db.update_booking_status(&booking, from)? {
            return Err(LedgerError::ConcurrencyConflict {
                doctor_id: booking.doctor_id.clone(),
                attempts: 1,
            });
        }

        let mut changes = Vec::with_capacity(kinds.len());
        for kind in kinds {
            changes.push(self.db.append_booking_event(
                &booking.id,
                &booking.doctor_id,
                kind,
                &completed_at,
            )?);
        }

        let attached = attach(&booking)?;
        tx.commit()
            .map_err(|e| self.contention(&doctor_id, e.into()))?;

        info!(
            "Doctor {} completed queue #{} (booking {})",
            booking.doctor_id, booking.queue_number, booking.id
        );
        self.publish(&changes);
        Ok((booking, attached))
    }
}

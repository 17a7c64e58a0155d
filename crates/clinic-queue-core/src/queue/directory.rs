//! Profiles and the doctor directory, as seen from the ledger.

use log::info;

use super::{LedgerError, LedgerResult, QueueLedger};
use crate::models::{Doctor, Profile, Role};

impl<'a> QueueLedger<'a> {
    /// Register a profile for an authenticated identity.
    pub fn create_profile(&self, full_name: &str, role: Role) -> LedgerResult<Profile> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(LedgerError::InvalidInput("full name is required".into()));
        }
        let profile = Profile::new(full_name.to_string(), role);
        self.db.insert_profile(&profile)?;
        Ok(profile)
    }

    pub fn profile(&self, profile_id: &str) -> LedgerResult<Profile> {
        self.db
            .get_profile(profile_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("profile {}", profile_id)))
    }

    /// The doctor row for a doctor profile, created with defaults on first use.
    pub fn ensure_doctor(&self, profile_id: &str) -> LedgerResult<Doctor> {
        let tx = self.db.immediate_transaction()?;

        if let Some(doctor) = self.db.get_doctor_by_profile(profile_id)? {
            return Ok(doctor);
        }

        let profile = self
            .db
            .get_profile(profile_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("profile {}", profile_id)))?;
        if profile.role != Role::Doctor {
            return Err(LedgerError::InvalidInput(format!(
                "profile {} is not a doctor",
                profile_id
            )));
        }

        let doctor = Doctor::new(
            profile.id,
            profile.full_name,
            self.config.default_specialization.clone(),
            self.config.default_consultation_minutes.max(1),
        );
        self.db.insert_doctor(&doctor)?;
        tx.commit()?;

        info!("Created doctor {} for profile {}", doctor.id, profile_id);
        Ok(doctor)
    }

    pub fn doctor(&self, doctor_id: &str) -> LedgerResult<Doctor> {
        self.db
            .get_doctor(doctor_id)?
            .ok_or_else(|| LedgerError::NotFound(format!("doctor {}", doctor_id)))
    }

    /// Doctors patients can currently book with.
    pub fn available_doctors(&self) -> LedgerResult<Vec<Doctor>> {
        Ok(self.db.list_available_doctors()?)
    }

    /// Set the consultation length of the doctor owning `profile_id`.
    ///
    /// Wait estimates of patients already in the queue change with it.
    pub fn update_consultation_minutes(&self, profile_id: &str, minutes: u32) -> LedgerResult<()> {
        if minutes == 0 {
            return Err(LedgerError::InvalidInput(
                "consultation time must be at least one minute".into(),
            ));
        }
        if !self.db.update_consultation_minutes(profile_id, minutes)? {
            return Err(LedgerError::NotFound(format!("doctor for profile {}", profile_id)));
        }
        info!("Consultation time for profile {} set to {} min", profile_id, minutes);
        Ok(())
    }

    /// Open or close a doctor's queue to new bookings. Existing bookings stay.
    pub fn set_availability(&self, doctor_id: &str, is_available: bool) -> LedgerResult<()> {
        if !self.db.set_doctor_availability(doctor_id, is_available)? {
            return Err(LedgerError::NotFound(format!("doctor {}", doctor_id)));
        }
        Ok(())
    }
}

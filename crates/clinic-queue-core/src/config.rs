//! Ledger configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_BOOKING_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 20;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONSULTATION_MINUTES: u32 = 15;
pub const DEFAULT_SPECIALIZATION: &str = "General Practice";

/// Which active bookings block a patient from booking again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveBookingScope {
    /// One active booking per doctor; a patient may queue with several doctors.
    PerDoctor,
    /// One active booking in total, whichever doctor holds it.
    AnyDoctor,
}

/// Tunables for the queue ledger and its database connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Attempts at `create_booking` before a contention error is surfaced
    pub max_booking_attempts: u32,
    /// Sleep between booking attempts, multiplied by the attempt number
    pub retry_backoff_ms: u64,
    /// How long a connection waits on another writer's lock
    pub busy_timeout_ms: u64,
    /// Duplicate booking policy
    pub active_booking_scope: ActiveBookingScope,
    /// Accept completing a `waiting` booking directly (recorded as called, then completed)
    pub allow_complete_from_waiting: bool,
    /// Consultation length given to auto-created doctor rows
    pub default_consultation_minutes: u32,
    /// Specialization given to auto-created doctor rows
    pub default_specialization: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_booking_attempts: DEFAULT_MAX_BOOKING_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            active_booking_scope: ActiveBookingScope::PerDoctor,
            allow_complete_from_waiting: false,
            default_consultation_minutes: DEFAULT_CONSULTATION_MINUTES,
            default_specialization: DEFAULT_SPECIALIZATION.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON config; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(json)?;
        config.max_booking_attempts = config.max_booking_attempts.max(1);
        config.default_consultation_minutes = config.default_consultation_minutes.max(1);
        Ok(config)
    }
}

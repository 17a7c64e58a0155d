//! Domain models for the clinic queue.

mod booking;
mod change;
mod doctor;
mod profile;
mod queue;
mod record;

pub use booking::*;
pub use change::*;
pub use doctor::*;
pub use profile::*;
pub use queue::*;
pub use record::*;

//! Change notification for queue bookings.
//!
//! Two ways to observe the queue:
//!
//! - [`ChangeFeed`] pushes committed changes to subscribers in this process.
//! - [`ChangeCursor`] pulls from the persisted change log, so a reader in
//!   another process sees the same sequence of changes.

use std::sync::{Mutex, PoisonError};

use log::debug;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::db::{Database, DbResult};
use crate::models::BookingChange;

/// Receiving end of a feed subscription.
pub type Subscription = UnboundedReceiver<BookingChange>;

struct Subscriber {
    doctor_id: Option<String>,
    sender: UnboundedSender<BookingChange>,
}

impl Subscriber {
    fn wants(&self, change: &BookingChange) -> bool {
        self.doctor_id
            .as_deref()
            .map_or(true, |doctor_id| doctor_id == change.doctor_id)
    }
}

/// In-process fan-out of committed booking changes.
///
/// Dropped subscriptions are pruned on the next publish.
#[derive(Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<Subscriber>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes to one doctor's queue.
    pub fn subscribe_doctor(&self, doctor_id: &str) -> Subscription {
        self.subscribe(Some(doctor_id.to_string()))
    }

    /// Changes to every queue.
    pub fn subscribe_all(&self) -> Subscription {
        self.subscribe(None)
    }

    fn subscribe(&self, doctor_id: Option<String>) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber { doctor_id, sender });
        receiver
    }

    /// Deliver a change to matching subscribers. Returns how many received it.
    pub fn publish(&self, change: &BookingChange) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut delivered = 0;
        subscribers.retain(|subscriber| {
            if subscriber.sender.is_closed() {
                return false;
            }
            if subscriber.wants(change) {
                if subscriber.sender.send(change.clone()).is_err() {
                    return false;
                }
                delivered += 1;
            }
            true
        });

        debug!(
            "Change #{} ({}) delivered to {} subscriber(s)",
            change.seq,
            change.kind.as_str(),
            delivered
        );
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Default number of changes returned by one [`ChangeCursor::poll`].
pub const DEFAULT_POLL_BATCH: usize = 100;

/// Position in the persisted change log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeCursor {
    doctor_id: Option<String>,
    last_seq: i64,
    batch_size: usize,
}

impl ChangeCursor {
    /// Cursor over every queue, starting at the beginning of the log.
    pub fn all() -> Self {
        Self {
            doctor_id: None,
            last_seq: 0,
            batch_size: DEFAULT_POLL_BATCH,
        }
    }

    /// Cursor over one doctor's queue, starting at the beginning of the log.
    pub fn for_doctor(doctor_id: &str) -> Self {
        Self {
            doctor_id: Some(doctor_id.to_string()),
            ..Self::all()
        }
    }

    pub fn starting_after(mut self, seq: i64) -> Self {
        self.last_seq = seq;
        self
    }

    /// Skip everything already in the log.
    pub fn from_latest(self, db: &Database) -> DbResult<Self> {
        let seq = db.latest_event_seq()?;
        Ok(self.starting_after(seq))
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn last_seq(&self) -> i64 {
        self.last_seq
    }

    /// Changes committed since the last poll, oldest first.
    pub fn poll(&mut self, db: &Database) -> DbResult<Vec<BookingChange>> {
        let changes =
            db.list_booking_events(self.last_seq, self.doctor_id.as_deref(), self.batch_size)?;
        if let Some(last) = changes.last() {
            self.last_seq = last.seq;
        }
        Ok(changes)
    }
}

//! Queue ledger integration tests.

use clinic_queue_core::config::{ActiveBookingScope, LedgerConfig};
use clinic_queue_core::db::Database;
use clinic_queue_core::models::{BookingStatus, ChangeKind, Doctor, RecordDraft, Role};
use clinic_queue_core::notify::{ChangeCursor, ChangeFeed};
use clinic_queue_core::queue::{LedgerError, QueueLedger};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Clinic {
    db: Database,
    config: LedgerConfig,
}

impl Clinic {
    fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    fn with_config(config: LedgerConfig) -> Self {
        init_logging();
        Self {
            db: Database::open_in_memory().unwrap(),
            config,
        }
    }

    fn ledger(&self) -> QueueLedger<'_> {
        QueueLedger::new(&self.db, &self.config)
    }

    fn doctor(&self, name: &str) -> Doctor {
        let ledger = self.ledger();
        let profile = ledger.create_profile(name, Role::Doctor).unwrap();
        ledger.ensure_doctor(&profile.id).unwrap()
    }

    fn patient(&self, name: &str) -> String {
        self.ledger().create_profile(name, Role::Patient).unwrap().id
    }
}

#[test]
fn test_first_patient_is_called_and_second_waits() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");
    let ben = clinic.patient("Ben");

    let first = ledger.create_booking(&doctor.id, &ana).unwrap();
    let second = ledger.create_booking(&doctor.id, &ben).unwrap();
    assert_eq!(first.queue_number, 1);
    assert_eq!(second.queue_number, 2);
    assert_eq!(second.status, BookingStatus::Waiting);

    assert_eq!(ledger.count_ahead(&doctor.id, 2, &ben).unwrap(), 1);
    assert_eq!(ledger.estimated_wait(&doctor.id, 2, &ben).unwrap(), 15);

    let called = ledger.call_next(&doctor.id).unwrap();
    assert_eq!(called.id, first.id);

    // The called patient still counts as ahead until completed
    assert_eq!(ledger.count_ahead(&doctor.id, 2, &ben).unwrap(), 1);

    ledger.complete_booking(&first.id).unwrap();
    assert_eq!(ledger.count_ahead(&doctor.id, 2, &ben).unwrap(), 0);

    let next = ledger.call_next(&doctor.id).unwrap();
    assert_eq!(next.id, second.id);
    assert_eq!(next.queue_number, 2);
}

#[test]
fn test_duplicate_active_booking_rejected() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");

    ledger.create_booking(&doctor.id, &ana).unwrap();
    let err = ledger.create_booking(&doctor.id, &ana).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateBooking { .. }));
    assert_eq!(err.user_message(), "You are already in the queue.");

    // Rejected attempt issued no number
    let ben = clinic.patient("Ben");
    assert_eq!(ledger.create_booking(&doctor.id, &ben).unwrap().queue_number, 2);
}

#[test]
fn test_per_doctor_scope_allows_other_doctors() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let cardio = clinic.doctor("Dr. Heart");
    let derm = clinic.doctor("Dr. Skin");
    let ana = clinic.patient("Ana");

    ledger.create_booking(&cardio.id, &ana).unwrap();
    let other = ledger.create_booking(&derm.id, &ana).unwrap();
    assert_eq!(other.queue_number, 1);
    assert_eq!(ledger.queue_positions(&ana).unwrap().len(), 2);
}

#[test]
fn test_any_doctor_scope_blocks_second_queue() {
    let clinic = Clinic::with_config(LedgerConfig {
        active_booking_scope: ActiveBookingScope::AnyDoctor,
        ..LedgerConfig::default()
    });
    let ledger = clinic.ledger();
    let cardio = clinic.doctor("Dr. Heart");
    let derm = clinic.doctor("Dr. Skin");
    let ana = clinic.patient("Ana");

    let booking = ledger.create_booking(&cardio.id, &ana).unwrap();
    assert!(matches!(
        ledger.create_booking(&derm.id, &ana),
        Err(LedgerError::DuplicateBooking { .. })
    ));

    ledger.call_next(&cardio.id).unwrap();
    ledger.complete_booking(&booking.id).unwrap();
    assert!(ledger.create_booking(&derm.id, &ana).is_ok());
}

#[test]
fn test_second_call_while_one_is_called() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    for name in ["Ana", "Ben"] {
        let patient = clinic.patient(name);
        ledger.create_booking(&doctor.id, &patient).unwrap();
    }

    ledger.call_next(&doctor.id).unwrap();
    match ledger.call_next(&doctor.id) {
        Err(LedgerError::AlreadyCalled { queue_number, .. }) => assert_eq!(queue_number, 1),
        other => panic!("expected AlreadyCalled, got {:?}", other),
    }
}

#[test]
fn test_complete_requires_called() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");

    let booking = ledger.create_booking(&doctor.id, &ana).unwrap();
    match ledger.complete_booking(&booking.id) {
        Err(LedgerError::InvalidStateTransition { from, to, .. }) => {
            assert_eq!(from, BookingStatus::Waiting);
            assert_eq!(to, BookingStatus::Completed);
        }
        other => panic!("expected InvalidStateTransition, got {:?}", other),
    }
    let stored = clinic.db.get_booking(&booking.id).unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Waiting);
}

#[test]
fn test_completion_is_final() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");

    let booking = ledger.create_booking(&doctor.id, &ana).unwrap();
    ledger.call_next(&doctor.id).unwrap();
    let done = ledger.complete_booking(&booking.id).unwrap();
    assert!(done.completed_at.is_some());

    assert!(matches!(
        ledger.complete_booking(&booking.id),
        Err(LedgerError::InvalidStateTransition {
            from: BookingStatus::Completed,
            ..
        })
    ));
    assert_eq!(clinic.db.get_booking(&booking.id).unwrap().unwrap(), done);
}

#[test]
fn test_unavailable_doctor_keeps_existing_queue() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");
    let ben = clinic.patient("Ben");

    ledger.create_booking(&doctor.id, &ana).unwrap();
    ledger.set_availability(&doctor.id, false).unwrap();

    assert!(matches!(
        ledger.create_booking(&doctor.id, &ben),
        Err(LedgerError::DoctorUnavailable(_))
    ));
    assert!(ledger.available_doctors().unwrap().is_empty());

    // Already queued patients are still served
    assert_eq!(ledger.call_next(&doctor.id).unwrap().patient_id, ana);
}

#[test]
fn test_wait_follows_consultation_change() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let patients: Vec<String> = ["Ana", "Ben", "Cy"].iter().map(|n| clinic.patient(n)).collect();
    for patient in &patients {
        ledger.create_booking(&doctor.id, patient).unwrap();
    }

    let before = ledger.queue_positions(&patients[2]).unwrap();
    assert_eq!(before[0].estimated_wait_minutes, 30);

    ledger.update_consultation_minutes(&doctor.profile_id, 25).unwrap();
    let after = ledger.queue_positions(&patients[2]).unwrap();
    assert_eq!(after[0].patients_ahead, 2);
    assert_eq!(after[0].estimated_wait_minutes, 50);
}

#[test]
fn test_complete_with_record_visible_to_patient() {
    let clinic = Clinic::new();
    let ledger = clinic.ledger();
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");

    let booking = ledger.create_booking(&doctor.id, &ana).unwrap();
    ledger.call_next(&doctor.id).unwrap();
    let (done, record) = ledger
        .complete_with_record(
            &booking.id,
            RecordDraft {
                diagnosis: "Seasonal allergies".into(),
                prescription: Some("Cetirizine 10mg daily".into()),
                notes: None,
            },
        )
        .unwrap();

    assert_eq!(done.status, BookingStatus::Completed);
    assert_eq!(record.booking_id, booking.id);
    assert_eq!(record.doctor_id, doctor.id);

    let records = ledger.medical_records(&ana).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].diagnosis, "Seasonal allergies");
}

#[test]
fn test_feed_and_cursor_see_same_changes() {
    let clinic = Clinic::new();
    let feed = ChangeFeed::new();
    let mut subscription = feed.subscribe_all();
    let ledger = clinic.ledger().with_feed(&feed);
    let doctor = clinic.doctor("Dr. Okafor");
    let ana = clinic.patient("Ana");

    let booking = ledger.create_booking(&doctor.id, &ana).unwrap();
    ledger.call_next(&doctor.id).unwrap();
    ledger.complete_booking(&booking.id).unwrap();

    let mut pushed = Vec::new();
    while let Ok(change) = subscription.try_recv() {
        pushed.push(change);
    }

    let mut cursor = ChangeCursor::for_doctor(&doctor.id);
    let polled = cursor.poll(&clinic.db).unwrap();

    assert_eq!(pushed, polled);
    assert_eq!(
        polled.iter().map(|c| c.kind).collect::<Vec<_>>(),
        vec![ChangeKind::Booked, ChangeKind::Called, ChangeKind::Completed]
    );
    assert!(polled.windows(2).all(|w| w[0].seq < w[1].seq));
}

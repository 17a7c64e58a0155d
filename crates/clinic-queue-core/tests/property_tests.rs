//! Randomized operation sequences checked against a plain in-memory model.

use clinic_queue_core::config::LedgerConfig;
use clinic_queue_core::db::Database;
use clinic_queue_core::models::{BookingStatus, Role};
use clinic_queue_core::queue::{LedgerError, QueueLedger};
use proptest::prelude::*;

const PATIENTS: usize = 5;

#[derive(Debug, Clone)]
enum Op {
    Book(usize),
    CallNext,
    CompleteCurrent,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..PATIENTS).prop_map(Op::Book),
        1 => Just(Op::CallNext),
        1 => Just(Op::CompleteCurrent),
    ]
}

struct ModelBooking {
    id: String,
    patient: usize,
    queue_number: u32,
    status: BookingStatus,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_queue_matches_model(ops in prop::collection::vec(op(), 1..40)) {
        let db = Database::open_in_memory().unwrap();
        let config = LedgerConfig::default();
        let ledger = QueueLedger::new(&db, &config);

        let doctor_profile = ledger.create_profile("Dr. Model", Role::Doctor).unwrap();
        let doctor = ledger.ensure_doctor(&doctor_profile.id).unwrap();
        let patients: Vec<String> = (0..PATIENTS)
            .map(|i| ledger.create_profile(&format!("P{}", i), Role::Patient).unwrap().id)
            .collect();

        let mut model: Vec<ModelBooking> = Vec::new();
        let mut issued = 0u32;

        for op in ops {
            match op {
                Op::Book(p) => {
                    let result = ledger.create_booking(&doctor.id, &patients[p]);
                    let has_active = model.iter().any(|b| b.patient == p && b.status.is_active());
                    if has_active {
                        let is_duplicate = matches!(result, Err(LedgerError::DuplicateBooking { .. }));
                        prop_assert!(is_duplicate);
                    } else {
                        let booking = result.unwrap();
                        issued += 1;
                        prop_assert_eq!(booking.queue_number, issued);
                        model.push(ModelBooking {
                            id: booking.id,
                            patient: p,
                            queue_number: booking.queue_number,
                            status: BookingStatus::Waiting,
                        });
                    }
                }
                Op::CallNext => {
                    let result = ledger.call_next(&doctor.id);
                    let has_called = model.iter().any(|b| b.status == BookingStatus::Called);
                    let next = model
                        .iter_mut()
                        .filter(|b| b.status == BookingStatus::Waiting)
                        .min_by_key(|b| b.queue_number);
                    match next {
                        _ if has_called => {
                            let is_already = matches!(result, Err(LedgerError::AlreadyCalled { .. }));
                            prop_assert!(is_already);
                        }
                        None => {
                            let is_empty = matches!(result, Err(LedgerError::NoWaitingPatients(_)));
                            prop_assert!(is_empty);
                        }
                        Some(expected) => {
                            prop_assert_eq!(result.unwrap().id, expected.id.clone());
                            expected.status = BookingStatus::Called;
                        }
                    }
                }
                Op::CompleteCurrent => {
                    if let Some(current) = model.iter_mut().find(|b| b.status == BookingStatus::Called) {
                        ledger.complete_booking(&current.id).unwrap();
                        current.status = BookingStatus::Completed;
                    }
                }
            }

            for booking in model.iter().filter(|b| b.status.is_active()) {
                let expected = model
                    .iter()
                    .filter(|other| {
                        other.status.is_active()
                            && other.queue_number < booking.queue_number
                            && other.patient != booking.patient
                    })
                    .count() as u32;
                let ahead = ledger
                    .count_ahead(&doctor.id, booking.queue_number, &patients[booking.patient])
                    .unwrap();
                prop_assert_eq!(ahead, expected);
            }

            let summary = ledger.queue_summary(&doctor.id).unwrap();
            let waiting = model.iter().filter(|b| b.status == BookingStatus::Waiting).count() as u32;
            prop_assert_eq!(summary.waiting_count, waiting);
        }
    }
}

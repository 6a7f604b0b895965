//! Property tests for the participation record invariants.
//!
//! Drives a single [`EventRecord`] through arbitrary operation
//! interleavings and checks, after every step, the two invariants that
//! must hold at all times:
//!
//! 1. The approved and pending sets are disjoint.
//! 2. The approved set never exceeds `required_slots`.
//!
//! Run with: `cargo test --test invariants`

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use clubhub_participation::{
    Capacity, Decision, EventId, EventRecord, EventStatus, ParticipationError, UserId,
};
use proptest::prelude::*;
use uuid::Uuid;

/// One step of the state machine, over a small pool of users
#[derive(Clone, Debug)]
enum Op {
    Request(u8),
    Approve(u8),
    Reject(u8),
    Withdraw(u8),
    Close,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..8).prop_map(Op::Request),
        (0u8..8).prop_map(Op::Approve),
        (0u8..8).prop_map(Op::Reject),
        (0u8..8).prop_map(Op::Withdraw),
        Just(Op::Close),
    ]
}

/// Stable user id per pool index, so repeated ops target the same user
fn user(index: u8) -> UserId {
    UserId::from_uuid(Uuid::from_u128(0x1000 + u128::from(index)))
}

fn fresh_record(slots: u32, allow_waitlist: bool) -> EventRecord {
    let now = Utc::now();
    EventRecord::new(
        EventId::new(),
        Capacity::new(slots),
        allow_waitlist,
        now + Duration::days(3),
        now + Duration::days(3) + Duration::hours(1),
        now,
    )
}

fn assert_invariants(record: &EventRecord) {
    // Disjointness
    for approved in record.approved_participants() {
        assert!(
            !record.pending_requests().contains(approved),
            "user {approved} appears in both approved and pending"
        );
    }

    // Capacity is never exceeded
    assert!(
        record.approved_count() <= record.required_slots().value() as usize,
        "approved {} exceeds required slots {}",
        record.approved_count(),
        record.required_slots()
    );

    // Status derivation is consistent with the counts
    match record.status() {
        EventStatus::Full => {
            assert_eq!(record.slots_left(), 0);
        },
        EventStatus::Open => {
            assert!(record.slots_left() > 0);
        },
        EventStatus::Closed => {},
    }
}

proptest! {
    #[test]
    fn invariants_hold_under_arbitrary_interleavings(
        slots in 1u32..5,
        allow_waitlist in any::<bool>(),
        ops in proptest::collection::vec(op_strategy(), 1..64),
    ) {
        let mut record = fresh_record(slots, allow_waitlist);

        for op in ops {
            let result = match op {
                Op::Request(index) => record.request_to_join(user(index)).map(|_| ()),
                Op::Approve(index) => record.decide(user(index), Decision::Approve),
                Op::Reject(index) => record.decide(user(index), Decision::Reject),
                Op::Withdraw(index) => record.withdraw(user(index)),
                Op::Close => {
                    record.close();
                    Ok(())
                },
            };

            // Every failure is one of the six typed kinds; none corrupts state
            if let Err(error) = result {
                let is_typed_kind = matches!(
                    error,
                    ParticipationError::EventClosed { .. }
                        | ParticipationError::EventFull { .. }
                        | ParticipationError::AlreadyRequested { .. }
                        | ParticipationError::NotPending { .. }
                        | ParticipationError::CapacityExceeded { .. }
                        | ParticipationError::NotFound { .. }
                );
                prop_assert!(is_typed_kind);
            }

            assert_invariants(&record);
        }
    }

    #[test]
    fn requests_are_not_idempotent(
        slots in 1u32..5,
        allow_waitlist in any::<bool>(),
    ) {
        let mut record = fresh_record(slots, allow_waitlist);
        let requester = user(0);

        prop_assert!(record.request_to_join(requester).is_ok());
        prop_assert_eq!(
            record.request_to_join(requester),
            Err(ParticipationError::AlreadyRequested {
                event_id: record.id(),
                user_id: requester,
            })
        );
        prop_assert_eq!(record.pending_count(), 1);
    }
}

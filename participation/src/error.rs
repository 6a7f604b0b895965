//! Error types for the Event Participation Engine.
//!
//! Every error here is local, deterministic given current state, and
//! recoverable by the caller. The engine never retries on its own; retry
//! policy, if any, belongs to the caller.

use crate::types::{Capacity, EventId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the participation operations
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationError {
    /// The event is administratively closed to new requests
    #[error("event {event_id} is closed")]
    EventClosed {
        /// Event the request targeted
        event_id: EventId,
    },

    /// Every slot is taken and the event does not accept a waitlist
    #[error("event {event_id} is full and does not accept a waitlist")]
    EventFull {
        /// Event the request targeted
        event_id: EventId,
    },

    /// The user already sits in the pending or approved set
    #[error("user {user_id} already has a request or slot for event {event_id}")]
    AlreadyRequested {
        /// Event the request targeted
        event_id: EventId,
        /// User who requested twice
        user_id: UserId,
    },

    /// The user has no pending request to decide on
    #[error("user {user_id} has no pending request for event {event_id}")]
    NotPending {
        /// Event the decision targeted
        event_id: EventId,
        /// User the decision targeted
        user_id: UserId,
    },

    /// Approving would push the participant count past capacity
    ///
    /// The organizer must free a slot first; expanding capacity is out
    /// of scope for this engine.
    #[error("event {event_id} already has all {required_slots} slots taken")]
    CapacityExceeded {
        /// Event the approval targeted
        event_id: EventId,
        /// The fixed capacity that is already reached
        required_slots: Capacity,
    },

    /// The event is unknown, or the user appears in neither the approved
    /// nor the pending set
    #[error("no participation to operate on for event {event_id}")]
    NotFound {
        /// Event the operation targeted
        event_id: EventId,
    },
}

/// Errors returned when registering an event with the engine
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum RegistrationError {
    /// An event with this id is already registered
    #[error("event {event_id} is already registered")]
    DuplicateEvent {
        /// The id that collided
        event_id: EventId,
    },

    /// Capacity must be a positive number of slots
    #[error("required slots must be greater than zero")]
    ZeroCapacity,
}

//! # ClubHub Participation
//!
//! The Event Participation Engine for the ClubHub platform: owns the
//! lifecycle of each event's capacity and the set of users requesting,
//! pending, approved, or waitlisted for it.
//!
//! # Architecture
//!
//! ```text
//!                    ParticipationEngine
//!                (typed request/response API)
//!                           │
//!          ┌────────────────┼────────────────┐
//!          ▼                ▼                ▼
//!    Store<Roster>    Store<Roster>    Store<Roster>     one per event
//!    (write lock =    (write lock =    (write lock =
//!     single writer)   single writer)   single writer)
//!          │                │                │
//!          ▼                ▼                ▼
//!     EventRecord      EventRecord      EventRecord      the state machine
//! ```
//!
//! - [`record::EventRecord`] is the state machine: capacity accounting,
//!   disjoint approved/pending sets, derived status. All rules live here.
//! - [`roster`] wraps one record in a reducer for action-driven
//!   consumers (`Store::send`).
//! - [`engine::ParticipationEngine`] is the request/response surface:
//!   one store per event, so mutations serialize per record while
//!   different events proceed in parallel. It also carries the feed
//!   read surface (`events_by_recency`, `open_events`).
//!
//! # Guarantees
//!
//! - A user appears in at most one of {approved, pending} per event.
//! - `approved_participants` never exceeds `required_slots`; the check
//!   runs inside the serialized mutation path, so concurrent approvals
//!   cannot jointly overshoot.
//! - Status (`open` / `full` / `closed`) is derived on every read and
//!   never stored.
//! - Withdrawal never auto-promotes from the waitlist; promotion is an
//!   explicit organizer approval.
//!
//! # Example
//!
//! ```ignore
//! use clubhub_core::environment::SystemClock;
//! use clubhub_participation::{Capacity, Decision, ParticipationEngine};
//! use std::sync::Arc;
//!
//! let engine = ParticipationEngine::new(Arc::new(SystemClock));
//! engine.register_event(event_id, Capacity::new(2), true, starts_at, ends_at).await?;
//!
//! engine.request_to_join(event_id, user_id).await?;
//! engine.decide(event_id, user_id, Decision::Approve).await?;
//! ```

/// The engine facade: per-event stores and the feed read surface
pub mod engine;
/// Typed errors for participation and registration
pub mod error;
/// The per-event participation record (the state machine)
pub mod record;
/// Action-driven reducer surface over one record
pub mod roster;
/// Identifiers, value objects, and derived view types
pub mod types;

pub use engine::{EngineError, ParticipationEngine};
pub use error::{ParticipationError, RegistrationError};
pub use record::EventRecord;
pub use roster::{RosterAction, RosterEnvironment, RosterReducer, RosterState};
pub use types::{
    Capacity, Decision, EventId, EventStatus, JoinButton, JoinOutcome, ParticipationView, UserId,
};

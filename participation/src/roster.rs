//! Roster reducer - the action-driven surface of one event's record.
//!
//! Wraps a single [`EventRecord`] for use with the `clubhub_runtime`
//! Store. The Store runs the reducer under its write lock, which gives
//! each event a single-writer mutation path; reads go through
//! `Store::state` concurrently.
//!
//! All business rules live on [`EventRecord`]; this reducer only routes
//! commands into the record and keeps the last failure around for
//! observers. Callers that need the operation result directly use
//! [`crate::engine::ParticipationEngine`] instead of the action pipeline.

use crate::error::ParticipationError;
use crate::record::EventRecord;
use crate::types::{Decision, JoinOutcome, UserId};
use clubhub_core::environment::Clock;
use clubhub_core::{SmallVec, effect::Effect, reducer::Reducer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Actions accepted by the roster reducer
///
/// Commands only: the roster has no event-sourcing pipeline, so applied
/// changes are visible through state reads rather than emitted events.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum RosterAction {
    /// A user asks to join the event
    RequestToJoin {
        /// The requesting user
        user_id: UserId,
    },

    /// An organizer decides on a pending request
    ///
    /// Authorization (who may decide) is enforced by the caller.
    Decide {
        /// The user the decision is about
        user_id: UserId,
        /// Approve or reject
        decision: Decision,
    },

    /// A participant or requester cancels their involvement
    Withdraw {
        /// The withdrawing user
        user_id: UserId,
    },

    /// The authoring collaborator closes the event to new requests
    Close,
}

/// Environment dependencies for the roster reducer
#[derive(Clone)]
pub struct RosterEnvironment {
    /// Clock for timestamps in logs
    pub clock: Arc<dyn Clock>,
}

impl RosterEnvironment {
    /// Creates a new `RosterEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// State managed by the roster reducer
#[derive(Clone, Debug)]
pub struct RosterState {
    /// The event's participation record
    pub record: EventRecord,
    /// Outcome of the last join request, if it succeeded
    pub last_outcome: Option<JoinOutcome>,
    /// Last operation failure, for observers of the action pipeline
    pub last_error: Option<ParticipationError>,
}

impl RosterState {
    /// Creates roster state around a freshly registered record
    #[must_use]
    pub const fn new(record: EventRecord) -> Self {
        Self {
            record,
            last_outcome: None,
            last_error: None,
        }
    }
}

/// Reducer for one event's participation roster
#[derive(Clone, Debug, Default)]
pub struct RosterReducer;

impl RosterReducer {
    /// Creates a new `RosterReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for RosterReducer {
    type State = RosterState;
    type Action = RosterAction;
    type Environment = RosterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            RosterAction::RequestToJoin { user_id } => {
                match state.record.request_to_join(user_id) {
                    Ok(outcome) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            ?outcome,
                            at = %env.clock.now(),
                            "Join request recorded"
                        );
                        state.last_outcome = Some(outcome);
                        state.last_error = None;
                    },
                    Err(error) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            %error,
                            "Join request refused"
                        );
                        state.last_error = Some(error);
                    },
                }
                SmallVec::new()
            },

            RosterAction::Decide { user_id, decision } => {
                match state.record.decide(user_id, decision) {
                    Ok(()) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            ?decision,
                            at = %env.clock.now(),
                            "Decision applied"
                        );
                        state.last_error = None;
                    },
                    Err(error) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            %error,
                            "Decision refused"
                        );
                        state.last_error = Some(error);
                    },
                }
                SmallVec::new()
            },

            RosterAction::Withdraw { user_id } => {
                match state.record.withdraw(user_id) {
                    Ok(()) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            at = %env.clock.now(),
                            "Withdrawal applied"
                        );
                        state.last_error = None;
                    },
                    Err(error) => {
                        tracing::debug!(
                            event_id = %state.record.id(),
                            %user_id,
                            %error,
                            "Withdrawal refused"
                        );
                        state.last_error = Some(error);
                    },
                }
                SmallVec::new()
            },

            RosterAction::Close => {
                state.record.close();
                state.last_error = None;
                tracing::debug!(
                    event_id = %state.record.id(),
                    at = %env.clock.now(),
                    "Event closed"
                );
                SmallVec::new()
            },
        }
    }
}

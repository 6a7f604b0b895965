//! The Event Participation Engine.
//!
//! [`ParticipationEngine`] owns one `Store` per registered event, so each
//! record has its own single-writer mutation path: operations on the same
//! event serialize behind that record's write lock, while operations on
//! different events run fully in parallel. Reads take the record's read
//! lock only and may trail an in-flight mutation by one write - capacity
//! enforcement never relies on a read, it happens inside the serialized
//! mutation itself.
//!
//! The engine is the request/response surface: every operation returns a
//! typed result. Action-driven consumers can reach the same records
//! through the [`crate::roster`] reducer pipeline.

use crate::error::{ParticipationError, RegistrationError};
use crate::record::EventRecord;
use crate::roster::{RosterAction, RosterEnvironment, RosterReducer, RosterState};
use crate::types::{
    Capacity, Decision, EventId, EventStatus, JoinButton, JoinOutcome, ParticipationView, UserId,
};
use chrono::{DateTime, Utc};
use clubhub_core::environment::Clock;
use clubhub_runtime::{Store, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Store type managing one event's roster
type RosterStore = Store<RosterState, RosterAction, RosterEnvironment, RosterReducer>;

/// Errors surfaced by the engine API
#[derive(Error, Debug)]
pub enum EngineError {
    /// A participation rule refused the operation
    #[error(transparent)]
    Participation(#[from] ParticipationError),

    /// Event registration was refused
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// The underlying store refused the operation (shutdown in progress)
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// The participation engine - registry of per-event rosters
///
/// # Example
///
/// ```ignore
/// let engine = ParticipationEngine::new(Arc::new(SystemClock));
///
/// engine.register_event(event_id, Capacity::new(20), true, starts_at, ends_at).await?;
///
/// let outcome = engine.request_to_join(event_id, user_id).await?;
/// assert_eq!(outcome, JoinOutcome::Pending);
/// ```
pub struct ParticipationEngine {
    clock: Arc<dyn Clock>,
    rosters: RwLock<HashMap<EventId, Arc<RosterStore>>>,
}

impl ParticipationEngine {
    /// Creates an engine with no registered events
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            rosters: RwLock::new(HashMap::new()),
        }
    }

    /// Registers an event with the engine
    ///
    /// Called by the external event-authoring collaborator. The record
    /// starts with empty participant and pending sets; capacity and
    /// waitlist policy are fixed from here on.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::ZeroCapacity`] if `required_slots` is zero
    /// - [`RegistrationError::DuplicateEvent`] if the id is already
    ///   registered
    #[tracing::instrument(skip(self))]
    pub async fn register_event(
        &self,
        event_id: EventId,
        required_slots: Capacity,
        allow_waitlist: bool,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if required_slots.is_zero() {
            return Err(RegistrationError::ZeroCapacity.into());
        }

        let mut rosters = self.rosters.write().await;
        if rosters.contains_key(&event_id) {
            return Err(RegistrationError::DuplicateEvent { event_id }.into());
        }

        let record = EventRecord::new(
            event_id,
            required_slots,
            allow_waitlist,
            starts_at,
            ends_at,
            self.clock.now(),
        );
        let store = Store::new(
            RosterState::new(record),
            RosterReducer::new(),
            RosterEnvironment::new(Arc::clone(&self.clock)),
        );
        rosters.insert(event_id, Arc::new(store));

        tracing::info!(%event_id, slots = %required_slots, allow_waitlist, "Event registered");
        Ok(())
    }

    /// Closes an event to new join requests
    ///
    /// Routed through the roster action pipeline; closing carries no
    /// result beyond the status change and is idempotent.
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    /// - [`EngineError::Store`] if the roster store is shutting down
    pub async fn close_event(&self, event_id: EventId) -> Result<(), EngineError> {
        let store = self.roster(event_id).await?;
        store.send(RosterAction::Close).await?;
        Ok(())
    }

    // ========================================================================
    // Mutations (serialized per record)
    // ========================================================================

    /// Records a join request for an event
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    /// - [`ParticipationError::EventClosed`] if the event is closed
    /// - [`ParticipationError::EventFull`] if the event is full with no
    ///   waitlist
    /// - [`ParticipationError::AlreadyRequested`] on a duplicate request
    /// - [`EngineError::Store`] if the roster store is shutting down
    pub async fn request_to_join(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<JoinOutcome, EngineError> {
        let store = self.roster(event_id).await?;
        let outcome = store
            .mutate(|state| state.record.request_to_join(user_id))
            .await??;
        Ok(outcome)
    }

    /// Applies an organizer decision to a pending request
    ///
    /// Authorization (who may decide) is supplied by an external
    /// collaborator; the engine only enforces participation rules.
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    /// - [`ParticipationError::NotPending`] if the user has no pending
    ///   request
    /// - [`ParticipationError::CapacityExceeded`] if approving would
    ///   exceed capacity
    /// - [`EngineError::Store`] if the roster store is shutting down
    pub async fn decide(
        &self,
        event_id: EventId,
        user_id: UserId,
        decision: Decision,
    ) -> Result<(), EngineError> {
        let store = self.roster(event_id).await?;
        store
            .mutate(|state| state.record.decide(user_id, decision))
            .await??;
        Ok(())
    }

    /// Withdraws a user from an event
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown or the
    ///   user is in neither set
    /// - [`EngineError::Store`] if the roster store is shutting down
    pub async fn withdraw(&self, event_id: EventId, user_id: UserId) -> Result<(), EngineError> {
        let store = self.roster(event_id).await?;
        store
            .mutate(|state| state.record.withdraw(user_id))
            .await??;
        Ok(())
    }

    // ========================================================================
    // Reads (concurrent, possibly one write behind)
    // ========================================================================

    /// Derived status of an event
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    pub async fn status(&self, event_id: EventId) -> Result<EventStatus, EngineError> {
        let store = self.roster(event_id).await?;
        Ok(store.state(|state| state.record.status()).await)
    }

    /// One user's relationship to an event
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    pub async fn participation_view(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<ParticipationView, EngineError> {
        let store = self.roster(event_id).await?;
        Ok(store
            .state(|state| state.record.participation_view(user_id))
            .await)
    }

    /// Join button label and enabled-state for one user
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    pub async fn join_button(
        &self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<JoinButton, EngineError> {
        let store = self.roster(event_id).await?;
        Ok(store.state(|state| state.record.join_button(user_id)).await)
    }

    /// Snapshot of one event's record
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the event is unknown
    pub async fn record(&self, event_id: EventId) -> Result<EventRecord, EngineError> {
        let store = self.roster(event_id).await?;
        Ok(store.state(|state| state.record.clone()).await)
    }

    /// All registered events, newest registration first
    ///
    /// Ties on registration time break by event id so the order is
    /// deterministic. Each record is a snapshot; a concurrent mutation
    /// may land before or after the copy.
    pub async fn events_by_recency(&self) -> Vec<EventRecord> {
        let stores: Vec<Arc<RosterStore>> = {
            let rosters = self.rosters.read().await;
            rosters.values().map(Arc::clone).collect()
        };

        let mut records = Vec::with_capacity(stores.len());
        for store in stores {
            records.push(store.state(|state| state.record.clone()).await);
        }

        records.sort_by(|a, b| {
            b.registered_at()
                .cmp(&a.registered_at())
                .then_with(|| a.id().cmp(&b.id()))
        });
        records
    }

    /// Registered events whose derived status is `Open`, newest first
    pub async fn open_events(&self) -> Vec<EventRecord> {
        let mut records = self.events_by_recency().await;
        records.retain(|record| record.status() == EventStatus::Open);
        records
    }

    /// Looks up the roster store for an event
    async fn roster(&self, event_id: EventId) -> Result<Arc<RosterStore>, ParticipationError> {
        let rosters = self.rosters.read().await;
        rosters
            .get(&event_id)
            .map(Arc::clone)
            .ok_or(ParticipationError::NotFound { event_id })
    }
}

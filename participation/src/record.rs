//! The per-event participation record and its state machine.
//!
//! [`EventRecord`] owns the capacity accounting for one event: the fixed
//! slot count, the approved participants, and the pending requests. The
//! two sets are kept disjoint structurally - every mutation goes through
//! the three operations here, and each operation checks membership before
//! moving a user.
//!
//! Status is derived on every read and never stored. Capacity is checked
//! inside the mutation itself, so running mutations under a per-record
//! write lock (see `clubhub_runtime::Store`) is sufficient to keep
//! `approved_participants` within `required_slots`.

use crate::error::ParticipationError;
use crate::types::{
    Capacity, Decision, EventId, EventStatus, JoinButton, JoinOutcome, ParticipationView, UserId,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Participation state for a single event
///
/// Created at registration with a fixed capacity and waitlist policy,
/// then mutated only through [`request_to_join`](Self::request_to_join),
/// [`decide`](Self::decide), [`withdraw`](Self::withdraw), and
/// [`close`](Self::close).
///
/// `pending_requests` keeps arrival order: the longest-waiting user is
/// first, which is the order an organizer works through when promoting
/// from a waitlist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    id: EventId,
    required_slots: Capacity,
    allow_waitlist: bool,
    closed: bool,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    registered_at: DateTime<Utc>,
    approved_participants: Vec<UserId>,
    pending_requests: Vec<UserId>,
}

impl EventRecord {
    /// Creates a record with empty participant and pending sets
    ///
    /// Capacity validation (non-zero slots) happens at engine
    /// registration, before this constructor runs.
    #[must_use]
    pub const fn new(
        id: EventId,
        required_slots: Capacity,
        allow_waitlist: bool,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            required_slots,
            allow_waitlist,
            closed: false,
            starts_at,
            ends_at,
            registered_at,
            approved_participants: Vec::new(),
            pending_requests: Vec::new(),
        }
    }

    // ========================================================================
    // Derived reads
    // ========================================================================

    /// Derives the current status
    ///
    /// Computed fresh on every call; `Closed` takes precedence over
    /// capacity.
    #[must_use]
    pub fn status(&self) -> EventStatus {
        if self.closed {
            EventStatus::Closed
        } else if self.is_at_capacity() {
            EventStatus::Full
        } else {
            EventStatus::Open
        }
    }

    /// Whether every slot is taken by an approved participant
    fn is_at_capacity(&self) -> bool {
        let taken = u32::try_from(self.approved_participants.len()).unwrap_or(u32::MAX);
        taken >= self.required_slots.value()
    }

    /// Derives one user's relationship to this event
    #[must_use]
    pub fn participation_view(&self, user_id: UserId) -> ParticipationView {
        if self.approved_participants.contains(&user_id) {
            ParticipationView::Approved
        } else if self.pending_requests.contains(&user_id) {
            ParticipationView::Pending
        } else {
            ParticipationView::NotRequested
        }
    }

    /// Derives the join button for one user
    #[must_use]
    pub fn join_button(&self, user_id: UserId) -> JoinButton {
        JoinButton::for_viewer(
            self.status(),
            self.participation_view(user_id),
            self.allow_waitlist,
        )
    }

    /// Event identifier
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Fixed capacity in slots
    #[must_use]
    pub const fn required_slots(&self) -> Capacity {
        self.required_slots
    }

    /// Whether requests are accepted while the event is full
    #[must_use]
    pub const fn allow_waitlist(&self) -> bool {
        self.allow_waitlist
    }

    /// When the event starts
    #[must_use]
    pub const fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    /// When the event ends
    #[must_use]
    pub const fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// When the record was registered with the engine
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Number of approved participants
    #[must_use]
    pub fn approved_count(&self) -> usize {
        self.approved_participants.len()
    }

    /// Number of pending requests (waitlist entries included)
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending_requests.len()
    }

    /// Free slots remaining
    #[must_use]
    pub fn slots_left(&self) -> u32 {
        let taken = u32::try_from(self.approved_participants.len()).unwrap_or(u32::MAX);
        self.required_slots.value().saturating_sub(taken)
    }

    /// Approved participants, in approval order
    #[must_use]
    pub fn approved_participants(&self) -> &[UserId] {
        &self.approved_participants
    }

    /// Pending requests, in arrival order (longest-waiting first)
    #[must_use]
    pub fn pending_requests(&self) -> &[UserId] {
        &self.pending_requests
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Records a join request
    ///
    /// No slot is reserved at this stage; the request only enters the
    /// pending set. When the event is full and allows a waitlist, the
    /// entry is recorded as [`JoinOutcome::Waitlisted`].
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::AlreadyRequested`] if the user already
    ///   sits in the pending or approved set
    /// - [`ParticipationError::EventClosed`] if the event is closed
    /// - [`ParticipationError::EventFull`] if the event is full and does
    ///   not allow a waitlist
    pub fn request_to_join(
        &mut self,
        user_id: UserId,
    ) -> Result<JoinOutcome, ParticipationError> {
        if self.approved_participants.contains(&user_id)
            || self.pending_requests.contains(&user_id)
        {
            return Err(ParticipationError::AlreadyRequested {
                event_id: self.id,
                user_id,
            });
        }

        match self.status() {
            EventStatus::Closed => Err(ParticipationError::EventClosed { event_id: self.id }),
            EventStatus::Full if !self.allow_waitlist => {
                Err(ParticipationError::EventFull { event_id: self.id })
            },
            EventStatus::Full => {
                self.pending_requests.push(user_id);
                Ok(JoinOutcome::Waitlisted)
            },
            EventStatus::Open => {
                self.pending_requests.push(user_id);
                Ok(JoinOutcome::Pending)
            },
        }
    }

    /// Applies an organizer decision to a pending request
    ///
    /// Approval moves the user from the pending to the approved set in
    /// one step, so the two sets stay disjoint. The capacity check runs
    /// inside this mutation: an approval that would overshoot
    /// `required_slots` fails and leaves the request pending. Rejection
    /// drops the request and never touches the approved set.
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotPending`] if the user has no pending
    ///   request
    /// - [`ParticipationError::CapacityExceeded`] if approving would
    ///   exceed `required_slots`
    pub fn decide(
        &mut self,
        user_id: UserId,
        decision: Decision,
    ) -> Result<(), ParticipationError> {
        let Some(position) = self.pending_requests.iter().position(|u| *u == user_id) else {
            return Err(ParticipationError::NotPending {
                event_id: self.id,
                user_id,
            });
        };

        match decision {
            Decision::Approve => {
                if self.is_at_capacity() {
                    return Err(ParticipationError::CapacityExceeded {
                        event_id: self.id,
                        required_slots: self.required_slots,
                    });
                }
                self.pending_requests.remove(position);
                self.approved_participants.push(user_id);
                Ok(())
            },
            Decision::Reject => {
                self.pending_requests.remove(position);
                Ok(())
            },
        }
    }

    /// Withdraws a user from whichever set contains them
    ///
    /// Withdrawal never promotes a waitlisted user; freeing a slot only
    /// reopens the event, and promotion stays an explicit organizer
    /// [`decide`](Self::decide) call.
    ///
    /// # Errors
    ///
    /// - [`ParticipationError::NotFound`] if the user is in neither set
    pub fn withdraw(&mut self, user_id: UserId) -> Result<(), ParticipationError> {
        if let Some(position) = self
            .approved_participants
            .iter()
            .position(|u| *u == user_id)
        {
            self.approved_participants.remove(position);
            return Ok(());
        }

        if let Some(position) = self.pending_requests.iter().position(|u| *u == user_id) {
            self.pending_requests.remove(position);
            return Ok(());
        }

        Err(ParticipationError::NotFound { event_id: self.id })
    }

    /// Closes the event to new requests
    ///
    /// Used by the external authoring collaborator (organizer close or
    /// end-of-time close). Idempotent; existing participants and pending
    /// requests are untouched.
    pub const fn close(&mut self) {
        self.closed = true;
    }
}

//! Domain types for the Event Participation Engine.
//!
//! This module contains the identifiers, value objects, and derived view
//! types shared across the engine. The mutable participation state lives
//! in [`crate::record::EventRecord`]; everything here is either immutable
//! or derived.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Capacity Value Object
// ============================================================================

/// Event capacity in slots
///
/// One slot is one unit of capacity, consumed by one approved
/// participant. Capacity is fixed at registration; changing it later is
/// an organizer concern outside this engine.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Capacity(u32);

impl Capacity {
    /// Creates a capacity of the given number of slots
    #[must_use]
    pub const fn new(slots: u32) -> Self {
        Self(slots)
    }

    /// Returns the number of slots
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Checks if the capacity is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Derived Status and Views
// ============================================================================

/// Derived status of an event
///
/// Never stored: computed fresh from record state on every read via
/// [`crate::record::EventRecord::status`]. `Closed` takes precedence over
/// capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    /// Accepting join requests
    Open,
    /// Every slot is taken by an approved participant
    Full,
    /// Administratively closed; no further requests
    Closed,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Full => write!(f, "full"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Organizer decision on a pending join request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Move the requester into the approved participants
    Approve,
    /// Drop the request
    Reject,
}

/// A user's relationship to one event, as seen by presentation layers
///
/// This is a pure projection of record state. It must never be used to
/// drive the state machine itself; the record is authoritative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipationView {
    /// The user has neither requested nor been approved
    NotRequested,
    /// The user has a request awaiting an organizer decision
    Pending,
    /// The user holds a slot
    Approved,
}

/// Outcome of a successful join request
///
/// Both variants mean the user now sits in the pending set awaiting an
/// organizer decision. `Waitlisted` is the semantic label for an entry
/// made while the event was already full (possible only when the event
/// allows a waitlist); it is not a separate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// Request recorded while the event had free slots
    Pending,
    /// Request recorded while the event was full
    Waitlisted,
}

// ============================================================================
// Join Button Projection
// ============================================================================

/// Label and enabled-state of the join button for one (event, user) pair
///
/// Centralizes the presentation mapping so UI layers never re-derive
/// capacity state:
///
/// | status | user view | label | enabled |
/// |---|---|---|---|
/// | any | `Approved` | "Joined" | false |
/// | any | `Pending` | "Pending" | false |
/// | `Full`, no waitlist | `NotRequested` | "Full" | false |
/// | `Closed` | `NotRequested` | "Closed" | false |
/// | `Open`, or `Full` with waitlist | `NotRequested` | "Request to Join" | true |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct JoinButton {
    /// Rendered button label
    pub label: &'static str,
    /// Whether the button accepts a click
    pub enabled: bool,
}

impl JoinButton {
    /// Derives the button for a viewer from status, view, and waitlist policy
    #[must_use]
    pub const fn for_viewer(
        status: EventStatus,
        view: ParticipationView,
        allow_waitlist: bool,
    ) -> Self {
        match view {
            ParticipationView::Approved => Self {
                label: "Joined",
                enabled: false,
            },
            ParticipationView::Pending => Self {
                label: "Pending",
                enabled: false,
            },
            ParticipationView::NotRequested => match status {
                EventStatus::Closed => Self {
                    label: "Closed",
                    enabled: false,
                },
                EventStatus::Full if !allow_waitlist => Self {
                    label: "Full",
                    enabled: false,
                },
                EventStatus::Full | EventStatus::Open => Self {
                    label: "Request to Join",
                    enabled: true,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_display_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = EventId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
        assert_eq!(id.as_uuid(), &uuid);
    }

    #[test]
    fn capacity_value() {
        assert_eq!(Capacity::new(12).value(), 12);
        assert!(Capacity::new(0).is_zero());
        assert!(!Capacity::new(1).is_zero());
    }

    #[test]
    fn status_display_matches_wire_names() {
        assert_eq!(EventStatus::Open.to_string(), "open");
        assert_eq!(EventStatus::Full.to_string(), "full");
        assert_eq!(EventStatus::Closed.to_string(), "closed");
    }

    #[test]
    fn button_approved_always_joined() {
        for status in [EventStatus::Open, EventStatus::Full, EventStatus::Closed] {
            for waitlist in [false, true] {
                let button =
                    JoinButton::for_viewer(status, ParticipationView::Approved, waitlist);
                assert_eq!(button.label, "Joined");
                assert!(!button.enabled);
            }
        }
    }

    #[test]
    fn button_pending_always_pending() {
        for status in [EventStatus::Open, EventStatus::Full, EventStatus::Closed] {
            let button = JoinButton::for_viewer(status, ParticipationView::Pending, false);
            assert_eq!(button.label, "Pending");
            assert!(!button.enabled);
        }
    }

    #[test]
    fn button_not_requested_follows_status() {
        let full_no_waitlist =
            JoinButton::for_viewer(EventStatus::Full, ParticipationView::NotRequested, false);
        assert_eq!(full_no_waitlist.label, "Full");
        assert!(!full_no_waitlist.enabled);

        let full_waitlist =
            JoinButton::for_viewer(EventStatus::Full, ParticipationView::NotRequested, true);
        assert_eq!(full_waitlist.label, "Request to Join");
        assert!(full_waitlist.enabled);

        let closed =
            JoinButton::for_viewer(EventStatus::Closed, ParticipationView::NotRequested, true);
        assert_eq!(closed.label, "Closed");
        assert!(!closed.enabled);

        let open =
            JoinButton::for_viewer(EventStatus::Open, ParticipationView::NotRequested, false);
        assert_eq!(open.label, "Request to Join");
        assert!(open.enabled);
    }
}

//! # ClubHub Testing
//!
//! Testing utilities and helpers for the ClubHub participation
//! architecture.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - The [`ReducerTest`] Given-When-Then harness
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use clubhub_testing::test_clock;
//! use clubhub_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_join_flow() {
//!     let env = RosterEnvironment::new(Arc::new(test_clock()));
//!     let store = Store::new(RosterState::default(), RosterReducer::new(), env);
//!
//!     store.send(RosterAction::RequestToJoin { event_id, user_id }).await?;
//!
//!     let pending = store.state(|s| s.pending_count()).await;
//!     assert_eq!(pending, 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use clubhub_core::environment::Clock;

/// Ergonomic reducer test harness
pub mod reducer_test;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use clubhub_testing::mocks::FixedClock;
    /// use clubhub_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }

    /// Clock that advances by a fixed step on every read
    ///
    /// Deterministic like [`FixedClock`], but each `now()` call returns a
    /// strictly later time. Useful for tests that assert on ordering by
    /// timestamp (e.g. feed recency).
    ///
    /// # Example
    ///
    /// ```
    /// use clubhub_testing::mocks::SteppingClock;
    /// use clubhub_core::environment::Clock;
    /// use chrono::{Duration, Utc};
    ///
    /// let clock = SteppingClock::new(Utc::now(), Duration::seconds(1));
    /// let first = clock.now();
    /// let second = clock.now();
    /// assert!(second > first);
    /// ```
    #[derive(Debug)]
    pub struct SteppingClock {
        start: DateTime<Utc>,
        step: chrono::Duration,
        ticks: std::sync::atomic::AtomicU64,
    }

    impl SteppingClock {
        /// Create a stepping clock starting at `start`, advancing by
        /// `step` per read
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: chrono::Duration) -> Self {
            Self {
                start,
                step,
                ticks: std::sync::atomic::AtomicU64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self
                .ticks
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.start + self.step * i32::try_from(tick).unwrap_or(i32::MAX)
        }
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, SteppingClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}

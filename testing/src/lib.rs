//! # Wedplan Testing
//!
//! Testing utilities and helpers for the wedding planner core.
//!
//! This crate provides:
//! - Deterministic clocks
//! - In-memory [`PersistentStore`](wedplan_core::store::PersistentStore) and
//!   [`GuestDirectory`](wedplan_core::store::GuestDirectory) with failure injection
//! - A Given/When/Then harness for the ledger reducer
//! - Fixtures and proptest strategies
//!
//! ## Example
//!
//! ```ignore
//! use wedplan_testing::{InMemoryGuestDirectory, InMemoryPlannerStore, helpers};
//!
//! #[tokio::test]
//! async fn assigns_a_guest() {
//!     let store = Arc::new(InMemoryPlannerStore::new());
//!     let directory = Arc::new(InMemoryGuestDirectory::new());
//!     let jane = directory.insert(helpers::attending("Jane", "Doe"));
//!
//!     let ledger = AssignmentLedger::new(store, directory, helpers::test_env(), WriteMode::Optimistic);
//!     // ...
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Duration, Utc};
use wedplan_core::environment::Clock;

/// In-memory collaborators
pub mod in_memory;

/// Given/When/Then harness for reducers
pub mod reducer_test;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use wedplan_testing::mocks::FixedClock;
    /// use wedplan_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
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

    /// Clock that moves forward one second on every read.
    ///
    /// Gives each created container and seat a distinct timestamp so ordering
    /// by creation time is stable.
    #[derive(Debug)]
    pub struct SteppingClock {
        start: DateTime<Utc>,
        ticks: AtomicI64,
    }

    impl SteppingClock {
        /// Start at `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>) -> Self {
            Self {
                start,
                ticks: AtomicI64::new(0),
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
            self.start + Duration::seconds(tick)
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(epoch())
    }

    /// Create a stepping clock starting at 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn stepping_clock() -> SteppingClock {
        SteppingClock::new(epoch())
    }

    #[allow(clippy::expect_used)]
    fn epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }
}

/// Test helpers and fixtures
pub mod helpers {
    use super::mocks::stepping_clock;
    use std::sync::Arc;
    use wedplan_core::ids::{ContainerId, GuestId, ParentId, UserId};
    use wedplan_core::ledger::{LedgerAction, LedgerEnvironment};
    use wedplan_core::types::{Guest, ResourceCategory, RsvpStatus};

    /// Ledger environment with a stepping clock and a fresh acting user
    #[must_use]
    pub fn test_env() -> LedgerEnvironment {
        LedgerEnvironment::new(Arc::new(stepping_clock()), UserId::new())
    }

    /// Guest who has accepted
    #[must_use]
    pub fn attending(first: &str, last: &str) -> Guest {
        Guest::new(first, last, RsvpStatus::Attending)
    }

    /// Guest who has not answered
    #[must_use]
    pub fn pending(first: &str, last: &str) -> Guest {
        Guest::new(first, last, RsvpStatus::Pending)
    }

    /// Guest who has declined
    #[must_use]
    pub fn declined(first: &str, last: &str) -> Guest {
        Guest::new(first, last, RsvpStatus::Declined)
    }

    /// `count` attending guests named "Guest 0", "Guest 1", ...
    #[must_use]
    pub fn guests(count: usize) -> Vec<Guest> {
        (0..count)
            .map(|i| attending("Guest", &i.to_string()))
            .collect()
    }

    /// Create-parent action with a fresh id
    #[must_use]
    pub fn create_parent(category: ResourceCategory, name: &str) -> (ParentId, LedgerAction) {
        let id = ParentId::new();
        (
            id,
            LedgerAction::CreateParent {
                id,
                category,
                name: name.to_string(),
            },
        )
    }

    /// Create-container action with a fresh id
    #[must_use]
    pub fn create_container(
        parent_id: ParentId,
        label: &str,
        capacity: Option<u32>,
    ) -> (ContainerId, LedgerAction) {
        let id = ContainerId::new();
        (
            id,
            LedgerAction::CreateContainer {
                id,
                parent_id,
                label: label.to_string(),
                kind: "Standard".to_string(),
                capacity,
            },
        )
    }

    /// Unassign action
    #[must_use]
    pub const fn unassign(guest_id: GuestId, container_id: ContainerId) -> LedgerAction {
        LedgerAction::Unassign {
            guest_id,
            container_id,
        }
    }

    /// Install a test subscriber that honours `RUST_LOG`. Safe to call repeatedly.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use wedplan_core::types::{Guest, RsvpStatus};

    /// Any RSVP state
    pub fn rsvp_status() -> impl Strategy<Value = RsvpStatus> {
        prop_oneof![
            Just(RsvpStatus::Attending),
            Just(RsvpStatus::Pending),
            Just(RsvpStatus::Declined),
        ]
    }

    /// A guest with a random name and RSVP and no assignments
    pub fn guest() -> impl Strategy<Value = Guest> {
        ("[A-Z][a-z]{1,8}", "[A-Z][a-z]{1,10}", rsvp_status())
            .prop_map(|(first, last, rsvp)| Guest::new(first, last, rsvp))
    }

    /// Between `min` and `max` guests (exclusive upper bound)
    pub fn guests(min: usize, max: usize) -> impl Strategy<Value = Vec<Guest>> {
        prop::collection::vec(guest(), min..max)
    }

    /// A positive capacity up to `max`
    pub fn capacity(max: u32) -> impl Strategy<Value = u32> {
        1..=max
    }

    /// One step of a random assignment workload.
    ///
    /// Indices are taken modulo the number of guests and containers in the test.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum LedgerOp {
        /// Assign guest to container
        Assign {
            /// Guest index
            guest: usize,
            /// Container index
            container: usize,
        },
        /// Unassign guest from container
        Unassign {
            /// Guest index
            guest: usize,
            /// Container index
            container: usize,
        },
        /// Move guest between containers
        Reassign {
            /// Guest index
            guest: usize,
            /// Source container index
            from: usize,
            /// Target container index
            to: usize,
        },
    }

    /// A single workload step
    pub fn ledger_op() -> impl Strategy<Value = LedgerOp> {
        prop_oneof![
            3 => (any::<usize>(), any::<usize>())
                .prop_map(|(guest, container)| LedgerOp::Assign { guest, container }),
            1 => (any::<usize>(), any::<usize>())
                .prop_map(|(guest, container)| LedgerOp::Unassign { guest, container }),
            1 => (any::<usize>(), any::<usize>(), any::<usize>())
                .prop_map(|(guest, from, to)| LedgerOp::Reassign { guest, from, to }),
        ]
    }

    /// A workload of up to `max_len` steps
    pub fn ledger_ops(max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
        prop::collection::vec(ledger_op(), 0..max_len)
    }
}

// Re-export commonly used items
pub use in_memory::{InMemoryGuestDirectory, InMemoryPlannerStore};
pub use mocks::{FixedClock, SteppingClock, stepping_clock, test_clock};
pub use reducer_test::ReducerTest;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn stepping_clock_advances_one_second_per_read() {
        let clock = stepping_clock();
        let first = clock.now();
        let second = clock.now();
        assert_eq!(second - first, Duration::seconds(1));
    }
}

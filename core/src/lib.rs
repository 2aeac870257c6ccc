//! # Wedplan Core
//!
//! Guest/resource assignment and capacity consistency for the wedding planner.
//!
//! Rooms, vehicles and seating tables are all *containers*: capacity-bounded holders
//! of guests that belong to a parent (hotel, route or event). This crate holds the
//! pure part of keeping them consistent.
//!
//! ## Core Concepts
//!
//! - **State**: [`ledger::LedgerState`], the local copy of parents, containers and seats
//! - **Action**: [`ledger::LedgerAction`], every mutation a planner can request
//! - **Reducer**: [`ledger::LedgerReducer`], `(State, Action, Environment) → Result<Effects>`
//! - **Effect**: [`effect::Effect`], a remote write description (not execution)
//! - **Environment**: injected clock and acting planner
//!
//! The runtime crate owns the imperative shell that executes effects against a
//! [`store::PersistentStore`] and [`store::GuestDirectory`].
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wedplan_core::environment::SystemClock;
//! use wedplan_core::ids::{ContainerId, ParentId, UserId};
//! use wedplan_core::ledger::{LedgerAction, LedgerEnvironment, LedgerReducer, LedgerState};
//! use wedplan_core::reducer::Reducer;
//! use wedplan_core::types::{Guest, ResourceCategory, RsvpStatus};
//!
//! # fn main() -> Result<(), wedplan_core::error::AssignmentError> {
//! let env = LedgerEnvironment::new(Arc::new(SystemClock), UserId::new());
//! let mut state = LedgerState::new();
//! let hotel = ParentId::new();
//! let room = ContainerId::new();
//!
//! LedgerReducer.reduce(&mut state, LedgerAction::CreateParent {
//!     id: hotel,
//!     category: ResourceCategory::Room,
//!     name: "Grand Hotel".into(),
//! }, &env)?;
//! LedgerReducer.reduce(&mut state, LedgerAction::CreateContainer {
//!     id: room,
//!     parent_id: hotel,
//!     label: "101".into(),
//!     kind: "Double".into(),
//!     capacity: Some(2),
//! }, &env)?;
//!
//! let guest = Guest::new("Jane", "Doe", RsvpStatus::Attending);
//! let effects = LedgerReducer.reduce(&mut state, LedgerAction::Assign {
//!     guest,
//!     container_id: room,
//! }, &env)?;
//! assert_eq!(effects.len(), 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capacity;
pub mod effect;
pub mod error;
pub mod export;
pub mod ids;
pub mod ledger;
pub mod store;
pub mod types;
pub mod unassigned;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → Result<Effects>`.
/// They validate, update state in place and describe the side effects; they never
/// perform I/O themselves.
pub mod reducer {
    use super::effect::Effects;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    /// - `Error`: Validation failure. When returned, `state` must be unchanged.
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// The validation error type
        type Error;

        /// Reduce an action into state changes and effects
        ///
        /// # Errors
        ///
        /// Returns `Self::Error` when the action is rejected. The state is not
        /// modified in that case.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> Result<Effects, Self::Error>;
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected via the
/// Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses system clock
    /// let clock = SystemClock;
    ///
    /// // Test - fixed time for deterministic tests
    /// let clock = wedplan_testing::test_clock();
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

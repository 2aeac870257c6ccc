//! # Wedplan Runtime
//!
//! Imperative shell for the wedding planner's assignment core.
//!
//! This crate provides the [`AssignmentLedger`]: it owns the local
//! [`LedgerState`](wedplan_core::ledger::LedgerState), runs the pure
//! [`LedgerReducer`](wedplan_core::ledger::LedgerReducer) and executes the resulting
//! writes against the persistent store and guest directory.
//!
//! ## Core Components
//!
//! - **`AssignmentLedger`**: local cache plus effect executor
//! - **`WriteMode`**: how local changes and remote writes are ordered
//! - **`WriteOutcome`**: what happened to the remote writes of one operation
//! - **Metrics**: Prometheus counters for assignments, rejections and failures
//!
//! ## Example
//!
//! ```ignore
//! use wedplan_runtime::{AssignmentLedger, WriteMode};
//!
//! let ledger = AssignmentLedger::load(store, directory, env, WriteMode::Optimistic).await?;
//!
//! match ledger.assign(guest_id, room_id).await? {
//!     WriteOutcome::Committed => {}
//!     WriteOutcome::Diverged(failures) => ledger.reload().await?,
//!     WriteOutcome::Pending(_) => unreachable!("optimistic mode never defers"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// The assignment ledger shell
pub mod ledger;

/// Prometheus metrics for observability
pub mod metrics;

pub use ledger::AssignmentLedger;
pub use outcome::{OverCapacityAfterEdit, ReassignError, ResizeOutcome, WriteMode, WriteOutcome};

/// Outcome types for ledger operations
pub mod outcome {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;
    use thiserror::Error;
    use wedplan_core::effect::Effects;
    use wedplan_core::error::{AssignmentError, RemoteWriteFailure};
    use wedplan_core::ids::ContainerId;
    use wedplan_core::types::Capacity;

    /// How a ledger orders local state changes and remote writes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum WriteMode {
        /// Apply locally, then write. Failed writes are reported as
        /// [`WriteOutcome::Diverged`] and the local change stays.
        #[default]
        Optimistic,
        /// Apply locally and hand the writes back to the caller as
        /// [`WriteOutcome::Pending`] to flush later.
        Deferred,
        /// Write first and only then apply locally. A failed write leaves the
        /// local state untouched; earlier writes of the same operation stay in
        /// the store.
        Transactional,
    }

    impl WriteMode {
        /// Configuration name
        #[must_use]
        pub const fn as_str(self) -> &'static str {
            match self {
                Self::Optimistic => "optimistic",
                Self::Deferred => "deferred",
                Self::Transactional => "transactional",
            }
        }
    }

    impl fmt::Display for WriteMode {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// Unrecognized write mode name.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    #[error("Unknown write mode: {0} (expected optimistic, deferred or transactional)")]
    pub struct ParseWriteModeError(pub String);

    impl FromStr for WriteMode {
        type Err = ParseWriteModeError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "optimistic" => Ok(Self::Optimistic),
                "deferred" => Ok(Self::Deferred),
                "transactional" => Ok(Self::Transactional),
                other => Err(ParseWriteModeError(other.to_string())),
            }
        }
    }

    /// What happened to the remote writes of one operation.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum WriteOutcome {
        /// Every write succeeded, or there was nothing to write.
        Committed,
        /// Writes not yet issued ([`WriteMode::Deferred`]).
        Pending(Effects),
        /// The local state changed but these writes failed. Local and remote
        /// state disagree until the next reload.
        Diverged(Vec<RemoteWriteFailure>),
    }

    impl WriteOutcome {
        /// Whether every write went through
        #[must_use]
        pub const fn is_committed(&self) -> bool {
            matches!(self, Self::Committed)
        }

        /// Whether local and remote state disagree
        #[must_use]
        pub const fn is_diverged(&self) -> bool {
            matches!(self, Self::Diverged(_))
        }

        /// Failed writes, empty unless diverged
        #[must_use]
        pub fn failures(&self) -> &[RemoteWriteFailure] {
            match self {
                Self::Diverged(failures) => failures,
                _ => &[],
            }
        }

        /// Writes still to be flushed, empty unless pending
        #[must_use]
        pub fn pending(&self) -> &[wedplan_core::effect::Effect] {
            match self {
                Self::Pending(effects) => effects,
                _ => &[],
            }
        }

        /// Combine the outcomes of two steps of one operation.
        ///
        /// Divergence wins over pending, pending over committed. One ledger never
        /// yields both: a deferred ledger's operations are pending or committed,
        /// the other modes never pend. Merging a pending outcome with a diverged
        /// one (for example a [`flush`](crate::AssignmentLedger::flush) result)
        /// keeps the failures and drops the pending writes, so flush them first.
        #[must_use]
        pub fn merge(self, other: Self) -> Self {
            match (self, other) {
                (Self::Diverged(mut a), Self::Diverged(b)) => {
                    a.extend(b);
                    Self::Diverged(a)
                }
                (d @ Self::Diverged(_), _) | (_, d @ Self::Diverged(_)) => d,
                (Self::Pending(mut a), Self::Pending(b)) => {
                    a.extend(b);
                    Self::Pending(a)
                }
                (p @ Self::Pending(_), Self::Committed) | (Self::Committed, p @ Self::Pending(_)) => p,
                (Self::Committed, Self::Committed) => Self::Committed,
            }
        }
    }

    /// Capacity was lowered below the current occupancy. No one was evicted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OverCapacityAfterEdit {
        /// The edited container
        pub container_id: ContainerId,
        /// The new capacity
        pub capacity: Capacity,
        /// Occupants still in the container
        pub occupancy: usize,
    }

    impl fmt::Display for OverCapacityAfterEdit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "container {} holds {} guests but capacity is now {}",
                self.container_id, self.occupancy, self.capacity
            )
        }
    }

    /// A reassign that failed after its unassign step may already have run.
    #[derive(Error, Debug)]
    #[error("Reassign failed: {error}")]
    pub struct ReassignError {
        /// Writes of the unassign step. [`WriteOutcome::Pending`] effects still
        /// need a flush; [`WriteOutcome::Committed`] also covers an unassign that
        /// had nothing to write or did not run.
        pub released: WriteOutcome,
        /// Why the move stopped
        #[source]
        pub error: AssignmentError,
    }

    /// Result of a resize.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ResizeOutcome {
        /// Remote write result
        pub outcome: WriteOutcome,
        /// Set when the container is now over capacity
        pub warning: Option<OverCapacityAfterEdit>,
    }

}

//! Errors surfaced by assignment operations.

use crate::effect::Effect;
use crate::ids::{ContainerId, GuestId, ParentId};
use crate::store::StoreError;
use crate::types::{Capacity, ResourceCategory};
use std::fmt;
use thiserror::Error;

/// A referenced record that does not exist in the current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Missing {
    /// Unknown guest
    Guest(GuestId),
    /// Unknown container
    Container(ContainerId),
    /// Unknown parent
    Parent(ParentId),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Guest(id) => write!(f, "guest {id}"),
            Self::Container(id) => write!(f, "container {id}"),
            Self::Parent(id) => write!(f, "parent {id}"),
        }
    }
}

/// A remote write that failed after (or, in transactional mode, before) the local
/// state changed.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("{effect} failed: {error}")]
pub struct RemoteWriteFailure {
    /// The write that was attempted
    pub effect: Effect,
    /// Why it failed
    pub error: StoreError,
}

/// Errors returned by ledger operations.
///
/// Every error is recovered at the boundary of the operation that raised it; none
/// of them poisons the ledger.
#[derive(Error, Debug)]
pub enum AssignmentError {
    /// The container is at (or above) capacity. Nothing was changed.
    #[error("{category} {label} is at full capacity ({capacity} guests)")]
    CapacityExceeded {
        /// Container that rejected the guest
        container_id: ContainerId,
        /// Its category
        category: ResourceCategory,
        /// Its label
        label: String,
        /// Its effective capacity
        capacity: Capacity,
    },

    /// A referenced guest, container or parent does not exist.
    #[error("{0} not found")]
    NotFound(Missing),

    /// Capacity must be a positive integer.
    #[error("Capacity must be greater than zero")]
    InvalidCapacity,

    /// A remote write failed and the local state was left untouched
    /// (transactional mode only).
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(RemoteWriteFailure),

    /// Reading from the guest directory failed.
    #[error("Guest directory error: {0}")]
    Directory(StoreError),

    /// Reading from the persistent store failed.
    #[error("Store error: {0}")]
    Store(StoreError),
}

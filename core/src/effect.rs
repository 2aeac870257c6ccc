//! Remote write descriptions.
//!
//! The ledger reducer never performs I/O. It mutates local state and returns the
//! writes the runtime must issue against the persistent store and guest directory,
//! in order.

use crate::ids::{AssignmentId, ContainerId, GuestId, ParentId};
use crate::types::{Container, ContainerPatch, Parent, ResourceCategory, TableAssignment};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Effects produced by one reducer call.
pub type Effects = SmallVec<[Effect; 4]>;

/// One remote write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Insert a parent
    CreateParent(Parent),
    /// Delete a parent record
    DeleteParent(ParentId),
    /// Insert a container
    CreateContainer(Container),
    /// Partially update a container
    UpdateContainer {
        /// Container to update
        id: ContainerId,
        /// Fields to write
        patch: ContainerPatch,
    },
    /// Delete a container record
    DeleteContainer(ContainerId),
    /// Point a guest's backward reference at a container
    SetBackref {
        /// Guest
        guest_id: GuestId,
        /// Category of the reference
        category: ResourceCategory,
        /// New target
        container_id: ContainerId,
    },
    /// Clear a guest's backward reference if it still points at `container_id`
    ClearBackref {
        /// Guest
        guest_id: GuestId,
        /// Category of the reference
        category: ResourceCategory,
        /// Container being vacated
        container_id: ContainerId,
    },
    /// Insert a table assignment record
    RecordSeat(TableAssignment),
    /// Delete a table assignment record
    RemoveSeat(AssignmentId),
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateParent(parent) => write!(f, "create parent {}", parent.id),
            Self::DeleteParent(id) => write!(f, "delete parent {id}"),
            Self::CreateContainer(container) => write!(f, "create container {}", container.id),
            Self::UpdateContainer { id, .. } => write!(f, "update container {id}"),
            Self::DeleteContainer(id) => write!(f, "delete container {id}"),
            Self::SetBackref {
                guest_id, category, ..
            } => write!(f, "set {category} of guest {guest_id}"),
            Self::ClearBackref {
                guest_id, category, ..
            } => write!(f, "clear {category} of guest {guest_id}"),
            Self::RecordSeat(seat) => write!(f, "record seat {}", seat.id),
            Self::RemoveSeat(id) => write!(f, "remove seat {id}"),
        }
    }
}

//! Capacity enforcement.
//!
//! Pure checks of occupancy against declared capacity. Nothing here mutates a
//! container: a container that is already over capacity (for example after its
//! capacity was lowered) stays that way until a planner removes someone.

use crate::types::{Container, Guest};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy state of a container, derived from occupancy versus capacity.
///
/// `Full` also covers over-capacity containers; it is not a lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyStatus {
    /// No occupants
    Empty,
    /// At least one occupant, below capacity
    PartiallyOccupied,
    /// Occupancy at or above capacity
    Full,
}

impl OccupancyStatus {
    /// Label used in exports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::PartiallyOccupied => "partial",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for OccupancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether one more guest fits in the container.
///
/// The guest is accepted for symmetry with callers that check per guest; the
/// decision depends only on the container.
#[must_use]
pub fn can_assign(container: &Container, _guest: &Guest) -> bool {
    has_room(container)
}

/// Whether occupancy is strictly below effective capacity.
#[must_use]
pub fn has_room(container: &Container) -> bool {
    container.occupancy() < capacity_as_usize(container)
}

/// Current occupancy state.
#[must_use]
pub fn occupancy_status(container: &Container) -> OccupancyStatus {
    let occupancy = container.occupancy();
    if occupancy == 0 {
        OccupancyStatus::Empty
    } else if occupancy < capacity_as_usize(container) {
        OccupancyStatus::PartiallyOccupied
    } else {
        OccupancyStatus::Full
    }
}

/// Whether occupancy exceeds capacity (reachable only through capacity edits or
/// racing writers).
#[must_use]
pub fn is_over_capacity(container: &Container) -> bool {
    container.occupancy() > capacity_as_usize(container)
}

fn capacity_as_usize(container: &Container) -> usize {
    usize::try_from(container.effective_capacity().value()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ContainerId, GuestId, ParentId};
    use crate::types::{Capacity, ResourceCategory, RsvpStatus};
    use chrono::Utc;

    fn room(capacity: Option<u32>, occupants: usize) -> Container {
        Container {
            id: ContainerId::new(),
            parent_id: ParentId::new(),
            category: ResourceCategory::Room,
            label: "101".to_string(),
            kind: "Double".to_string(),
            capacity: capacity.and_then(Capacity::new),
            occupants: (0..occupants).map(|_| GuestId::new()).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn guest() -> Guest {
        Guest::new("Jane", "Doe", RsvpStatus::Attending)
    }

    #[test]
    fn accepts_below_capacity() {
        assert!(can_assign(&room(Some(3), 2), &guest()));
    }

    #[test]
    fn rejects_at_capacity() {
        assert!(!can_assign(&room(Some(2), 2), &guest()));
    }

    #[test]
    fn unset_capacity_behaves_as_two() {
        assert!(can_assign(&room(None, 1), &guest()));
        assert!(!can_assign(&room(None, 2), &guest()));
    }

    #[test]
    fn over_capacity_is_tolerated_but_closed() {
        let crowded = room(Some(1), 3);
        assert!(!can_assign(&crowded, &guest()));
        assert!(is_over_capacity(&crowded));
        assert_eq!(occupancy_status(&crowded), OccupancyStatus::Full);
        assert_eq!(crowded.occupancy(), 3);
    }

    #[test]
    fn status_follows_occupancy() {
        assert_eq!(occupancy_status(&room(Some(2), 0)), OccupancyStatus::Empty);
        assert_eq!(occupancy_status(&room(Some(2), 1)), OccupancyStatus::PartiallyOccupied);
        assert_eq!(occupancy_status(&room(Some(2), 2)), OccupancyStatus::Full);
    }
}

//! Domain types for guest/resource assignment.
//!
//! Value objects ([`Capacity`], [`ResourceCategory`], [`RsvpStatus`]) and the records
//! exchanged with the persistent store and guest directory.

use crate::ids::{AssignmentId, ContainerId, GuestId, ParentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Resource Category
// ============================================================================

/// Independent assignment namespaces.
///
/// A guest may hold one room, one vehicle and one table at the same time; holding
/// a room never conflicts with holding a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    /// Hotel rooms, parented by a hotel
    Room,
    /// Transport vehicles, parented by a route
    Vehicle,
    /// Seating tables, parented by an event
    Table,
}

impl ResourceCategory {
    /// All categories, in display order.
    pub const ALL: [Self; 3] = [Self::Room, Self::Vehicle, Self::Table];

    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Vehicle => "vehicle",
            Self::Table => "table",
        }
    }

    /// Parse a category from its database string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "room" => Some(Self::Room),
            "vehicle" => Some(Self::Vehicle),
            "table" => Some(Self::Table),
            _ => None,
        }
    }

    /// Whether a guest may be assigned one container of this category per parent
    /// rather than one wedding-wide.
    ///
    /// Tables are reseated per event; rooms and vehicles are wedding-wide singletons.
    #[must_use]
    pub const fn scoped_to_parent(&self) -> bool {
        matches!(self, Self::Table)
    }

    /// Default eligibility filter used by "needs attention" views.
    #[must_use]
    pub const fn admits(&self, guest: &Guest) -> bool {
        self.admits_rsvp(guest.rsvp)
    }

    /// Whether guests with this RSVP state are eligible for the category.
    #[must_use]
    pub const fn admits_rsvp(&self, rsvp: RsvpStatus) -> bool {
        match self {
            Self::Room | Self::Table => {
                matches!(rsvp, RsvpStatus::Attending | RsvpStatus::Pending)
            }
            Self::Vehicle => matches!(rsvp, RsvpStatus::Attending),
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Room => "Room",
            Self::Vehicle => "Vehicle",
            Self::Table => "Table",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Capacity
// ============================================================================

/// Declared capacity of a container
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capacity(u32);

impl Capacity {
    /// Capacity applied when a container was stored without one.
    pub const DEFAULT: Self = Self(2);

    /// Creates a `Capacity`, rejecting zero.
    #[must_use]
    pub const fn new(value: u32) -> Option<Self> {
        if value == 0 { None } else { Some(Self(value)) }
    }

    /// Resolves an optional stored capacity, falling back to [`Capacity::DEFAULT`].
    #[must_use]
    pub fn or_default(value: Option<u32>) -> Self {
        value.and_then(Self::new).unwrap_or(Self::DEFAULT)
    }

    /// Returns the capacity value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Guests
// ============================================================================

/// RSVP state of a guest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsvpStatus {
    /// Replied yes
    Attending,
    /// Has not replied
    Pending,
    /// Replied no
    Declined,
}

impl RsvpStatus {
    /// All states.
    pub const ALL: [Self; 3] = [Self::Attending, Self::Pending, Self::Declined];

    /// Database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Attending => "attending",
            Self::Pending => "pending",
            Self::Declined => "declined",
        }
    }

    /// Parse an RSVP status. Unknown values are treated as pending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "attending" | "yes" => Self::Attending,
            "declined" | "no" => Self::Declined,
            _ => Self::Pending,
        }
    }
}

/// A wedding guest as seen by the assignment core.
///
/// The guest directory owns the record; the core only reads it and writes the
/// backward references.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    /// Guest ID
    pub id: GuestId,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// RSVP state
    pub rsvp: RsvpStatus,
    /// Backward reference to the assigned room
    pub room_id: Option<ContainerId>,
    /// Backward reference to the assigned vehicle
    pub vehicle_id: Option<ContainerId>,
}

impl Guest {
    /// Creates an unassigned guest
    #[must_use]
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, rsvp: RsvpStatus) -> Self {
        Self {
            id: GuestId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            rsvp,
            room_id: None,
            vehicle_id: None,
        }
    }

    /// "First Last", trimmed when either part is empty.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Backward reference for a category.
    ///
    /// Tables keep their backward reference in [`TableAssignment`] records, so this
    /// is always `None` for [`ResourceCategory::Table`].
    #[must_use]
    pub const fn backref(&self, category: ResourceCategory) -> Option<ContainerId> {
        match category {
            ResourceCategory::Room => self.room_id,
            ResourceCategory::Vehicle => self.vehicle_id,
            ResourceCategory::Table => None,
        }
    }

    /// Sets the backward reference for a category. No-op for tables.
    pub const fn set_backref(&mut self, category: ResourceCategory, container: Option<ContainerId>) {
        match category {
            ResourceCategory::Room => self.room_id = container,
            ResourceCategory::Vehicle => self.vehicle_id = container,
            ResourceCategory::Table => {}
        }
    }
}

// ============================================================================
// Parents and Containers
// ============================================================================

/// A hotel, route or event that owns containers of one category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Parent ID
    pub id: ParentId,
    /// Category of every container under this parent
    pub category: ResourceCategory,
    /// Display name ("Grand Hotel", "Airport Shuttle", "Reception")
    pub name: String,
    /// When created
    pub created_at: DateTime<Utc>,
}

/// A capacity-bounded holder of guests: a room, vehicle or table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Container ID
    pub id: ContainerId,
    /// Owning hotel, route or event
    pub parent_id: ParentId,
    /// Category (always the parent's category)
    pub category: ResourceCategory,
    /// Label such as a room number or table name
    pub label: String,
    /// Free-form type ("Double", "Shuttle", "Round")
    pub kind: String,
    /// Declared capacity; `None` when stored without one
    pub capacity: Option<Capacity>,
    /// Occupants in assignment order
    pub occupants: Vec<GuestId>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// Last mutation
    pub updated_at: DateTime<Utc>,
}

impl Container {
    /// Capacity in force, applying the default when unset.
    #[must_use]
    pub fn effective_capacity(&self) -> Capacity {
        self.capacity.unwrap_or_default()
    }

    /// Number of current occupants.
    #[must_use]
    pub fn occupancy(&self) -> usize {
        self.occupants.len()
    }

    /// Whether the guest is among the occupants.
    #[must_use]
    pub fn holds(&self, guest_id: GuestId) -> bool {
        self.occupants.contains(&guest_id)
    }

    /// "Room 101", "Table Rose"
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.category, self.label)
    }
}

/// Partial update sent to the persistent store.
///
/// `None` fields are left untouched; `updated_at` is always written.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPatch {
    /// New occupant list (rooms and vehicles only)
    pub occupants: Option<Vec<GuestId>>,
    /// New capacity
    pub capacity: Option<Capacity>,
    /// Mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl ContainerPatch {
    /// A patch that only stamps `updated_at`.
    #[must_use]
    pub const fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            occupants: None,
            capacity: None,
            updated_at,
        }
    }
}

/// A seat at a table for one event.
///
/// Unlike rooms and vehicles, a guest may be seated once per event, so each seat
/// is its own record with audit fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAssignment {
    /// Assignment ID
    pub id: AssignmentId,
    /// Seated guest
    pub guest_id: GuestId,
    /// Table
    pub table_id: ContainerId,
    /// Event the table belongs to
    pub event_id: ParentId,
    /// When seated
    pub assigned_at: DateTime<Utc>,
    /// Planner who seated the guest
    pub assigned_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rejects_zero() {
        assert!(Capacity::new(0).is_none());
        assert_eq!(Capacity::new(4).map(|c| c.value()), Some(4));
    }

    #[test]
    fn unset_capacity_defaults_to_two() {
        assert_eq!(Capacity::or_default(None).value(), 2);
        assert_eq!(Capacity::or_default(Some(0)).value(), 2);
        assert_eq!(Capacity::or_default(Some(6)).value(), 6);
    }

    #[test]
    fn vehicles_only_admit_attending_guests() {
        let pending = Guest::new("Ada", "Lovelace", RsvpStatus::Pending);
        let attending = Guest::new("Alan", "Turing", RsvpStatus::Attending);
        let declined = Guest::new("Grace", "Hopper", RsvpStatus::Declined);

        assert!(ResourceCategory::Room.admits(&pending));
        assert!(ResourceCategory::Table.admits(&pending));
        assert!(!ResourceCategory::Vehicle.admits(&pending));
        assert!(ResourceCategory::Vehicle.admits(&attending));
        assert!(!ResourceCategory::Room.admits(&declined));
    }

    #[test]
    fn table_backref_is_not_stored_on_guest() {
        let mut guest = Guest::new("Jane", "Doe", RsvpStatus::Attending);
        let table = ContainerId::new();
        guest.set_backref(ResourceCategory::Table, Some(table));
        assert_eq!(guest.backref(ResourceCategory::Table), None);

        let room = ContainerId::new();
        guest.set_backref(ResourceCategory::Room, Some(room));
        assert_eq!(guest.backref(ResourceCategory::Room), Some(room));
    }

    #[test]
    fn category_round_trips_through_database_string() {
        for category in ResourceCategory::ALL {
            assert_eq!(ResourceCategory::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn full_name_trims_missing_parts() {
        let guest = Guest::new("Cher", "", RsvpStatus::Attending);
        assert_eq!(guest.full_name(), "Cher");
    }
}

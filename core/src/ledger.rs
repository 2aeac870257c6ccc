//! Assignment ledger: local state and the reducer that mutates it.
//!
//! [`LedgerState`] is the in-memory copy of every parent, container and table seat.
//! [`LedgerReducer`] validates an action, applies it to the state and returns the
//! remote writes that mirror the change. Validation always happens before mutation,
//! so an `Err` from the reducer means the state is exactly as it was.
//!
//! # Uniqueness
//!
//! Within a category a guest occupies at most one container. Tables are the
//! exception: the scope is the event, so a guest may hold one seat per event.

use crate::capacity;
use crate::effect::{Effect, Effects};
use crate::environment::Clock;
use crate::error::{AssignmentError, Missing};
use crate::ids::{AssignmentId, ContainerId, GuestId, ParentId, UserId};
use crate::reducer::Reducer;
use crate::types::{
    Capacity, Container, ContainerPatch, Guest, Parent, ResourceCategory, TableAssignment,
};
use crate::unassigned::compute_unassigned;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

// ============================================================================
// State
// ============================================================================

/// Local copy of the assignment ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerState {
    parents: HashMap<ParentId, Parent>,
    containers: HashMap<ContainerId, Container>,
    seats: HashMap<AssignmentId, TableAssignment>,
}

impl LedgerState {
    /// Creates an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the ledger from what the store returned.
    ///
    /// Table occupants are derived from the seat records (in seating order) rather
    /// than from the container rows. Seats pointing at unknown tables are dropped.
    #[must_use]
    pub fn from_snapshot(
        parents: Vec<Parent>,
        containers: Vec<Container>,
        seats: Vec<TableAssignment>,
    ) -> Self {
        let mut state = Self {
            parents: parents.into_iter().map(|p| (p.id, p)).collect(),
            containers: containers.into_iter().map(|c| (c.id, c)).collect(),
            seats: HashMap::new(),
        };

        for container in state.containers.values_mut() {
            if container.category == ResourceCategory::Table {
                container.occupants.clear();
            }
        }

        let mut seats = seats;
        seats.sort_by_key(|seat| (seat.assigned_at, seat.id));
        for seat in seats {
            let Some(table) = state.containers.get_mut(&seat.table_id) else {
                tracing::warn!(
                    seat_id = %seat.id,
                    table_id = %seat.table_id,
                    "Dropping seat record for unknown table"
                );
                continue;
            };
            if !table.holds(seat.guest_id) {
                table.occupants.push(seat.guest_id);
            }
            state.seats.insert(seat.id, seat);
        }

        state
    }

    /// Look up a parent
    #[must_use]
    pub fn parent(&self, id: ParentId) -> Option<&Parent> {
        self.parents.get(&id)
    }

    /// All parents, oldest first
    #[must_use]
    pub fn parents(&self) -> Vec<&Parent> {
        let mut parents: Vec<&Parent> = self.parents.values().collect();
        parents.sort_by_key(|p| (p.created_at, p.id));
        parents
    }

    /// Look up a container
    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    /// Containers of one parent, oldest first
    #[must_use]
    pub fn containers_of(&self, parent_id: ParentId) -> Vec<&Container> {
        sorted(self.containers.values().filter(|c| c.parent_id == parent_id))
    }

    /// Containers of one category across all parents, oldest first
    #[must_use]
    pub fn containers_in(&self, category: ResourceCategory) -> Vec<&Container> {
        sorted(self.containers.values().filter(|c| c.category == category))
    }

    /// Every container, oldest first
    #[must_use]
    pub fn all_containers(&self) -> Vec<&Container> {
        sorted(self.containers.values())
    }

    /// Containers that make up a uniqueness scope.
    ///
    /// `scope` is ignored for rooms and vehicles; for tables it selects the event
    /// (`None` means every event).
    #[must_use]
    pub fn containers_in_scope(
        &self,
        category: ResourceCategory,
        scope: Option<ParentId>,
    ) -> Vec<&Container> {
        let scope = if category.scoped_to_parent() { scope } else { None };
        sorted(self.containers.values().filter(|c| {
            c.category == category && scope.is_none_or(|parent| c.parent_id == parent)
        }))
    }

    /// The container a guest currently occupies within a uniqueness scope.
    #[must_use]
    pub fn holding(
        &self,
        guest_id: GuestId,
        category: ResourceCategory,
        scope: Option<ParentId>,
    ) -> Option<&Container> {
        self.containers_in_scope(category, scope)
            .into_iter()
            .find(|c| c.holds(guest_id))
    }

    /// Table seat records, oldest first
    #[must_use]
    pub fn seats(&self) -> Vec<&TableAssignment> {
        let mut seats: Vec<&TableAssignment> = self.seats.values().collect();
        seats.sort_by_key(|s| (s.assigned_at, s.id));
        seats
    }

    /// The seat a guest holds at an event, if any
    #[must_use]
    pub fn seat_for(&self, guest_id: GuestId, event_id: ParentId) -> Option<&TableAssignment> {
        self.seats
            .values()
            .find(|s| s.guest_id == guest_id && s.event_id == event_id)
    }

    /// Eligible guests not assigned within the scope, in the order given.
    #[must_use]
    pub fn unassigned<P>(
        &self,
        guests: &[Guest],
        category: ResourceCategory,
        scope: Option<ParentId>,
        eligible: P,
    ) -> Vec<Guest>
    where
        P: Fn(&Guest) -> bool,
    {
        compute_unassigned(guests, self.containers_in_scope(category, scope), eligible)
    }
}

fn sorted<'a>(containers: impl Iterator<Item = &'a Container>) -> Vec<&'a Container> {
    let mut containers: Vec<&Container> = containers.collect();
    containers.sort_by(|a, b| {
        (a.created_at, &a.label, a.id).cmp(&(b.created_at, &b.label, b.id))
    });
    containers
}

// ============================================================================
// Actions
// ============================================================================

/// Inputs to the ledger reducer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LedgerAction {
    /// Create a hotel, route or event
    CreateParent {
        /// New parent ID
        id: ParentId,
        /// Category of its containers
        category: ResourceCategory,
        /// Display name
        name: String,
    },

    /// Create an empty container under a parent
    CreateContainer {
        /// New container ID
        id: ContainerId,
        /// Owning parent
        parent_id: ParentId,
        /// Label
        label: String,
        /// Free-form type
        kind: String,
        /// Declared capacity; `None` falls back to the default of two
        capacity: Option<u32>,
    },

    /// Place a guest in a container
    Assign {
        /// The guest, as read from the directory
        guest: Guest,
        /// Target container
        container_id: ContainerId,
    },

    /// Remove a guest from a container
    Unassign {
        /// Guest
        guest_id: GuestId,
        /// Container
        container_id: ContainerId,
    },

    /// Change a container's declared capacity without evicting anyone
    Resize {
        /// Container
        container_id: ContainerId,
        /// New capacity
        capacity: u32,
    },

    /// Drain and delete a container
    DeleteContainer {
        /// Container
        container_id: ContainerId,
    },

    /// Drain and delete every container of a parent, then the parent
    DeleteParent {
        /// Parent
        parent_id: ParentId,
    },
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the ledger reducer
#[derive(Clone)]
pub struct LedgerEnvironment {
    /// Clock for `updated_at` and `assigned_at`
    pub clock: Arc<dyn Clock>,
    /// Planner recorded on table seats
    pub acting_user: UserId,
}

impl LedgerEnvironment {
    /// Creates a new `LedgerEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, acting_user: UserId) -> Self {
        Self { clock, acting_user }
    }
}

impl std::fmt::Debug for LedgerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEnvironment")
            .field("acting_user", &self.acting_user)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the assignment ledger
#[derive(Clone, Copy, Debug, Default)]
pub struct LedgerReducer;

impl LedgerReducer {
    /// Creates a new `LedgerReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn create_parent(
        state: &mut LedgerState,
        id: ParentId,
        category: ResourceCategory,
        name: String,
        now: DateTime<Utc>,
    ) -> Effects {
        let parent = Parent {
            id,
            category,
            name,
            created_at: now,
        };
        state.parents.insert(id, parent.clone());
        tracing::debug!(parent_id = %id, %category, "Parent created");
        Effects::from_elem(Effect::CreateParent(parent), 1)
    }

    fn create_container(
        state: &mut LedgerState,
        id: ContainerId,
        parent_id: ParentId,
        label: String,
        kind: String,
        capacity: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Effects, AssignmentError> {
        let parent = state
            .parents
            .get(&parent_id)
            .ok_or(AssignmentError::NotFound(Missing::Parent(parent_id)))?;
        let capacity = match capacity {
            Some(value) => Some(Capacity::new(value).ok_or(AssignmentError::InvalidCapacity)?),
            None => None,
        };

        let container = Container {
            id,
            parent_id,
            category: parent.category,
            label,
            kind,
            capacity,
            occupants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.containers.insert(id, container.clone());
        tracing::debug!(container_id = %id, parent_id = %parent_id, "Container created");
        Ok(Effects::from_elem(Effect::CreateContainer(container), 1))
    }

    fn assign(
        state: &mut LedgerState,
        guest: &Guest,
        container_id: ContainerId,
        env: &LedgerEnvironment,
    ) -> Result<Effects, AssignmentError> {
        let target = state
            .containers
            .get(&container_id)
            .ok_or(AssignmentError::NotFound(Missing::Container(container_id)))?;

        if target.holds(guest.id) {
            return Ok(Effects::new());
        }

        if !capacity::can_assign(target, guest) {
            tracing::warn!(
                container_id = %container_id,
                guest_id = %guest.id,
                occupancy = target.occupancy(),
                capacity = target.effective_capacity().value(),
                "Assignment rejected: container full"
            );
            return Err(AssignmentError::CapacityExceeded {
                container_id,
                category: target.category,
                label: target.label.clone(),
                capacity: target.effective_capacity(),
            });
        }

        let category = target.category;
        let event_id = target.parent_id;
        let scope = category.scoped_to_parent().then_some(event_id);
        let now = env.clock.now();

        let mut effects = Effects::new();
        if let Some(previous) = state.holding(guest.id, category, scope).map(|c| c.id) {
            effects.extend(Self::release(state, guest.id, previous, now));
        }

        let Some(target) = state.containers.get_mut(&container_id) else {
            return Err(AssignmentError::NotFound(Missing::Container(container_id)));
        };
        target.occupants.push(guest.id);
        target.updated_at = now;

        if category == ResourceCategory::Table {
            let seat = TableAssignment {
                id: AssignmentId::new(),
                guest_id: guest.id,
                table_id: container_id,
                event_id,
                assigned_at: now,
                assigned_by: env.acting_user,
            };
            state.seats.insert(seat.id, seat.clone());
            effects.push(Effect::RecordSeat(seat));
            effects.push(Effect::UpdateContainer {
                id: container_id,
                patch: ContainerPatch::touch(now),
            });
        } else {
            effects.push(Effect::UpdateContainer {
                id: container_id,
                patch: ContainerPatch {
                    occupants: Some(target.occupants.clone()),
                    capacity: None,
                    updated_at: now,
                },
            });
            effects.push(Effect::SetBackref {
                guest_id: guest.id,
                category,
                container_id,
            });
        }

        tracing::debug!(guest_id = %guest.id, container_id = %container_id, "Guest assigned");
        Ok(effects)
    }

    /// Removes a guest from a container. No effects if the guest is not there.
    fn release(
        state: &mut LedgerState,
        guest_id: GuestId,
        container_id: ContainerId,
        now: DateTime<Utc>,
    ) -> Effects {
        let mut effects = Effects::new();
        let Some(container) = state.containers.get_mut(&container_id) else {
            return effects;
        };
        if !container.holds(guest_id) {
            return effects;
        }

        container.occupants.retain(|id| *id != guest_id);
        container.updated_at = now;
        let category = container.category;

        if category == ResourceCategory::Table {
            let mut vacated: Vec<AssignmentId> = state
                .seats
                .values()
                .filter(|s| s.guest_id == guest_id && s.table_id == container_id)
                .map(|s| s.id)
                .collect();
            vacated.sort();
            for seat_id in vacated {
                state.seats.remove(&seat_id);
                effects.push(Effect::RemoveSeat(seat_id));
            }
            effects.push(Effect::UpdateContainer {
                id: container_id,
                patch: ContainerPatch::touch(now),
            });
        } else {
            effects.push(Effect::UpdateContainer {
                id: container_id,
                patch: ContainerPatch {
                    occupants: Some(container.occupants.clone()),
                    capacity: None,
                    updated_at: now,
                },
            });
            effects.push(Effect::ClearBackref {
                guest_id,
                category,
                container_id,
            });
        }

        tracing::debug!(guest_id = %guest_id, container_id = %container_id, "Guest unassigned");
        effects
    }

    fn resize(
        state: &mut LedgerState,
        container_id: ContainerId,
        capacity: u32,
        now: DateTime<Utc>,
    ) -> Result<Effects, AssignmentError> {
        let capacity = Capacity::new(capacity).ok_or(AssignmentError::InvalidCapacity)?;
        let container = state
            .containers
            .get_mut(&container_id)
            .ok_or(AssignmentError::NotFound(Missing::Container(container_id)))?;

        container.capacity = Some(capacity);
        container.updated_at = now;

        if capacity::is_over_capacity(container) {
            tracing::warn!(
                container_id = %container_id,
                occupancy = container.occupancy(),
                capacity = capacity.value(),
                "Capacity lowered below occupancy; no guests evicted"
            );
        }

        Ok(Effects::from_elem(
            Effect::UpdateContainer {
                id: container_id,
                patch: ContainerPatch {
                    occupants: None,
                    capacity: Some(capacity),
                    updated_at: now,
                },
            },
            1,
        ))
    }

    fn delete_container(
        state: &mut LedgerState,
        container_id: ContainerId,
        now: DateTime<Utc>,
    ) -> Result<Effects, AssignmentError> {
        let occupants = state
            .containers
            .get(&container_id)
            .map(|c| c.occupants.clone())
            .ok_or(AssignmentError::NotFound(Missing::Container(container_id)))?;

        let mut effects = Effects::new();
        for guest_id in occupants {
            effects.extend(Self::release(state, guest_id, container_id, now));
        }

        state.containers.remove(&container_id);
        effects.push(Effect::DeleteContainer(container_id));
        tracing::debug!(container_id = %container_id, "Container deleted");
        Ok(effects)
    }

    fn delete_parent(
        state: &mut LedgerState,
        parent_id: ParentId,
        now: DateTime<Utc>,
    ) -> Result<Effects, AssignmentError> {
        if !state.parents.contains_key(&parent_id) {
            return Err(AssignmentError::NotFound(Missing::Parent(parent_id)));
        }

        let children: Vec<ContainerId> = state
            .containers_of(parent_id)
            .into_iter()
            .map(|c| c.id)
            .collect();

        let mut effects = Effects::new();
        for container_id in children {
            effects.extend(Self::delete_container(state, container_id, now)?);
        }

        state.parents.remove(&parent_id);
        effects.push(Effect::DeleteParent(parent_id));
        tracing::debug!(parent_id = %parent_id, "Parent deleted");
        Ok(effects)
    }
}

impl Reducer for LedgerReducer {
    type State = LedgerState;
    type Action = LedgerAction;
    type Environment = LedgerEnvironment;
    type Error = AssignmentError;

    fn reduce(
        &self,
        state: &mut LedgerState,
        action: LedgerAction,
        env: &LedgerEnvironment,
    ) -> Result<Effects, AssignmentError> {
        let now = env.clock.now();
        match action {
            LedgerAction::CreateParent { id, category, name } => {
                Ok(Self::create_parent(state, id, category, name, now))
            }
            LedgerAction::CreateContainer {
                id,
                parent_id,
                label,
                kind,
                capacity,
            } => Self::create_container(state, id, parent_id, label, kind, capacity, now),
            LedgerAction::Assign {
                guest,
                container_id,
            } => Self::assign(state, &guest, container_id, env),
            LedgerAction::Unassign {
                guest_id,
                container_id,
            } => Ok(Self::release(state, guest_id, container_id, now)),
            LedgerAction::Resize {
                container_id,
                capacity,
            } => Self::resize(state, container_id, capacity, now),
            LedgerAction::DeleteContainer { container_id } => {
                Self::delete_container(state, container_id, now)
            }
            LedgerAction::DeleteParent { parent_id } => Self::delete_parent(state, parent_id, now),
        }
    }
}

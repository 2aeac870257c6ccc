//! In-memory collaborators for fast, deterministic tests
//!
//! - [`InMemoryPlannerStore`]: `HashMap`-backed [`PersistentStore`]
//! - [`InMemoryGuestDirectory`]: `HashMap`-backed [`GuestDirectory`]
//!
//! Both are cheap to clone and clones share data, so two ledgers handed clones of
//! one store see each other's writes the way two browser sessions share one
//! database. Both can be told to fail writes for failure-path tests.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on a poisoned lock

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use wedplan_core::ids::{AssignmentId, ContainerId, GuestId, ParentId};
use wedplan_core::store::{GuestDirectory, PersistentStore, StoreError, StoreFuture};
use wedplan_core::types::{
    Container, ContainerPatch, Guest, Parent, ResourceCategory, TableAssignment,
};

/// Write failure switch shared by clones of a collaborator.
#[derive(Clone, Debug, Default)]
struct FailureSwitch {
    fail_next: Arc<AtomicUsize>,
    always: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl FailureSwitch {
    fn check(&self, what: &str) -> Result<(), StoreError> {
        if self.always.load(Ordering::SeqCst) > 0 {
            return Err(StoreError::Unavailable(format!("{what}: store offline")));
        }
        let tripped = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            return Err(StoreError::Unavailable(format!("{what}: injected failure")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fail_writes(&self, count: usize) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    fn set_offline(&self, offline: bool) {
        self.always.store(usize::from(offline), Ordering::SeqCst);
    }
}

// ============================================================================
// Persistent store
// ============================================================================

/// In-memory [`PersistentStore`].
///
/// Like the production schema, it has no cascade: deleting a parent or container
/// leaves children and seat records in place.
///
/// # Example
///
/// ```
/// use wedplan_testing::InMemoryPlannerStore;
///
/// let store = InMemoryPlannerStore::new();
/// store.fail_writes(1);
/// assert_eq!(store.container_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryPlannerStore {
    parents: Arc<RwLock<HashMap<ParentId, Parent>>>,
    containers: Arc<RwLock<HashMap<ContainerId, Container>>>,
    seats: Arc<RwLock<HashMap<AssignmentId, TableAssignment>>>,
    failures: FailureSwitch,
}

impl InMemoryPlannerStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` writes with [`StoreError::Unavailable`]
    pub fn fail_writes(&self, count: usize) {
        self.failures.fail_writes(count);
    }

    /// Fail every write until switched back
    pub fn set_offline(&self, offline: bool) {
        self.failures.set_offline(offline);
    }

    /// Number of writes that succeeded
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.failures.writes.load(Ordering::SeqCst)
    }

    /// Stored copy of a container
    #[must_use]
    pub fn container(&self, id: ContainerId) -> Option<Container> {
        self.containers.read().unwrap().get(&id).cloned()
    }

    /// Stored copy of a parent
    #[must_use]
    pub fn parent(&self, id: ParentId) -> Option<Parent> {
        self.parents.read().unwrap().get(&id).cloned()
    }

    /// Number of stored containers
    #[must_use]
    pub fn container_count(&self) -> usize {
        self.containers.read().unwrap().len()
    }

    /// Stored seats at a table
    #[must_use]
    pub fn seats_at(&self, table_id: ContainerId) -> Vec<TableAssignment> {
        let mut seats: Vec<TableAssignment> = self
            .seats
            .read()
            .unwrap()
            .values()
            .filter(|s| s.table_id == table_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| (s.assigned_at, s.id));
        seats
    }

    /// Number of stored seats
    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.read().unwrap().len()
    }

    /// Insert a container directly, bypassing failure injection.
    ///
    /// For seeding legacy rows such as a container stored without a capacity.
    pub fn seed_container(&self, container: Container) {
        self.containers
            .write()
            .unwrap()
            .insert(container.id, container);
    }

    /// Insert a parent directly, bypassing failure injection.
    pub fn seed_parent(&self, parent: Parent) {
        self.parents.write().unwrap().insert(parent.id, parent);
    }
}

impl PersistentStore for InMemoryPlannerStore {
    fn create_parent(&self, parent: Parent) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("create_parent")?;
            self.parents.write().unwrap().insert(parent.id, parent);
            Ok(())
        })
    }

    fn delete_parent(&self, id: ParentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("delete_parent")?;
            self.parents
                .write()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("parent {id}")))
        })
    }

    fn list_parents(&self) -> StoreFuture<'_, Vec<Parent>> {
        Box::pin(async move {
            let mut parents: Vec<Parent> = self.parents.read().unwrap().values().cloned().collect();
            parents.sort_by_key(|p| (p.created_at, p.id));
            Ok(parents)
        })
    }

    fn create_container(&self, container: Container) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("create_container")?;
            self.containers
                .write()
                .unwrap()
                .insert(container.id, container);
            Ok(())
        })
    }

    fn update_container(&self, id: ContainerId, patch: ContainerPatch) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("update_container")?;
            let mut containers = self.containers.write().unwrap();
            let container = containers
                .get_mut(&id)
                .ok_or_else(|| StoreError::NotFound(format!("container {id}")))?;
            if let Some(occupants) = patch.occupants {
                container.occupants = occupants;
            }
            if let Some(capacity) = patch.capacity {
                container.capacity = Some(capacity);
            }
            container.updated_at = patch.updated_at;
            Ok(())
        })
    }

    fn delete_container(&self, id: ContainerId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("delete_container")?;
            self.containers
                .write()
                .unwrap()
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::NotFound(format!("container {id}")))
        })
    }

    fn list_containers(&self, parent_id: ParentId) -> StoreFuture<'_, Vec<Container>> {
        Box::pin(async move {
            let mut containers: Vec<Container> = self
                .containers
                .read()
                .unwrap()
                .values()
                .filter(|c| c.parent_id == parent_id)
                .cloned()
                .collect();
            containers.sort_by(|a, b| (a.created_at, &a.label).cmp(&(b.created_at, &b.label)));
            Ok(containers)
        })
    }

    fn record_table_assignment(&self, assignment: TableAssignment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("record_table_assignment")?;
            self.seats
                .write()
                .unwrap()
                .insert(assignment.id, assignment);
            Ok(())
        })
    }

    fn remove_table_assignment(&self, id: AssignmentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("remove_table_assignment")?;
            // Deleting an absent row is not an error, matching a SQL DELETE.
            self.seats.write().unwrap().remove(&id);
            Ok(())
        })
    }

    fn list_table_assignments(&self, event_id: ParentId) -> StoreFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            let mut seats: Vec<TableAssignment> = self
                .seats
                .read()
                .unwrap()
                .values()
                .filter(|s| s.event_id == event_id)
                .cloned()
                .collect();
            seats.sort_by_key(|s| (s.assigned_at, s.id));
            Ok(seats)
        })
    }
}

// ============================================================================
// Guest directory
// ============================================================================

/// In-memory [`GuestDirectory`].
///
/// `list_eligible` returns the guests the category admits, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct InMemoryGuestDirectory {
    guests: Arc<RwLock<Vec<Guest>>>,
    failures: FailureSwitch,
    reads_offline: Arc<AtomicUsize>,
}

impl InMemoryGuestDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `guests`
    #[must_use]
    pub fn with_guests(guests: impl IntoIterator<Item = Guest>) -> Self {
        let directory = Self::new();
        for guest in guests {
            directory.insert(guest);
        }
        directory
    }

    /// Add or replace a guest and return its id
    pub fn insert(&self, guest: Guest) -> GuestId {
        let id = guest.id;
        let mut guests = self.guests.write().unwrap();
        match guests.iter_mut().find(|g| g.id == id) {
            Some(existing) => *existing = guest,
            None => guests.push(guest),
        }
        id
    }

    /// Remove a guest
    pub fn remove(&self, id: GuestId) {
        self.guests.write().unwrap().retain(|g| g.id != id);
    }

    /// Current record of a guest
    #[must_use]
    pub fn guest(&self, id: GuestId) -> Option<Guest> {
        self.guests.read().unwrap().iter().find(|g| g.id == id).cloned()
    }

    /// Fail the next `count` backref writes
    pub fn fail_writes(&self, count: usize) {
        self.failures.fail_writes(count);
    }

    /// Fail every read and write until switched back
    pub fn set_offline(&self, offline: bool) {
        self.failures.set_offline(offline);
        self.reads_offline
            .store(usize::from(offline), Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), StoreError> {
        if self.reads_offline.load(Ordering::SeqCst) > 0 {
            return Err(StoreError::Unavailable("guest directory offline".into()));
        }
        Ok(())
    }
}

impl GuestDirectory for InMemoryGuestDirectory {
    fn list_eligible(&self, category: ResourceCategory) -> StoreFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            self.check_read()?;
            Ok(self
                .guests
                .read()
                .unwrap()
                .iter()
                .filter(|g| category.admits(g))
                .cloned()
                .collect())
        })
    }

    fn get(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>> {
        Box::pin(async move {
            self.check_read()?;
            Ok(self.guest(id))
        })
    }

    fn update_backref(
        &self,
        id: GuestId,
        category: ResourceCategory,
        container: Option<ContainerId>,
    ) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.failures.check("update_backref")?;
            let mut guests = self.guests.write().unwrap();
            let guest = guests
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("guest {id}")))?;
            guest.set_backref(category, container);
            Ok(())
        })
    }
}

//! Collaborator traits for persistence and the guest directory.
//!
//! The assignment core never reaches for global state: the persistent store and the
//! guest directory are injected as trait objects. Every call is a fallible remote
//! operation and none of them is retried.
//!
//! # Implementations
//!
//! - `PostgresPlannerStore` (in `wedplan-postgres`): production implementation of both traits
//! - `InMemoryPlannerStore` / `InMemoryGuestDirectory` (in `wedplan-testing`): deterministic tests
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the traits
//! can be held as `Arc<dyn PersistentStore>`.

use crate::ids::{AssignmentId, ContainerId, GuestId, ParentId};
use crate::types::{Container, ContainerPatch, Guest, Parent, ResourceCategory, TableAssignment};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by collaborator calls.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors raised by the persistent store or guest directory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The record to update or delete does not exist remotely.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored value could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The collaborator refused or could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Persistent storage for parents, containers and table assignments.
///
/// The store enforces no foreign-key cascade: deleting a parent or container does
/// not touch its children or assignments. The ledger drains them first.
pub trait PersistentStore: Send + Sync {
    /// Insert a parent (hotel, route or event).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn create_parent(&self, parent: Parent) -> StoreFuture<'_, ()>;

    /// Delete a parent record. Child containers are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn delete_parent(&self, id: ParentId) -> StoreFuture<'_, ()>;

    /// List every parent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_parents(&self) -> StoreFuture<'_, Vec<Parent>>;

    /// Insert a container.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn create_container(&self, container: Container) -> StoreFuture<'_, ()>;

    /// Apply a partial update to a container.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn update_container(&self, id: ContainerId, patch: ContainerPatch) -> StoreFuture<'_, ()>;

    /// Delete a container record. Its assignments are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn delete_container(&self, id: ContainerId) -> StoreFuture<'_, ()>;

    /// List the containers of a parent, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_containers(&self, parent_id: ParentId) -> StoreFuture<'_, Vec<Container>>;

    /// Insert a table assignment record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn record_table_assignment(&self, assignment: TableAssignment) -> StoreFuture<'_, ()>;

    /// Delete a table assignment record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn remove_table_assignment(&self, id: AssignmentId) -> StoreFuture<'_, ()>;

    /// List the table assignments of an event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_table_assignments(&self, event_id: ParentId) -> StoreFuture<'_, Vec<TableAssignment>>;
}

/// Read access to guests plus the backward-reference write.
pub trait GuestDirectory: Send + Sync {
    /// Guests eligible for a category, in directory order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails.
    fn list_eligible(&self, category: ResourceCategory) -> StoreFuture<'_, Vec<Guest>>;

    /// Look up a guest.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read fails. A missing guest is `Ok(None)`.
    fn get(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>>;

    /// Set or clear the guest's backward reference for a category.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn update_backref(
        &self,
        id: GuestId,
        category: ResourceCategory,
        container: Option<ContainerId>,
    ) -> StoreFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let error = StoreError::Database("connection reset".to_string());
        assert_eq!(error.to_string(), "Database error: connection reset");
    }
}

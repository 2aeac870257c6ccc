//! `PostgreSQL` persistence for the wedding planner.
//!
//! This crate provides [`PostgresPlannerStore`], which implements both
//! [`PersistentStore`] and [`GuestDirectory`] from `wedplan-core` over a sqlx
//! connection pool:
//!
//! - Parents, containers and table seats in plain tables
//! - Room and vehicle occupants as a `UUID[]` column
//! - Guest backward references (`room_id`, `vehicle_id`) on the guest row
//!
//! There is no optimistic-concurrency column and no foreign-key cascade. Two
//! sessions writing the same container overwrite each other, and deleting a
//! container leaves its seat rows behind unless the caller drains it first.
//!
//! # Example
//!
//! ```ignore
//! use wedplan_postgres::PostgresPlannerStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresPlannerStore::connect("postgres://localhost/wedplan", 10, 1, 30).await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod directory;
mod rows;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use uuid::Uuid;
use wedplan_core::ids::{AssignmentId, ContainerId, ParentId};
use wedplan_core::store::StoreFuture;
use wedplan_core::types::{Container, ContainerPatch, Parent, TableAssignment};

pub use wedplan_core::store::{GuestDirectory, PersistentStore, StoreError};

/// `PostgreSQL`-backed store and guest directory.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone, Debug)]
pub struct PostgresPlannerStore {
    pool: PgPool,
}

impl PostgresPlannerStore {
    /// Create a store using an existing connection pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with a bounded pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if no connection can be established
    /// within `connect_timeout_secs`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to connect: {e}")))?;

        tracing::info!(max_connections, min_connections, "Connected to PostgreSQL");
        Ok(Self::from_pool(pool))
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a sqlx error and counts it.
fn db_error(operation: &'static str, error: &sqlx::Error) -> StoreError {
    metrics::counter!("planner_store_errors_total", "operation" => operation).increment(1);
    tracing::debug!(operation, error = %error, "PostgreSQL query failed");
    StoreError::Database(format!("{operation}: {error}"))
}

impl PersistentStore for PostgresPlannerStore {
    fn create_parent(&self, parent: Parent) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO parents (id, category, name, created_at)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(*parent.id.as_uuid())
            .bind(parent.category.as_str())
            .bind(&parent.name)
            .bind(parent.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("create_parent", &e))?;
            Ok(())
        })
    }

    fn delete_parent(&self, id: ParentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM parents WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("delete_parent", &e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("parent {id}")));
            }
            Ok(())
        })
    }

    fn list_parents(&self) -> StoreFuture<'_, Vec<Parent>> {
        Box::pin(async move {
            let records = sqlx::query(
                "SELECT id, category, name, created_at
                 FROM parents
                 ORDER BY created_at, id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_parents", &e))?;

            records.iter().map(rows::parent).collect()
        })
    }

    fn create_container(&self, container: Container) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let capacity = container.capacity.map(rows::capacity_column).transpose()?;
            let occupants: Vec<Uuid> = container.occupants.iter().map(|g| *g.as_uuid()).collect();

            sqlx::query(
                "INSERT INTO containers
                    (id, parent_id, category, label, kind, capacity, occupants, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(*container.id.as_uuid())
            .bind(*container.parent_id.as_uuid())
            .bind(container.category.as_str())
            .bind(&container.label)
            .bind(&container.kind)
            .bind(capacity)
            .bind(occupants)
            .bind(container.created_at)
            .bind(container.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("create_container", &e))?;
            Ok(())
        })
    }

    fn update_container(&self, id: ContainerId, patch: ContainerPatch) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let capacity = patch.capacity.map(rows::capacity_column).transpose()?;
            let occupants: Option<Vec<Uuid>> = patch
                .occupants
                .map(|ids| ids.iter().map(|g| *g.as_uuid()).collect());

            let result = sqlx::query(
                "UPDATE containers
                 SET occupants = COALESCE($2, occupants),
                     capacity = COALESCE($3, capacity),
                     updated_at = $4
                 WHERE id = $1",
            )
            .bind(*id.as_uuid())
            .bind(occupants)
            .bind(capacity)
            .bind(patch.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("update_container", &e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("container {id}")));
            }
            Ok(())
        })
    }

    fn delete_container(&self, id: ContainerId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let result = sqlx::query("DELETE FROM containers WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("delete_container", &e))?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("container {id}")));
            }
            Ok(())
        })
    }

    fn list_containers(&self, parent_id: ParentId) -> StoreFuture<'_, Vec<Container>> {
        Box::pin(async move {
            let records = sqlx::query(
                "SELECT id, parent_id, category, label, kind, capacity, occupants, created_at, updated_at
                 FROM containers
                 WHERE parent_id = $1
                 ORDER BY created_at, label",
            )
            .bind(*parent_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_containers", &e))?;

            records.iter().map(rows::container).collect()
        })
    }

    fn record_table_assignment(&self, assignment: TableAssignment) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query(
                "INSERT INTO table_assignments
                    (id, guest_id, table_id, event_id, assigned_at, assigned_by)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(*assignment.id.as_uuid())
            .bind(*assignment.guest_id.as_uuid())
            .bind(*assignment.table_id.as_uuid())
            .bind(*assignment.event_id.as_uuid())
            .bind(assignment.assigned_at)
            .bind(*assignment.assigned_by.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("record_table_assignment", &e))?;
            Ok(())
        })
    }

    fn remove_table_assignment(&self, id: AssignmentId) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            sqlx::query("DELETE FROM table_assignments WHERE id = $1")
                .bind(*id.as_uuid())
                .execute(&self.pool)
                .await
                .map_err(|e| db_error("remove_table_assignment", &e))?;
            Ok(())
        })
    }

    fn list_table_assignments(&self, event_id: ParentId) -> StoreFuture<'_, Vec<TableAssignment>> {
        Box::pin(async move {
            let records = sqlx::query(
                "SELECT id, guest_id, table_id, event_id, assigned_at, assigned_by
                 FROM table_assignments
                 WHERE event_id = $1
                 ORDER BY assigned_at, id",
            )
            .bind(*event_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("list_table_assignments", &e))?;

            records.iter().map(rows::table_assignment).collect()
        })
    }
}

//! Application wiring.
//!
//! [`PlannerApp`] chooses the collaborators from [`Config`] and owns the
//! resulting [`AssignmentLedger`].

use crate::config::Config;
use std::sync::Arc;
use thiserror::Error;
use wedplan_core::environment::SystemClock;
use wedplan_core::error::AssignmentError;
use wedplan_core::ids::GuestId;
use wedplan_core::ledger::LedgerEnvironment;
use wedplan_core::store::{GuestDirectory, PersistentStore, StoreError};
use wedplan_core::types::Guest;
use wedplan_postgres::PostgresPlannerStore;
use wedplan_runtime::AssignmentLedger;
use wedplan_runtime::metrics::MetricsError;
use wedplan_testing::{InMemoryGuestDirectory, InMemoryPlannerStore};

/// Application errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Store error while connecting or migrating
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Ledger operation failed
    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),

    /// Metrics recorder could not be installed
    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

/// Where guests, containers and seats are kept.
#[derive(Clone, Debug)]
pub enum Backend {
    /// `PostgreSQL`, serving as both store and guest directory
    Postgres(PostgresPlannerStore),
    /// Process-local maps
    InMemory {
        /// Parents, containers and seats
        store: InMemoryPlannerStore,
        /// Guest records
        directory: InMemoryGuestDirectory,
    },
}

impl Backend {
    /// Connect to `PostgreSQL` when a database is configured, otherwise start empty
    /// in-memory collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the connection or a migration fails.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let Some(database) = &config.database else {
            tracing::info!("DATABASE_URL not set, using in-memory store");
            return Ok(Self::in_memory());
        };

        let store = PostgresPlannerStore::connect(
            &database.url,
            database.max_connections,
            database.min_connections,
            database.connect_timeout,
        )
        .await?;
        store.migrate().await?;
        tracing::info!("PostgreSQL migrations applied");
        Ok(Self::Postgres(store))
    }

    /// Fresh in-memory collaborators.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::InMemory {
            store: InMemoryPlannerStore::new(),
            directory: InMemoryGuestDirectory::new(),
        }
    }

    fn store(&self) -> Arc<dyn PersistentStore> {
        match self {
            Self::Postgres(store) => Arc::new(store.clone()),
            Self::InMemory { store, .. } => Arc::new(store.clone()),
        }
    }

    fn directory(&self) -> Arc<dyn GuestDirectory> {
        match self {
            Self::Postgres(store) => Arc::new(store.clone()),
            Self::InMemory { directory, .. } => Arc::new(directory.clone()),
        }
    }
}

/// The planner application: configuration, collaborators and the ledger.
pub struct PlannerApp {
    config: Config,
    backend: Backend,
    ledger: AssignmentLedger,
}

impl PlannerApp {
    /// Build the application from configuration and load the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the database cannot be reached and
    /// [`AppError::Assignment`] if the initial load fails.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let backend = Backend::from_config(&config).await?;
        Self::with_backend(config, backend).await
    }

    /// Build the application over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Assignment`] if the initial load fails.
    pub async fn with_backend(config: Config, backend: Backend) -> Result<Self, AppError> {
        let env = LedgerEnvironment::new(Arc::new(SystemClock), config.planner.acting_user);
        let ledger = AssignmentLedger::load(
            backend.store(),
            backend.directory(),
            env,
            config.planner.write_mode,
        )
        .await?;

        tracing::info!(
            write_mode = %config.planner.write_mode,
            postgres = matches!(backend, Backend::Postgres(_)),
            "Planner ready"
        );

        Ok(Self {
            config,
            backend,
            ledger,
        })
    }

    /// Add or replace a guest in the directory.
    ///
    /// Guest management lives outside the ledger; this is for seeding.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Store`] if the directory write fails.
    pub async fn seed_guest(&self, guest: Guest) -> Result<GuestId, AppError> {
        match &self.backend {
            Backend::Postgres(store) => {
                store.upsert_guest(&guest).await?;
                Ok(guest.id)
            }
            Backend::InMemory { directory, .. } => Ok(directory.insert(guest)),
        }
    }

    /// The assignment ledger.
    #[must_use]
    pub const fn ledger(&self) -> &AssignmentLedger {
        &self.ledger
    }

    /// The collaborators in use.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// The loaded configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

//! # Wedplan
//!
//! Application wiring for the wedding planner's assignment ledger.
//!
//! - [`config`]: environment-driven configuration
//! - [`telemetry`]: `tracing` subscriber and Prometheus recorder setup
//! - [`app`]: [`PlannerApp`], which picks the collaborators (`PostgreSQL` or
//!   in-memory) and builds the [`AssignmentLedger`]
//!
//! ## Example
//!
//! ```no_run
//! use wedplan::{Config, PlannerApp};
//!
//! # async fn example() -> Result<(), wedplan::AppError> {
//! let config = Config::from_env()?;
//! let app = PlannerApp::new(config).await?;
//! println!("{}", app.ledger().export_csv().await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod telemetry;

pub use app::{AppError, PlannerApp};
pub use config::{Config, ConfigError};
pub use wedplan_runtime::{AssignmentLedger, ReassignError, WriteMode, WriteOutcome};

//! Configuration management for the planner.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;
use wedplan_core::ids::UserId;
use wedplan_runtime::WriteMode;

/// Invalid configuration value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {name}: {value:?} ({reason})")]
pub struct ConfigError {
    /// Variable name
    pub name: &'static str,
    /// Raw value
    pub value: String,
    /// Parser message
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// `PostgreSQL` configuration; `None` runs against in-memory collaborators
    pub database: Option<DatabaseConfig>,
    /// Ledger behaviour
    pub planner: PlannerConfig,
    /// Logging and metrics
    pub observability: ObservabilityConfig,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
}

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// How local changes and remote writes are ordered
    pub write_mode: WriteMode,
    /// Planner recorded on table seats
    pub acting_user: UserId,
}

/// Logging and metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Prometheus metrics address; metrics are off when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            planner: PlannerConfig {
                write_mode: WriteMode::default(),
                acting_user: UserId::from_uuid(Uuid::nil()),
            },
            observability: ObservabilityConfig {
                log_filter: DEFAULT_LOG_FILTER.to_string(),
                metrics_addr: None,
            },
        }
    }
}

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,wedplan=debug,sqlx=warn";

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a variable that is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a variable that is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 1)?,
                connect_timeout: parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT", 30)?,
            }),
            None => None,
        };

        let acting_user = parse_or(&lookup, "PLANNER_USER", Uuid::nil())?;

        Ok(Self {
            database,
            planner: PlannerConfig {
                write_mode: parse_or(&lookup, "PLANNER_WRITE_MODE", WriteMode::default())?,
                acting_user: UserId::from_uuid(acting_user),
            },
            observability: ObservabilityConfig {
                log_filter: lookup("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
                metrics_addr: lookup("METRICS_ADDR")
                    .map(|raw| parse(&raw, "METRICS_ADDR"))
                    .transpose()?,
            },
        })
    }
}

fn parse<T>(raw: &str, name: &'static str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name).map_or(Ok(default), |raw| parse(&raw, name))
}

//! Records-store access for the speed analytics engine.
//!
//! This module provides abstractions over the records store via the Repository
//! pattern, allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Callers (speed-outliers binary, plotting, reports)     │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Services - predicate builder, aggregation, outliers    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  SpeedRepository trait - abstract records store         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │  Local (in-memory)           │
//!     │  Snapshot (JSON export)      │
//!     └──────────────────────────────┘
//! ```
//!
//! # Recommended Usage
//! ```ignore
//! use regatta_speeds::db::{factory, RepositoryType};
//!
//! let repo = factory::RepositoryFactory::create(RepositoryType::Snapshot, Some(path))?;
//! let scan = regatta_speeds::services::scan_repository(repo.as_ref(), Default::default()).await?;
//! ```

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::{LocalRepository, SnapshotRepository};
pub use repository::{ErrorContext, RepositoryError, RepositoryResult, SpeedRepository};

use anyhow::{Context, Result};
use log::info;
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn SpeedRepository>> = OnceLock::new();

/// Initialize the global repository singleton from `config`.
///
/// A repository installed by an earlier call is kept.
pub fn init_repository(config: &RepositoryConfig) -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = RepositoryFactory::from_repository_config(config)
        .context("Failed to create the records store")?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
///
/// Falls back to the environment (`REPOSITORY_TYPE`, `SPEEDS_SNAPSHOT`)
/// when [`init_repository`] was never called.
pub fn get_repository() -> Result<&'static Arc<dyn SpeedRepository>> {
    if REPOSITORY.get().is_none() {
        if let Ok(repo) = RepositoryFactory::from_env() {
            let _ = REPOSITORY.set(repo);
        }
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}

/// Resolve the store a whole-store scan reads from.
///
/// Uses `config` when given, the environment otherwise. Only stores loaded
/// from recorded data are accepted.
///
/// # Errors
/// `ConfigurationError` for an unknown store type or a local store.
pub fn scan_store_type(config: Option<&RepositoryConfig>) -> RepositoryResult<RepositoryType> {
    let repo_type = match config {
        Some(config) => config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?,
        None => RepositoryType::from_env()?,
    };

    if !repo_type.holds_records() {
        return Err(RepositoryError::configuration(
            "The local store holds no records; configure a snapshot store to scan",
        ));
    }
    info!("scanning the {:?} store", repo_type);
    Ok(repo_type)
}

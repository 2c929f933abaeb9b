//! Repository factory for dependency injection.
//!
//! This module provides utilities for creating and configuring repository instances
//! based on runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::RepositoryConfig;
use super::repositories::{LocalRepository, SnapshotRepository};
use super::repository::{RepositoryError, RepositoryResult, SpeedRepository};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// JSON snapshot loaded into memory
    Snapshot,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "snapshot"/"json").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "snapshot" | "json" => Ok(Self::Snapshot),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Defaults to Snapshot if `SPEEDS_SNAPSHOT`
    /// is set, otherwise Local.
    ///
    /// # Errors
    /// `ConfigurationError` when `REPOSITORY_TYPE` names no known store.
    pub fn from_env() -> RepositoryResult<Self> {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().map_err(|e: String| {
                RepositoryError::configuration(format!("Invalid REPOSITORY_TYPE: {}", e))
            });
        }

        if std::env::var("SPEEDS_SNAPSHOT").is_ok() {
            Ok(Self::Snapshot)
        } else {
            Ok(Self::Local)
        }
    }

    /// Whether the store is loaded from recorded data.
    ///
    /// A local store starts empty and only holds what callers insert.
    pub fn holds_records(self) -> bool {
        self != Self::Local
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use regatta_speeds::db::{RepositoryFactory, RepositoryType};
///
/// let local = RepositoryFactory::create_local();
/// let snapshot = RepositoryFactory::create(RepositoryType::Snapshot, Some("regattas.json".as_ref()))?;
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// # Arguments
    /// * `repo_type` - Type of repository to create
    /// * `snapshot_path` - Snapshot file (required for Snapshot)
    pub fn create(
        repo_type: RepositoryType,
        snapshot_path: Option<&Path>,
    ) -> RepositoryResult<Arc<dyn SpeedRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::Snapshot => {
                let path = snapshot_path.ok_or_else(|| {
                    RepositoryError::configuration("Snapshot repository requires a snapshot path")
                })?;
                Ok(Self::create_snapshot(path)?)
            }
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn SpeedRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Load a snapshot repository.
    pub fn create_snapshot<P: AsRef<Path>>(path: P) -> RepositoryResult<Arc<dyn SpeedRepository>> {
        Ok(Arc::new(SnapshotRepository::from_file(path)?))
    }

    /// Create repository from environment configuration.
    ///
    /// Reads `REPOSITORY_TYPE` and, for snapshots, `SPEEDS_SNAPSHOT`.
    pub fn from_env() -> RepositoryResult<Arc<dyn SpeedRepository>> {
        RepositoryBuilder::new().from_env()?.build()
    }

    /// Create repository from a TOML configuration file.
    pub fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn SpeedRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config)
    }

    /// Create repository from a RepositoryConfig instance.
    pub fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn SpeedRepository>> {
        RepositoryBuilder::new().from_config(config)?.build()
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::Snapshot)
///     .snapshot_path("regattas.json")
///     .build()?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    snapshot_path: Option<PathBuf>,
}

impl RepositoryBuilder {
    /// Create a new repository builder for a local store.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::Local,
            snapshot_path: None,
        }
    }

    /// Set the repository type.
    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    /// Set the snapshot file.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Result<Self, RepositoryError> {
        self.repo_type = RepositoryType::from_env()?;

        if self.repo_type == RepositoryType::Snapshot {
            let path = std::env::var("SPEEDS_SNAPSHOT").map_err(|_| {
                RepositoryError::configuration("Snapshot repository requires SPEEDS_SNAPSHOT")
            })?;
            self.snapshot_path = Some(PathBuf::from(path));
        }

        Ok(self)
    }

    /// Load configuration from a parsed `repository.toml`.
    pub fn from_config(mut self, config: &RepositoryConfig) -> Result<Self, RepositoryError> {
        self.repo_type = config.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;
        self.snapshot_path = config.snapshot_path()?.map(Path::to_path_buf);
        Ok(self)
    }

    /// Load configuration from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(self, config_path: P) -> Result<Self, RepositoryError> {
        let config = RepositoryConfig::from_file(config_path)?;
        self.from_config(&config)
    }

    /// Build the repository instance.
    pub fn build(self) -> RepositoryResult<Arc<dyn SpeedRepository>> {
        RepositoryFactory::create(self.repo_type, self.snapshot_path.as_deref())
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!("local".parse::<RepositoryType>().unwrap(), RepositoryType::Local);
        assert_eq!("JSON".parse::<RepositoryType>().unwrap(), RepositoryType::Snapshot);
        assert_eq!(
            "snapshot".parse::<RepositoryType>().unwrap(),
            RepositoryType::Snapshot
        );
        assert!("postgres".parse::<RepositoryType>().is_err());
    }

    #[test]
    fn test_only_local_store_is_empty() {
        assert!(!RepositoryType::Local.holds_records());
        assert!(RepositoryType::Snapshot.holds_records());
    }

    #[test]
    fn test_snapshot_without_path_fails() {
        let result = RepositoryBuilder::new()
            .repository_type(RepositoryType::Snapshot)
            .build();
        assert!(matches!(
            result,
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_local() {
        let repo = RepositoryBuilder::new()
            .repository_type(RepositoryType::Local)
            .build()
            .unwrap();
        assert!(repo.health_check().await.unwrap());
    }
}

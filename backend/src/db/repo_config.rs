//! Repository configuration file support.
//!
//! This module reads the `repository.toml` file selecting the records store
//! and carrying the analytics and outlier-scan settings.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::{ErrorContext, RepositoryError};
use crate::services::outliers::OutlierConfig;
use crate::services::speeds::AnalyticsSettings;

/// Configuration loaded from `repository.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub snapshot: SnapshotSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub outliers: OutlierConfig,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
        }
    }
}

/// Snapshot store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl RepositoryConfig {
    /// Load repository configuration from a TOML file.
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let context = || {
            ErrorContext::new("load_config")
                .with_entity("config")
                .with_entity_id(path.display())
        };
        let content = fs::read_to_string(path).map_err(|e| {
            RepositoryError::configuration_with_context(
                format!("Failed to read config file: {}", e),
                context(),
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            RepositoryError::configuration_with_context(
                format!("Failed to parse config file: {}", e),
                context(),
            )
        })
    }

    /// Load repository configuration from the default location.
    ///
    /// Searches for `repository.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("repository.toml"),
            PathBuf::from("backend/repository.toml"),
            PathBuf::from("../repository.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::configuration(
            "No repository.toml found in standard locations",
        ))
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// Snapshot path, required when the repository type is `snapshot`.
    pub fn snapshot_path(&self) -> Result<Option<&Path>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type != RepositoryType::Snapshot {
            return Ok(None);
        }

        match self.snapshot.path.as_deref() {
            Some(path) => Ok(Some(path)),
            None => Err(RepositoryError::configuration(
                "Snapshot repository requires 'snapshot.path' setting",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::predicate::DayPolicy;

    #[test]
    fn test_parse_local_config() {
        let toml = r#"
[repository]
type = "local"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository.repo_type, "local");
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Local);
        assert!(config.snapshot_path().unwrap().is_none());
        assert_eq!(config.outliers, OutlierConfig::default());
        assert_eq!(config.analytics, AnalyticsSettings::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[repository]
type = "snapshot"

[snapshot]
path = "data/regattas.json"

[analytics]
yearly_unset_day = "first"
ranked_unset_day = "all"

[outliers]
threshold = 0.25
batch_size = 100
absolute_limits = true
excluded_races = [12, 40]
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.repository_type().unwrap(), RepositoryType::Snapshot);
        assert_eq!(
            config.snapshot_path().unwrap(),
            Some(Path::new("data/regattas.json"))
        );
        assert_eq!(config.analytics.yearly_unset_day, DayPolicy::First);
        assert_eq!(config.analytics.ranked_unset_day, DayPolicy::All);
        assert_eq!(config.outliers.threshold, 0.25);
        assert_eq!(config.outliers.batch_size, 100);
        assert!(config.outliers.absolute_limits);
        assert_eq!(config.outliers.excluded_races.len(), 2);
    }

    #[test]
    fn test_snapshot_requires_path() {
        let toml = r#"
[repository]
type = "snapshot"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert!(config.snapshot_path().is_err());
    }

    #[test]
    fn test_unknown_repository_type() {
        let toml = r#"
[repository]
type = "postgres"
"#;

        let config: RepositoryConfig = toml::from_str(toml).unwrap();
        assert!(config.repository_type().is_err());
    }
}

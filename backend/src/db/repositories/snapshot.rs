//! Read-only repository backed by a JSON snapshot of the records store.
//!
//! The snapshot layout is
//!
//! ```text
//! { "races": [Race, ...], "participants": [Participant, ...] }
//! ```
//!
//! Lap times are `HH:MM:SS.fff` strings and dates `YYYY-MM-DD`.

use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use super::local::LocalRepository;
use crate::api::{ParticipantSpeedRecord, RaceSpeeds};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, SpeedRepository};
use crate::models::{Participant, Race};
use crate::services::predicate::SelectionRule;

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    races: Vec<Race>,
    #[serde(default)]
    participants: Vec<Participant>,
}

/// Repository serving the records of a snapshot file.
#[derive(Clone)]
pub struct SnapshotRepository {
    inner: LocalRepository,
}

impl SnapshotRepository {
    /// Load a snapshot file.
    ///
    /// # Errors
    /// `NotFound` when the file does not exist, `ConfigurationError` when it
    /// cannot be read or parsed and `ValidationError` when a participant
    /// references a missing race.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            let context = ErrorContext::new("load_snapshot")
                .with_entity("snapshot")
                .with_entity_id(path.display())
                .with_details(e.to_string());
            if e.kind() == io::ErrorKind::NotFound {
                RepositoryError::not_found_with_context("Snapshot file does not exist", context)
            } else {
                RepositoryError::configuration_with_context("Failed to read snapshot", context)
            }
        })?;
        let repo = Self::from_json_str(&content)?;
        info!(
            "loaded snapshot {} ({} races, {} participants)",
            path.display(),
            repo.inner.race_count(),
            repo.inner.participant_count()
        );
        Ok(repo)
    }

    /// Parse a snapshot from its JSON text.
    pub fn from_json_str(content: &str) -> RepositoryResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(content).map_err(|e| {
            RepositoryError::configuration_with_context(
                format!("Failed to parse snapshot: {}", e),
                ErrorContext::new("load_snapshot").with_entity("snapshot"),
            )
        })?;

        let inner = LocalRepository::new();
        for race in snapshot.races {
            inner.insert_race(race);
        }
        for participant in snapshot.participants {
            inner.insert_participant(participant)?;
        }
        Ok(Self { inner })
    }

    pub fn race_count(&self) -> usize {
        self.inner.race_count()
    }

    pub fn participant_count(&self) -> usize {
        self.inner.participant_count()
    }
}

#[async_trait]
impl SpeedRepository for SnapshotRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.inner.health_check().await
    }

    async fn query_grouped_speeds(
        &self,
        rule: &SelectionRule,
    ) -> RepositoryResult<BTreeMap<i32, Vec<f64>>> {
        self.inner.query_grouped_speeds(rule).await
    }

    async fn query_race_speeds(
        &self,
        rule: &SelectionRule,
        year: i32,
    ) -> RepositoryResult<Vec<RaceSpeeds>> {
        self.inner.query_race_speeds(rule, year).await
    }

    async fn fetch_all_speed_tagged_participants(
        &self,
    ) -> RepositoryResult<Vec<ParticipantSpeedRecord>> {
        self.inner.fetch_all_speed_tagged_participants().await
    }
}

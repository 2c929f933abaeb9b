//! In-memory local repository implementation.
//!
//! Races and participants live in memory behind a single lock and every
//! selection rule is evaluated record by record. Suitable for unit tests,
//! local development and as the backing store of JSON snapshots.

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::api::{ParticipantSpeedRecord, RaceId, RaceSpeeds};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, SpeedRepository};
use crate::models::{Participant, Race};
use crate::services::predicate::SelectionRule;

/// In-memory records store.
///
/// Participants are kept in insertion order, which is the iteration order
/// every query reports in.
///
/// # Example
/// ```ignore
/// let repo = LocalRepository::new();
/// repo.insert_race(Race::new(1, date, "MALE", "SENIOR"));
/// repo.insert_participant(Participant::new(1, 1, "MALE", "SENIOR", 10))?;
/// assert_eq!(repo.participant_count(), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    races: HashMap<RaceId, Race>,
    participants: Vec<Participant>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            races: HashMap::new(),
            participants: Vec::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Add or replace a race.
    pub fn insert_race(&self, race: Race) {
        self.data.write().races.insert(race.id, race);
    }

    /// Add a participant to an already stored race.
    pub fn insert_participant(&self, participant: Participant) -> RepositoryResult<()> {
        let mut data = self.data.write();
        if !data.races.contains_key(&participant.race_id) {
            return Err(RepositoryError::validation_with_context(
                "participant references an unknown race",
                ErrorContext::new("insert_participant")
                    .with_entity("race")
                    .with_entity_id(participant.race_id),
            ));
        }
        data.participants.push(participant);
        Ok(())
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    pub fn race_count(&self) -> usize {
        self.data.read().races.len()
    }

    pub fn participant_count(&self) -> usize {
        self.data.read().participants.len()
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository is unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }

    /// Speeds of the participants matching `rule`, with their race, in store order.
    fn matching_speeds(&self, rule: &SelectionRule) -> Vec<(Race, f64)> {
        let data = self.data.read();
        data.participants
            .iter()
            .filter_map(|p| {
                let race = data.races.get(&p.race_id)?;
                if !rule.matches(race, p) {
                    return None;
                }
                p.speed().map(|speed| (race.clone(), speed))
            })
            .collect()
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeedRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn query_grouped_speeds(
        &self,
        rule: &SelectionRule,
    ) -> RepositoryResult<BTreeMap<i32, Vec<f64>>> {
        self.check_health("query_grouped_speeds")?;
        let mut grouped: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for (race, speed) in self.matching_speeds(rule) {
            grouped.entry(race.year()).or_default().push(speed);
        }
        debug!("grouped speeds into {} years for: {}", grouped.len(), rule);
        Ok(grouped)
    }

    async fn query_race_speeds(
        &self,
        rule: &SelectionRule,
        year: i32,
    ) -> RepositoryResult<Vec<RaceSpeeds>> {
        self.check_health("query_race_speeds")?;
        let rule = rule.restricted_to_year(year);

        let mut races: Vec<RaceSpeeds> = Vec::new();
        let mut positions: HashMap<RaceId, usize> = HashMap::new();
        for (race, speed) in self.matching_speeds(&rule) {
            let position = *positions.entry(race.id).or_insert_with(|| {
                races.push(RaceSpeeds {
                    race_id: race.id,
                    speeds: Vec::new(),
                });
                races.len() - 1
            });
            races[position].speeds.push(speed);
        }
        Ok(races)
    }

    async fn fetch_all_speed_tagged_participants(
        &self,
    ) -> RepositoryResult<Vec<ParticipantSpeedRecord>> {
        self.check_health("fetch_all_speed_tagged_participants")?;
        let data = self.data.read();
        let mut records: Vec<ParticipantSpeedRecord> = data
            .participants
            .iter()
            .filter_map(|p| {
                let race = data.races.get(&p.race_id)?;
                ParticipantSpeedRecord::from_participant(race, p)
            })
            .collect();
        records.sort_by(|a, b| {
            (a.race_id, &a.gender, &a.category, a.participant_id).cmp(&(
                b.race_id,
                &b.gender,
                &b.category,
                b.participant_id,
            ))
        });
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FilterCriteria;
    use crate::models::LapTime;
    use crate::services::predicate::build;
    use chrono::NaiveDate;

    fn race(id: i64, year: i32) -> Race {
        Race::new(id, NaiveDate::from_ymd_opt(year, 7, 9).unwrap(), "MALE", "SENIOR")
    }

    fn crew(id: i64, race_id: i64, minutes: u32) -> Participant {
        Participant::new(id, race_id, "MALE", "SENIOR", id)
            .with_distance(5556)
            .with_laps(vec![LapTime::from_hms_milli(0, minutes, 0, 0).unwrap()])
    }

    fn rule() -> SelectionRule {
        build(&FilterCriteria::new("MALE", "SENIOR")).unwrap()
    }

    #[test]
    fn test_participant_requires_race() {
        let repo = LocalRepository::new();
        let err = repo.insert_participant(crew(1, 99, 20)).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.participant_count(), 0);
    }

    #[tokio::test]
    async fn test_grouped_speeds_by_year() {
        let repo = LocalRepository::new();
        repo.insert_race(race(1, 2022));
        repo.insert_race(race(2, 2023));
        repo.insert_participant(crew(1, 1, 20)).unwrap();
        repo.insert_participant(crew(2, 2, 20)).unwrap();
        repo.insert_participant(crew(3, 2, 21)).unwrap();

        let grouped = repo.query_grouped_speeds(&rule()).await.unwrap();
        assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![2022, 2023]);
        assert_eq!(grouped[&2023].len(), 2);
    }

    #[tokio::test]
    async fn test_race_speeds_restricted_to_year() {
        let repo = LocalRepository::new();
        repo.insert_race(race(1, 2022));
        repo.insert_race(race(2, 2023));
        repo.insert_race(race(3, 2023));
        repo.insert_participant(crew(1, 3, 20)).unwrap();
        repo.insert_participant(crew(2, 1, 20)).unwrap();
        repo.insert_participant(crew(3, 2, 20)).unwrap();
        repo.insert_participant(crew(4, 3, 22)).unwrap();

        let races = repo.query_race_speeds(&rule(), 2023).await.unwrap();
        let ids: Vec<RaceId> = races.iter().map(|r| r.race_id).collect();
        assert_eq!(ids, vec![RaceId::new(3), RaceId::new(2)]);
        assert_eq!(races[0].speeds.len(), 2);
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_queries() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.query_grouped_speeds(&rule()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(repo.fetch_all_speed_tagged_participants().await.is_err());
    }

    #[tokio::test]
    async fn test_feed_skips_undefined_speeds_and_sorts() {
        let repo = LocalRepository::new();
        repo.insert_race(race(2, 2023));
        repo.insert_race(race(1, 2023));
        repo.insert_participant(crew(5, 2, 20)).unwrap();
        repo.insert_participant(crew(4, 1, 20)).unwrap();
        repo.insert_participant(Participant::new(6, 1, "MALE", "SENIOR", 6)).unwrap();
        repo.insert_participant(crew(3, 1, 21)).unwrap();

        let feed = repo.fetch_all_speed_tagged_participants().await.unwrap();
        let ids: Vec<i64> = feed.iter().map(|r| r.participant_id.value()).collect();
        assert_eq!(ids, vec![3, 4, 5]);
    }
}

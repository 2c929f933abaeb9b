//! Speed repository trait.
//!
//! This trait defines the read operations the analytics engine needs from a
//! records store: filtered speed queries driven by a [`SelectionRule`] and a
//! bulk feed of speed-tagged participants for the outlier scanner.

use async_trait::async_trait;
use std::collections::BTreeMap;

use super::error::RepositoryResult;
use crate::api::{ParticipantSpeedRecord, RaceSpeeds};
use crate::services::predicate::SelectionRule;

/// Repository trait for speed queries.
///
/// Implementations never mutate stored records and must only return speeds
/// for participants whose speed is defined (laps present, positive distance,
/// positive final lap).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait SpeedRepository: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Speeds of every record matching `rule`, grouped by race year.
    ///
    /// Each year's speeds are in store iteration order.
    ///
    /// # Returns
    /// * `Ok(BTreeMap<i32, Vec<f64>>)` - Year to speeds (empty when nothing matches)
    /// * `Err(RepositoryError)` - If the query fails
    async fn query_grouped_speeds(
        &self,
        rule: &SelectionRule,
    ) -> RepositoryResult<BTreeMap<i32, Vec<f64>>>;

    /// Speeds of every record matching `rule` in `year`, one entry per race.
    ///
    /// Races without any matching record are omitted.
    async fn query_race_speeds(
        &self,
        rule: &SelectionRule,
        year: i32,
    ) -> RepositoryResult<Vec<RaceSpeeds>>;

    /// The `index`-th fastest speed (1-based) of each race matching `rule` in `year`.
    ///
    /// Races with fewer than `index` speeds are skipped. Stores able to rank
    /// server-side should override this.
    async fn query_ranked_speeds(
        &self,
        rule: &SelectionRule,
        year: i32,
        index: usize,
    ) -> RepositoryResult<Vec<f64>> {
        let races = self.query_race_speeds(rule, year).await?;
        Ok(races
            .iter()
            .filter_map(|race| race.nth_fastest(index))
            .collect())
    }

    /// Every participant with a defined speed, unfiltered.
    ///
    /// Sorted by race, gender and category so contiguous runs form the
    /// outlier scanner's groups.
    async fn fetch_all_speed_tagged_participants(
        &self,
    ) -> RepositoryResult<Vec<ParticipantSpeedRecord>>;
}

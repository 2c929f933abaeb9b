//! Aggregation engine: yearly speed distributions and per-race order statistics.
//!
//! Both operations take an already composed [`SelectionRule`]; the store
//! supplies raw speeds and this module applies trimming, year restriction
//! and ranking.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::error::{AnalyticsError, AnalyticsResult};
use super::normalize::TrimBounds;
use super::predicate::{DayPolicy, PredicateBuilder, SelectionRule};
use crate::api::{FilterCriteria, YearDistribution};
use crate::db::repository::SpeedRepository;

/// Unspecified-day policy of each aggregation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Applied by [`yearly_speeds_by`]
    pub yearly_unset_day: DayPolicy,
    /// Applied by [`nth_speeds_by`]
    pub ranked_unset_day: DayPolicy,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            yearly_unset_day: DayPolicy::All,
            ranked_unset_day: DayPolicy::First,
        }
    }
}

/// Speeds matching `rule`, grouped by race year.
///
/// With `normalize`, the two-sigma trim runs over the whole unrestricted
/// distribution before `years` narrows it; years left without speeds are
/// dropped. An empty `years` keeps every year.
pub async fn yearly_distribution<R: SpeedRepository + ?Sized>(
    repo: &R,
    rule: &SelectionRule,
    years: &[i32],
    normalize: bool,
) -> AnalyticsResult<YearDistribution> {
    let mut grouped = repo.query_grouped_speeds(rule).await?;

    if normalize {
        let population: Vec<f64> = grouped.values().flatten().copied().collect();
        if let Some(bounds) = TrimBounds::from_values(&population) {
            debug!(
                "trimming {} speeds to [{:.3}, {:.3}]",
                population.len(),
                bounds.lower,
                bounds.upper
            );
            for speeds in grouped.values_mut() {
                speeds.retain(|s| bounds.contains(*s));
            }
            grouped.retain(|_, speeds| !speeds.is_empty());
        }
    }

    if !years.is_empty() {
        grouped.retain(|year, _| years.contains(year));
    }

    Ok(YearDistribution::from(grouped))
}

/// The `index`-th fastest speed (1-based) of every race matching `rule` in `year`.
///
/// Races with fewer than `index` qualifying speeds are left out. With
/// `normalize`, the trim is computed over the year's whole speed population
/// before ranking. Values come back in store iteration order.
pub async fn nth_order_statistic<R: SpeedRepository + ?Sized>(
    repo: &R,
    rule: &SelectionRule,
    year: i32,
    index: usize,
    normalize: bool,
) -> AnalyticsResult<Vec<f64>> {
    validate_rank(year, index)?;

    if !normalize {
        return Ok(repo.query_ranked_speeds(rule, year, index).await?);
    }

    let mut races = repo.query_race_speeds(rule, year).await?;
    let population: Vec<f64> = races.iter().flat_map(|r| r.speeds.iter().copied()).collect();
    if let Some(bounds) = TrimBounds::from_values(&population) {
        for race in races.iter_mut() {
            race.speeds.retain(|s| bounds.contains(*s));
        }
    }
    Ok(races
        .iter()
        .filter_map(|race| race.nth_fastest(index))
        .collect())
}

/// [`nth_order_statistic`] for several years, one concurrent query per year.
///
/// Years without any qualifying race are absent from the result. The first
/// failing year aborts the remaining queries.
pub async fn nth_speeds_by_years(
    repo: Arc<dyn SpeedRepository>,
    rule: &SelectionRule,
    years: &[i32],
    index: usize,
    normalize: bool,
) -> AnalyticsResult<YearDistribution> {
    for year in years {
        validate_rank(*year, index)?;
    }

    let mut set = JoinSet::new();
    for &year in years {
        let repo = Arc::clone(&repo);
        let rule = rule.clone();
        set.spawn(async move {
            let speeds = nth_order_statistic(repo.as_ref(), &rule, year, index, normalize).await;
            (year, speeds)
        });
    }

    let mut grouped = BTreeMap::new();
    while let Some(joined) = set.join_next().await {
        let (year, speeds) =
            joined.map_err(|e| AnalyticsError::Internal(format!("ranking task failed: {}", e)))?;
        let speeds = speeds?;
        if !speeds.is_empty() {
            grouped.insert(year, speeds);
        }
    }

    Ok(YearDistribution::from(grouped))
}

/// Compose `criteria` with the yearly day policy and run [`yearly_distribution`].
pub async fn yearly_speeds_by<R: SpeedRepository + ?Sized>(
    repo: &R,
    settings: &AnalyticsSettings,
    criteria: &FilterCriteria,
    years: &[i32],
) -> AnalyticsResult<YearDistribution> {
    let rule = PredicateBuilder::new(settings.yearly_unset_day).build(criteria)?;
    let distribution = yearly_distribution(repo, &rule, years, criteria.normalize).await?;
    info!(
        "yearly distribution for {}/{}: {} speeds over {} years",
        criteria.gender,
        criteria.category,
        distribution.len(),
        distribution.years.len()
    );
    Ok(distribution)
}

/// Compose `criteria` with the ranked day policy and run [`nth_order_statistic`].
pub async fn nth_speeds_by<R: SpeedRepository + ?Sized>(
    repo: &R,
    settings: &AnalyticsSettings,
    criteria: &FilterCriteria,
    year: i32,
    index: usize,
) -> AnalyticsResult<Vec<f64>> {
    validate_rank(year, index)?;
    let rule = PredicateBuilder::new(settings.ranked_unset_day).build(criteria)?;
    nth_order_statistic(repo, &rule, year, index, criteria.normalize).await
}

fn validate_rank(year: i32, index: usize) -> AnalyticsResult<()> {
    if index == 0 {
        return Err(AnalyticsError::invalid_parameter("index must be greater than 0"));
    }
    if year <= 0 {
        return Err(AnalyticsError::invalid_parameter(format!(
            "year must be greater than 0 (got {})",
            year
        )));
    }
    Ok(())
}

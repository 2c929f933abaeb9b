//! Public API surface of the speed analytics engine.
//!
//! This file consolidates the types callers exchange with the engine: ids,
//! filter criteria, speed-tagged participant records and the shapes returned
//! by the aggregation and outlier services.
//! All types derive Serialize/Deserialize so they can be dumped to JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::models::{LapTime, Participant, Race};

crate::define_id_type!(i64, RaceId);
crate::define_id_type!(i64, ParticipantId);
crate::define_id_type!(i64, ClubId);
crate::define_id_type!(i64, LeagueId);
crate::define_id_type!(i64, FlagId);

// =========================================================
// Filter criteria
// =========================================================

/// Optional selection applied to race/participant records.
///
/// Gender and category are mandatory; everything else narrows the selection
/// only when set. `day` accepts `None`/`0` (unspecified), `1` or `2`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub club_id: Option<ClubId>,
    #[serde(default)]
    pub league_id: Option<LeagueId>,
    #[serde(default)]
    pub flag_id: Option<FlagId>,
    pub gender: String,
    pub category: String,
    #[serde(default)]
    pub day: Option<i16>,
    #[serde(default)]
    pub branch_teams: bool,
    #[serde(default)]
    pub only_league_races: bool,
    #[serde(default)]
    pub normalize: bool,
}

impl FilterCriteria {
    pub fn new(gender: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            gender: gender.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_club(mut self, club_id: i64) -> Self {
        self.club_id = Some(ClubId::new(club_id));
        self
    }

    pub fn with_league(mut self, league_id: i64) -> Self {
        self.league_id = Some(LeagueId::new(league_id));
        self
    }

    pub fn with_flag(mut self, flag_id: i64) -> Self {
        self.flag_id = Some(FlagId::new(flag_id));
        self
    }

    pub fn with_day(mut self, day: i16) -> Self {
        self.day = Some(day);
        self
    }

    pub fn branch_teams(mut self) -> Self {
        self.branch_teams = true;
        self
    }

    pub fn only_league_races(mut self) -> Self {
        self.only_league_races = true;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    /// Positive league id, if any.
    pub fn league(&self) -> Option<LeagueId> {
        self.league_id.filter(|id| id.is_set())
    }

    /// Positive flag id, if any.
    pub fn flag(&self) -> Option<FlagId> {
        self.flag_id.filter(|id| id.is_set())
    }

    /// Positive club id, if any.
    pub fn club(&self) -> Option<ClubId> {
        self.club_id.filter(|id| id.is_set())
    }

    /// League-scoped queries require exact gender/category matches.
    pub fn is_league_scoped(&self) -> bool {
        self.only_league_races || self.league().is_some()
    }
}

// =========================================================
// Speed records
// =========================================================

/// A participant joined with its race and tagged with its lap-derived speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSpeedRecord {
    pub participant_id: ParticipantId,
    pub race_id: RaceId,
    pub gender: String,
    pub category: String,
    pub day: i16,
    pub club_id: ClubId,
    pub club_name: Option<String>,
    /// km/h
    pub speed: f64,
    pub disqualified: bool,
    pub retired: bool,
    pub guest: bool,
    pub absent: bool,
}

impl ParticipantSpeedRecord {
    /// Tag a participant with its speed; `None` when the speed is undefined.
    pub fn from_participant(race: &Race, participant: &Participant) -> Option<Self> {
        let speed = participant.speed()?;
        Some(Self {
            participant_id: participant.id,
            race_id: race.id,
            gender: participant.gender.clone(),
            category: participant.category.clone(),
            day: race.day,
            club_id: participant.club_id,
            club_name: participant.club_names.first().cloned(),
            speed,
            disqualified: participant.disqualified,
            retired: participant.retired,
            guest: participant.guest,
            absent: participant.absent,
        })
    }
}

/// Qualifying speeds of a single race, in store order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSpeeds {
    pub race_id: RaceId,
    pub speeds: Vec<f64>,
}

impl RaceSpeeds {
    pub fn new(race_id: i64, speeds: Vec<f64>) -> Self {
        Self {
            race_id: RaceId::new(race_id),
            speeds,
        }
    }

    /// Speed at 1-based rank `index` with speeds sorted fastest first.
    pub fn nth_fastest(&self, index: usize) -> Option<f64> {
        if index == 0 || self.speeds.len() < index {
            return None;
        }
        let mut sorted = self.speeds.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        sorted.get(index - 1).copied()
    }
}

// =========================================================
// Aggregation results
// =========================================================

/// Speeds grouped by race year.
///
/// `years` is sorted ascending; each year's speeds keep the order the
/// records store returned them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearDistribution {
    pub years: Vec<i32>,
    pub speeds: BTreeMap<i32, Vec<f64>>,
}

impl YearDistribution {
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn get(&self, year: i32) -> Option<&[f64]> {
        self.speeds.get(&year).map(Vec::as_slice)
    }

    /// Total number of speeds across every year.
    pub fn len(&self) -> usize {
        self.speeds.values().map(Vec::len).sum()
    }
}

impl From<BTreeMap<i32, Vec<f64>>> for YearDistribution {
    fn from(speeds: BTreeMap<i32, Vec<f64>>) -> Self {
        Self {
            years: speeds.keys().copied().collect(),
            speeds,
        }
    }
}

/// Distribution statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
}

/// Statistics for one year of a [`YearDistribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearSummary {
    pub year: i32,
    pub stats: DistributionStats,
}

// =========================================================
// Outliers
// =========================================================

/// Why a participant was reported.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierReason {
    /// Speed deviates from the group mean by more than the threshold
    RelativeDeviation,
    /// Speed falls outside the absolute km/h limits
    AbsoluteLimit,
}

/// A participant whose speed does not fit its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub race_id: RaceId,
    pub participant_id: ParticipantId,
    /// Group mean; `0.0` for [`OutlierReason::AbsoluteLimit`] reports
    pub average_speed: f64,
    pub speed: f64,
    pub reason: OutlierReason,
}

/// Result of an outlier scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierScan {
    /// Reports in collection order (no ordering across batches)
    pub reports: Vec<OutlierReport>,
    /// Distinct races with at least one report, first-seen order
    pub races: Vec<RaceId>,
    pub groups_scanned: usize,
    pub groups_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nth_fastest() {
        let race = RaceSpeeds::new(1, vec![9.0, 7.0, 8.0]);
        assert_eq!(race.nth_fastest(1), Some(9.0));
        assert_eq!(race.nth_fastest(2), Some(8.0));
        assert_eq!(race.nth_fastest(3), Some(7.0));
        assert_eq!(race.nth_fastest(4), None);
        assert_eq!(race.nth_fastest(0), None);
    }

    #[test]
    fn test_league_scope() {
        assert!(!FilterCriteria::new("MALE", "SENIOR").is_league_scoped());
        assert!(FilterCriteria::new("MALE", "SENIOR").with_league(3).is_league_scoped());
        assert!(FilterCriteria::new("MALE", "SENIOR").only_league_races().is_league_scoped());
        // non-positive ids do not scope the query
        assert!(!FilterCriteria::new("MALE", "SENIOR").with_league(0).is_league_scoped());
    }

    #[test]
    fn test_year_distribution_from_map() {
        let mut map = BTreeMap::new();
        map.insert(2021, vec![15.0]);
        map.insert(2019, vec![14.0, 14.5]);
        let distribution = YearDistribution::from(map);
        assert_eq!(distribution.years, vec![2019, 2021]);
        assert_eq!(distribution.len(), 3);
        assert_eq!(distribution.get(2019), Some(&[14.0, 14.5][..]));
        assert!(distribution.get(2020).is_none());
    }

    #[test]
    fn test_outlier_reason_serialization() {
        let json = serde_json::to_string(&OutlierReason::AbsoluteLimit).unwrap();
        assert_eq!(json, "\"absolute_limit\"");
    }
}

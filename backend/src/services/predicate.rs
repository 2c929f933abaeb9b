//! Predicate builder.
//!
//! Turns sparse [`FilterCriteria`] into a single [`SelectionRule`]: an
//! immutable conjunction of [`Condition`]s evaluated against a race joined
//! with one of its participants. Records stores evaluate the rule in memory
//! or translate its conditions into their own query language.

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{AnalyticsError, AnalyticsResult};
use crate::api::{ClubId, FilterCriteria, FlagId, LeagueId};
use crate::models::{Participant, Race, ALL};

/// How an unspecified day is interpreted.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPolicy {
    /// No day restriction, every regatta day is admitted.
    #[default]
    All,
    /// Unspecified day means day 1.
    First,
}

/// A single constraint of a [`SelectionRule`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    RaceNotCancelled,
    HasLaps,
    NotRetired,
    NotGuest,
    NotAbsent,
    HasDistance,
    /// Final lap strictly after the start, so speed never divides by zero.
    PositiveFinalLap,
    NotDisqualified,
    /// Participant gender equals `value`; the race gender must be `value`
    /// too, or [`ALL`] unless `exact`.
    Gender { value: String, exact: bool },
    /// Same as [`Condition::Gender`] for categories.
    Category { value: String, exact: bool },
    Day(i16),
    /// Branch crews only (`true`) or branch crews excluded (`false`).
    BranchTeam(bool),
    LeagueRace,
    Club(ClubId),
    League(LeagueId),
    Flag(FlagId),
    Year(i32),
}

impl Condition {
    /// Evaluate the condition against a participant and its race.
    pub fn matches(&self, race: &Race, participant: &Participant) -> bool {
        match self {
            Self::RaceNotCancelled => !race.cancelled,
            Self::HasLaps => !participant.laps.is_empty(),
            Self::NotRetired => !participant.retired,
            Self::NotGuest => !participant.guest,
            Self::NotAbsent => !participant.absent,
            Self::HasDistance => participant.distance.is_some(),
            Self::PositiveFinalLap => participant
                .final_lap()
                .map(|lap| lap.is_positive())
                .unwrap_or(false),
            Self::NotDisqualified => !participant.disqualified,
            Self::Gender { value, exact } => {
                tag_matches(&participant.gender, &race.gender, value, *exact)
            }
            Self::Category { value, exact } => {
                tag_matches(&participant.category, &race.category, value, *exact)
            }
            Self::Day(day) => race.day == *day,
            Self::BranchTeam(branch) => participant.is_branch_team() == *branch,
            Self::LeagueRace => race.league_id.is_some(),
            Self::Club(id) => participant.club_id == *id,
            Self::League(id) => race.league_id == Some(*id),
            Self::Flag(id) => race.flag_id == Some(*id),
            Self::Year(year) => race.year() == *year,
        }
    }
}

fn tag_matches(participant_tag: &str, race_tag: &str, value: &str, exact: bool) -> bool {
    participant_tag == value && (race_tag == value || (!exact && race_tag == ALL))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RaceNotCancelled => write!(f, "NOT race.cancelled"),
            Self::HasLaps => write!(f, "cardinality(p.laps) > 0"),
            Self::NotRetired => write!(f, "NOT p.retired"),
            Self::NotGuest => write!(f, "NOT p.guest"),
            Self::NotAbsent => write!(f, "NOT p.absent"),
            Self::HasDistance => write!(f, "p.distance IS NOT NULL"),
            Self::PositiveFinalLap => write!(f, "final_lap(p.laps) > 0"),
            Self::NotDisqualified => write!(f, "NOT p.disqualified"),
            Self::Gender { value, exact: true } => {
                write!(f, "p.gender = '{value}' AND race.gender = '{value}'")
            }
            Self::Gender { value, exact: false } => write!(
                f,
                "p.gender = '{value}' AND race.gender IN ('{value}', '{ALL}')"
            ),
            Self::Category { value, exact: true } => {
                write!(f, "p.category = '{value}' AND race.category = '{value}'")
            }
            Self::Category { value, exact: false } => write!(
                f,
                "p.category = '{value}' AND race.category IN ('{value}', '{ALL}')"
            ),
            Self::Day(day) => write!(f, "race.day = {day}"),
            Self::BranchTeam(true) => write!(f, "p.club_names ends with ' B'"),
            Self::BranchTeam(false) => write!(f, "NOT p.club_names ends with ' B'"),
            Self::LeagueRace => write!(f, "race.league_id IS NOT NULL"),
            Self::Club(id) => write!(f, "p.club_id = {id}"),
            Self::League(id) => write!(f, "race.league_id = {id}"),
            Self::Flag(id) => write!(f, "race.flag_id = {id}"),
            Self::Year(year) => write!(f, "year(race.date) = {year}"),
        }
    }
}

/// Immutable conjunction of [`Condition`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRule {
    conditions: Vec<Condition>,
}

impl SelectionRule {
    /// Conditions every speed query carries, whatever the criteria.
    pub fn base() -> Self {
        Self {
            conditions: vec![
                Condition::RaceNotCancelled,
                Condition::HasLaps,
                Condition::NotRetired,
                Condition::NotGuest,
                Condition::NotAbsent,
                Condition::HasDistance,
                Condition::PositiveFinalLap,
                Condition::NotDisqualified,
            ],
        }
    }

    fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// A copy of this rule further restricted to races held in `year`.
    pub fn restricted_to_year(&self, year: i32) -> Self {
        self.clone().and(Condition::Year(year))
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn contains(&self, condition: &Condition) -> bool {
        self.conditions.contains(condition)
    }

    /// True when the participant and its race satisfy every condition.
    pub fn matches(&self, race: &Race, participant: &Participant) -> bool {
        self.conditions.iter().all(|c| c.matches(race, participant))
    }
}

impl fmt::Display for SelectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(" AND "))
    }
}

/// Builds [`SelectionRule`]s with a configured unspecified-day policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateBuilder {
    unset_day: DayPolicy,
}

impl PredicateBuilder {
    pub fn new(unset_day: DayPolicy) -> Self {
        Self { unset_day }
    }

    pub fn unset_day(&self) -> DayPolicy {
        self.unset_day
    }

    /// Compose the selection rule for `criteria`.
    ///
    /// # Errors
    /// `InvalidCriteria` when gender or category is empty, or when the day is
    /// not unspecified (`None`/`0`), `1` or `2`.
    pub fn build(&self, criteria: &FilterCriteria) -> AnalyticsResult<SelectionRule> {
        let gender = criteria.gender.trim();
        if gender.is_empty() {
            return Err(AnalyticsError::invalid_criteria("gender is required"));
        }
        let category = criteria.category.trim();
        if category.is_empty() {
            return Err(AnalyticsError::invalid_criteria("category is required"));
        }
        let day = self.resolve_day(criteria.day)?;

        let exact = criteria.is_league_scoped();
        let mut rule = SelectionRule::base()
            .and(Condition::Gender {
                value: gender.to_string(),
                exact,
            })
            .and(Condition::Category {
                value: category.to_string(),
                exact,
            });

        if let Some(day) = day {
            rule = rule.and(Condition::Day(day));
        }

        // Branch crews are only excluded when both a league and a flag are
        // selected; any other unscoped query mixes first and branch crews.
        if criteria.branch_teams {
            rule = rule.and(Condition::BranchTeam(true));
        } else if criteria.league().is_some() && criteria.flag().is_some() {
            rule = rule.and(Condition::BranchTeam(false));
        }

        if criteria.only_league_races {
            rule = rule.and(Condition::LeagueRace);
        }
        if let Some(club) = criteria.club() {
            rule = rule.and(Condition::Club(club));
        }
        if let Some(league) = criteria.league() {
            rule = rule.and(Condition::League(league));
        }
        if let Some(flag) = criteria.flag() {
            rule = rule.and(Condition::Flag(flag));
        }

        debug!("composed selection rule: {}", rule);
        Ok(rule)
    }

    fn resolve_day(&self, day: Option<i16>) -> AnalyticsResult<Option<i16>> {
        match day.unwrap_or(0) {
            0 => Ok(match self.unset_day {
                DayPolicy::All => None,
                DayPolicy::First => Some(1),
            }),
            day @ (1 | 2) => Ok(Some(day)),
            other => Err(AnalyticsError::invalid_criteria(format!(
                "day must be unspecified, 1 or 2 (got {})",
                other
            ))),
        }
    }
}

/// Compose a selection rule leaving an unspecified day unrestricted.
pub fn build(criteria: &FilterCriteria) -> AnalyticsResult<SelectionRule> {
    PredicateBuilder::default().build(criteria)
}

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::api::{FlagId, LeagueId, RaceId};

/// Race-level gender/category tag admitting every participant gender/category.
pub const ALL: &str = "ALL";

/// A single race (one day of a regatta) as kept by the records store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub date: NaiveDate,
    /// Regatta day (1 for single-day events)
    #[serde(default = "default_day")]
    pub day: i16,
    /// `MALE`, `FEMALE`, `MIX` or [`ALL`]
    pub gender: String,
    /// `SENIOR`, `VETERAN`, `SCHOOL`, ... or [`ALL`]
    pub category: String,
    #[serde(default)]
    pub league_id: Option<LeagueId>,
    #[serde(default)]
    pub flag_id: Option<FlagId>,
    #[serde(default)]
    pub cancelled: bool,
}

fn default_day() -> i16 {
    1
}

impl Race {
    pub fn new(
        id: i64,
        date: NaiveDate,
        gender: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: RaceId::new(id),
            date,
            day: 1,
            gender: gender.into(),
            category: category.into(),
            league_id: None,
            flag_id: None,
            cancelled: false,
        }
    }

    pub fn with_day(mut self, day: i16) -> Self {
        self.day = day;
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

    pub fn cancelled(mut self) -> Self {
        self.cancelled = true;
        self
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

use serde::{Deserialize, Serialize};

use super::lap::LapTime;
use crate::api::{ClubId, ParticipantId, RaceId};

/// Club-name suffix used for a club's second (branch) crew, e.g. `"ORIO B"`.
pub const BRANCH_SUFFIX: &str = " B";

/// Metres per second to kilometres per hour.
const MS_TO_KMH: f64 = 3.6;

/// A crew taking part in a race, as kept by the records store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub race_id: RaceId,
    pub gender: String,
    pub category: String,
    /// Rowed distance in metres
    #[serde(default)]
    pub distance: Option<u32>,
    pub club_id: ClubId,
    /// Every name the crew was registered under (entity name, raw sheet name)
    #[serde(default)]
    pub club_names: Vec<String>,
    #[serde(default)]
    pub laps: Vec<LapTime>,
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub guest: bool,
    #[serde(default)]
    pub absent: bool,
    /// Set when any penalty on the crew is a disqualification
    #[serde(default)]
    pub disqualified: bool,
}

impl Participant {
    pub fn new(
        id: i64,
        race_id: i64,
        gender: impl Into<String>,
        category: impl Into<String>,
        club_id: i64,
    ) -> Self {
        Self {
            id: ParticipantId::new(id),
            race_id: RaceId::new(race_id),
            gender: gender.into(),
            category: category.into(),
            distance: None,
            club_id: ClubId::new(club_id),
            club_names: Vec::new(),
            laps: Vec::new(),
            retired: false,
            guest: false,
            absent: false,
            disqualified: false,
        }
    }

    pub fn with_distance(mut self, metres: u32) -> Self {
        self.distance = Some(metres);
        self
    }

    pub fn with_club_name(mut self, name: impl Into<String>) -> Self {
        self.club_names.push(name.into());
        self
    }

    pub fn with_laps(mut self, laps: Vec<LapTime>) -> Self {
        self.laps = laps;
        self
    }

    pub fn final_lap(&self) -> Option<&LapTime> {
        self.laps.last()
    }

    /// True when any registered club name carries the branch suffix.
    pub fn is_branch_team(&self) -> bool {
        self.club_names
            .iter()
            .any(|name| name.trim_end().ends_with(BRANCH_SUFFIX))
    }

    /// Average speed over the race in km/h.
    ///
    /// `None` unless the crew has laps, a positive distance and a final lap
    /// strictly after the start.
    pub fn speed(&self) -> Option<f64> {
        let distance = self.distance.filter(|d| *d > 0)?;
        let elapsed = self.final_lap()?.elapsed_seconds();
        if elapsed <= 0.0 {
            return None;
        }
        Some(distance as f64 / elapsed * MS_TO_KMH)
    }
}

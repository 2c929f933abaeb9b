#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveDate;
use regatta_speeds::db::LocalRepository;
use regatta_speeds::models::{LapTime, Participant, Race};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores the variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    saved: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let saved = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { saved }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.saved.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Every crew rows 5000 m, so the speed is `18000 / seconds` km/h.
pub const DISTANCE: u32 = 5000;

pub fn speed_for(seconds: u32) -> f64 {
    DISTANCE as f64 / seconds as f64 * 3.6
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn lap(seconds: u32) -> LapTime {
    LapTime::from_hms_milli(seconds / 3600, seconds % 3600 / 60, seconds % 60, 0).unwrap()
}

pub fn crew(id: i64, race: i64, gender: &str, club: i64, name: &str, seconds: u32) -> Participant {
    Participant::new(id, race, gender, "SENIOR", club)
        .with_club_name(name)
        .with_distance(DISTANCE)
        .with_laps(vec![lap(seconds / 2), lap(seconds)])
}

/// Seven races over 2021-2023.
///
/// | race | date       | day | gender | league | flag | notes     |
/// |------|------------|-----|--------|--------|------|-----------|
/// | 1    | 2021-07-04 | 1   | MALE   | 1      | 10   |           |
/// | 2    | 2021-07-05 | 2   | MALE   | 1      | 10   |           |
/// | 3    | 2022-07-03 | 1   | ALL    | -      | 11   |           |
/// | 4    | 2022-08-01 | 1   | MALE   | 1      | 12   |           |
/// | 5    | 2023-07-09 | 1   | MALE   | 1      | 10   |           |
/// | 6    | 2023-07-10 | 1   | MALE   | 1      | 10   | cancelled |
/// | 7    | 2023-07-16 | 1   | FEMALE | 2      | 13   |           |
pub fn regatta_store() -> LocalRepository {
    let repo = LocalRepository::new();

    let races = vec![
        Race::new(1, date(2021, 7, 4), "MALE", "SENIOR").with_league(1).with_flag(10),
        Race::new(2, date(2021, 7, 5), "MALE", "SENIOR")
            .with_day(2)
            .with_league(1)
            .with_flag(10),
        Race::new(3, date(2022, 7, 3), "ALL", "SENIOR").with_flag(11),
        Race::new(4, date(2022, 8, 1), "MALE", "SENIOR").with_league(1).with_flag(12),
        Race::new(5, date(2023, 7, 9), "MALE", "SENIOR").with_league(1).with_flag(10),
        Race::new(6, date(2023, 7, 10), "MALE", "SENIOR")
            .with_league(1)
            .with_flag(10)
            .cancelled(),
        Race::new(7, date(2023, 7, 16), "FEMALE", "SENIOR").with_league(2).with_flag(13),
    ];
    for race in races {
        repo.insert_race(race);
    }

    let mut retired = crew(104, 1, "MALE", 3, "BERMEO", 1000);
    retired.retired = true;
    let mut disqualified = crew(403, 4, "MALE", 3, "BERMEO", 1000);
    disqualified.disqualified = true;
    let mut guest = crew(503, 5, "MALE", 3, "BERMEO", 1000);
    guest.guest = true;

    let participants = vec![
        crew(101, 1, "MALE", 1, "ORIO", 1125),
        crew(102, 1, "MALE", 2, "URDAIBAI", 1200),
        crew(103, 1, "MALE", 1, "ORIO B", 1250),
        retired,
        crew(201, 2, "MALE", 1, "ORIO", 1000),
        crew(202, 2, "MALE", 2, "URDAIBAI", 1200),
        crew(301, 3, "MALE", 1, "ORIO", 1200),
        crew(302, 3, "FEMALE", 4, "ORIO", 1500),
        crew(401, 4, "MALE", 1, "ORIO", 1125),
        crew(402, 4, "MALE", 2, "URDAIBAI", 1250),
        disqualified,
        crew(501, 5, "MALE", 1, "ORIO", 1000),
        crew(502, 5, "MALE", 2, "URDAIBAI", 1125),
        guest,
        Participant::new(504, 5, "MALE", "SENIOR", 5).with_distance(DISTANCE),
        crew(601, 6, "MALE", 1, "ORIO", 1200),
        crew(701, 7, "FEMALE", 4, "ORIO", 1500),
        crew(702, 7, "FEMALE", 6, "TOLEDO", 1440),
    ];
    for participant in participants {
        repo.insert_participant(participant).unwrap();
    }

    repo
}

/// Assert two speed lists are equal up to float rounding.
pub fn assert_speeds(actual: &[f64], expected: &[f64]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "speed lists differ: {:?} vs {:?}",
        actual,
        expected
    );
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "speed lists differ: {:?} vs {:?}", actual, expected);
    }
}

//! Concurrent outlier scanner.
//!
//! Participants are partitioned into (race, gender, category) groups and the
//! groups into contiguous batches. One task per batch scans its groups and
//! hands every finding to a single collector task over a channel; the
//! collector owns the resulting [`OutlierScan`].

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use super::error::{AnalyticsError, AnalyticsResult};
use crate::api::{OutlierReason, OutlierReport, OutlierScan, ParticipantSpeedRecord, RaceId};
use crate::db::repository::SpeedRepository;

/// Speeds above this are implausible for a rowing crew (km/h).
pub const SPEED_UPPER_LIMIT: f64 = 20.0;
/// Speeds below this are implausible for a rowing crew (km/h).
pub const SPEED_LOWER_LIMIT: f64 = 8.0;

/// Scan parameters, passed by value into the scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Allowed deviation from the group mean, as a fraction of it
    pub threshold: f64,
    /// Groups per worker
    pub batch_size: usize,
    /// Also report speeds outside [`SPEED_LOWER_LIMIT`]..[`SPEED_UPPER_LIMIT`]
    pub absolute_limits: bool,
    /// Races whose groups are never reported
    pub excluded_races: Vec<RaceId>,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            batch_size: 500,
            absolute_limits: false,
            excluded_races: Vec::new(),
        }
    }
}

impl OutlierConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_absolute_limits(mut self) -> Self {
        self.absolute_limits = true;
        self
    }

    pub fn excluding(mut self, race_id: i64) -> Self {
        self.excluded_races.push(RaceId::new(race_id));
        self
    }
}

/// Split speed-tagged participants into groups sharing race, gender and category.
///
/// Single pass over `records`: a new group starts whenever a record differs
/// from the first member of the current group, so the input must already be
/// sorted by those keys.
pub fn group_participants(
    records: Vec<ParticipantSpeedRecord>,
) -> Vec<Vec<ParticipantSpeedRecord>> {
    let mut groups: Vec<Vec<ParticipantSpeedRecord>> = Vec::new();
    let mut current: Vec<ParticipantSpeedRecord> = Vec::new();

    for record in records {
        let starts_group = current.first().is_some_and(|first| {
            first.race_id != record.race_id
                || first.gender != record.gender
                || first.category != record.category
        });
        if starts_group {
            groups.push(std::mem::take(&mut current));
        }
        current.push(record);
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Per-group outlier rules with the exclusion set resolved.
#[derive(Debug, Clone)]
pub struct OutlierDetector {
    threshold: f64,
    absolute_limits: bool,
    excluded: HashSet<RaceId>,
}

impl OutlierDetector {
    pub fn new(config: &OutlierConfig) -> Self {
        Self {
            threshold: config.threshold,
            absolute_limits: config.absolute_limits,
            excluded: config.excluded_races.iter().copied().collect(),
        }
    }

    /// Reports for one group in participant order, `None` when the group's
    /// race is excluded.
    ///
    /// A participant gets at most one report: the absolute limits are only
    /// checked when the relative deviation did not trigger.
    pub fn scan_group(&self, group: &[ParticipantSpeedRecord]) -> Option<Vec<OutlierReport>> {
        let first = group.first()?;
        if self.excluded.contains(&first.race_id) {
            return None;
        }

        let mean = group.iter().map(|p| p.speed).sum::<f64>() / group.len() as f64;
        let upper = mean * (1.0 + self.threshold);
        let lower = mean * (1.0 - self.threshold);

        let reports = group
            .iter()
            .filter_map(|p| {
                if p.speed > upper || p.speed < lower {
                    Some(report(p, mean, OutlierReason::RelativeDeviation))
                } else if self.absolute_limits
                    && (p.speed > SPEED_UPPER_LIMIT || p.speed < SPEED_LOWER_LIMIT)
                {
                    Some(report(p, 0.0, OutlierReason::AbsoluteLimit))
                } else {
                    None
                }
            })
            .collect();
        Some(reports)
    }
}

fn report(p: &ParticipantSpeedRecord, average_speed: f64, reason: OutlierReason) -> OutlierReport {
    OutlierReport {
        race_id: p.race_id,
        participant_id: p.participant_id,
        average_speed,
        speed: p.speed,
        reason,
    }
}

/// Outliers of a single group; empty when the group's race is excluded.
pub fn detect_group_outliers(
    group: &[ParticipantSpeedRecord],
    config: &OutlierConfig,
) -> Vec<OutlierReport> {
    OutlierDetector::new(config)
        .scan_group(group)
        .unwrap_or_default()
}

/// Messages from batch workers to the collector.
#[derive(Debug)]
enum ScanEvent {
    Report(OutlierReport),
    GroupScanned,
    GroupSkipped,
}

/// Scan every group, one worker task per batch of `config.batch_size` groups.
///
/// Report order across batches is unspecified; within a group reports follow
/// participant order. A panicking worker is propagated to the caller.
pub async fn scan_outliers(
    groups: Vec<Vec<ParticipantSpeedRecord>>,
    config: OutlierConfig,
) -> AnalyticsResult<OutlierScan> {
    let batch_size = if config.batch_size == 0 {
        warn!("outlier batch size 0 requested, scanning one group per worker");
        1
    } else {
        config.batch_size
    };
    let groups = Arc::new(groups);
    let detector = Arc::new(OutlierDetector::new(&config));

    let (tx, mut rx) = mpsc::unbounded_channel::<ScanEvent>();
    let collector = tokio::spawn(async move {
        let mut scan = OutlierScan::default();
        let mut seen = HashSet::new();
        while let Some(event) = rx.recv().await {
            match event {
                ScanEvent::Report(report) => {
                    debug!("found outlier: {:?}", report);
                    if seen.insert(report.race_id) {
                        scan.races.push(report.race_id);
                    }
                    scan.reports.push(report);
                }
                ScanEvent::GroupScanned => scan.groups_scanned += 1,
                ScanEvent::GroupSkipped => scan.groups_skipped += 1,
            }
        }
        scan
    });

    let mut workers = JoinSet::new();
    for start in (0..groups.len()).step_by(batch_size) {
        let end = (start + batch_size).min(groups.len());
        let groups = Arc::clone(&groups);
        let detector = Arc::clone(&detector);
        let tx = tx.clone();
        workers.spawn(async move {
            for group in &groups[start..end] {
                let events = match detector.scan_group(group) {
                    Some(reports) => {
                        let mut events: Vec<ScanEvent> =
                            reports.into_iter().map(ScanEvent::Report).collect();
                        events.push(ScanEvent::GroupScanned);
                        events
                    }
                    None => vec![ScanEvent::GroupSkipped],
                };
                for event in events {
                    if tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });
    }
    // The channel closes once every worker has dropped its sender.
    drop(tx);

    let batches = workers.len();
    while let Some(joined) = workers.join_next().await {
        joined.map_err(task_failure)?;
    }

    let scan = collector.await.map_err(task_failure)?;
    info!(
        "found {} outliers in {} races ({} groups in {} batches, {} skipped)",
        scan.reports.len(),
        scan.races.len(),
        scan.groups_scanned + scan.groups_skipped,
        batches,
        scan.groups_skipped
    );
    Ok(scan)
}

fn task_failure(err: JoinError) -> AnalyticsError {
    match err.try_into_panic() {
        Ok(payload) => std::panic::resume_unwind(payload),
        Err(err) => AnalyticsError::Internal(format!("outlier task failed: {}", err)),
    }
}

/// Fetch every speed-tagged participant, group them and scan the groups.
///
/// A store failure aborts before any group is scanned.
pub async fn scan_repository<R: SpeedRepository + ?Sized>(
    repo: &R,
    config: OutlierConfig,
) -> AnalyticsResult<OutlierScan> {
    let mut records = repo.fetch_all_speed_tagged_participants().await?;
    records.sort_by(|a, b| {
        (a.race_id, &a.gender, &a.category).cmp(&(b.race_id, &b.gender, &b.category))
    });
    let groups = group_participants(records);
    info!("grouped participants into {} groups", groups.len());
    scan_outliers(groups, config).await
}

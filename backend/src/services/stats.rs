use crate::api::{DistributionStats, YearDistribution, YearSummary};

/// Count, mean, median, population standard deviation, min, max and sum.
pub fn compute_stats(values: &[f64]) -> DistributionStats {
    if values.is_empty() {
        return DistributionStats::default();
    }

    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mean = sum / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = if count % 2 == 0 {
        (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
    } else {
        sorted[count / 2]
    };

    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    DistributionStats {
        count,
        mean,
        median,
        std_dev: variance.sqrt(),
        min: sorted[0],
        max: sorted[count - 1],
        sum,
    }
}

/// One summary per year of `distribution`, ascending.
pub fn summarize_distribution(distribution: &YearDistribution) -> Vec<YearSummary> {
    distribution
        .speeds
        .iter()
        .map(|(year, speeds)| YearSummary {
            year: *year,
            stats: compute_stats(speeds),
        })
        .collect()
}

//! Two-sigma trim of speed distributions.

/// Inclusive `[mean - 2σ, mean + 2σ]` window of a population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimBounds {
    pub lower: f64,
    pub upper: f64,
}

impl TrimBounds {
    /// Bounds over `values` using the population standard deviation.
    ///
    /// `None` for fewer than two values, where σ is undefined.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        let spread = 2.0 * variance.sqrt();
        Some(Self {
            lower: mean - spread,
            upper: mean + spread,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Keep the values inside the bounds, preserving order.
    pub fn retain(&self, values: &[f64]) -> Vec<f64> {
        values.iter().copied().filter(|v| self.contains(*v)).collect()
    }
}

/// Drop values further than two population standard deviations from the mean.
///
/// Fewer than two values are returned unchanged.
pub fn trim(values: &[f64]) -> Vec<f64> {
    match TrimBounds::from_values(values) {
        Some(bounds) => bounds.retain(values),
        None => values.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_removes_extreme_value() {
        let values = vec![10.0, 10.0, 10.0, 10.0, 10.0, 1000.0];
        assert_eq!(trim(&values), vec![10.0; 5]);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        // mean 208, σ 396: the outlier sits exactly on the upper bound
        let values = vec![10.0, 10.0, 10.0, 10.0, 1000.0];
        let bounds = TrimBounds::from_values(&values).unwrap();
        assert_eq!(bounds.upper, 1000.0);
        assert_eq!(bounds.lower, -584.0);
        assert_eq!(trim(&values), values);
    }

    #[test]
    fn test_small_inputs_unchanged() {
        assert!(trim(&[]).is_empty());
        assert_eq!(trim(&[5.0]), vec![5.0]);
        assert!(TrimBounds::from_values(&[5.0]).is_none());
        // zero spread keeps every value
        assert_eq!(trim(&[5.0, 5.0]), vec![5.0, 5.0]);
    }

    #[test]
    fn test_trim_preserves_order() {
        let values = vec![15.2, 14.8, 2.0, 15.0, 15.1, 14.9, 15.3, 14.7];
        let trimmed = trim(&values);
        assert_eq!(trimmed, vec![15.2, 14.8, 15.0, 15.1, 14.9, 15.3, 14.7]);
    }
}

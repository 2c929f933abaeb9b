//! Service layer of the speed analytics engine.
//!
//! The services sit between the records store and the caller: they compose
//! filter criteria into selection rules, aggregate and trim the speeds the
//! store returns, and run the concurrent outlier scan.

pub mod error;
pub mod normalize;
pub mod outliers;
pub mod predicate;
pub mod speeds;
pub mod stats;

pub use error::{AnalyticsError, AnalyticsResult};
pub use normalize::{trim, TrimBounds};
pub use outliers::{
    detect_group_outliers, group_participants, scan_outliers, scan_repository, OutlierConfig,
    OutlierDetector,
};
pub use predicate::{build, Condition, DayPolicy, PredicateBuilder, SelectionRule};
pub use speeds::{
    nth_order_statistic, nth_speeds_by, nth_speeds_by_years, yearly_distribution,
    yearly_speeds_by, AnalyticsSettings,
};
pub use stats::{compute_stats, summarize_distribution};

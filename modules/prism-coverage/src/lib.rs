pub mod error;
pub mod metrics;
pub mod tracker;

pub use error::{CoverageError, Result};
pub use metrics::{blindspot_for_missing, coverage_for_members, missing_buckets};
pub use tracker::{CoverageStats, CoverageTracker, BLINDSPOT_WINDOW_DAYS};

//! Structured reports returned by session operations, for logging and for
//! the JSON output of the command-line tool.
pub mod timing;

pub use timing::{StageTiming, TimingBreakdown};

use crate::classify::ClassifyStats;
use serde::Serialize;

/// Outcome of a full read (preprocess + classify).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReport {
    pub columns: usize,
    pub rows: usize,
    pub radius: u32,
    pub bit_thresh_div: u32,
    pub stats: ClassifyStats,
    pub timing: TimingBreakdown,
}

impl ReadReport {
    pub fn zeros(&self) -> usize {
        self.stats.intersections - self.stats.ones
    }
}

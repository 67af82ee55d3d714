use crate::geometry::Vec3;
use crate::sensor::NO_HIT_SENTINEL;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::PathBuf;
use std::str::FromStr;

/// One row of the raw record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since trial start.
    pub elapsed: f64,
    pub position: Vec3,
    /// Forward hit distance, `None` when nothing was in range.
    pub distance: Option<f32>,
}

impl Sample {
    pub fn distance_or_sentinel(&self) -> f32 {
        self.distance.unwrap_or(NO_HIT_SENTINEL)
    }
}

/// Why a trial stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The tracked entity entered the goal region.
    ReachedEnd,
    ExternalStop,
    /// A surrounding harness ran out of wall-clock budget.
    TimeLimit,
    Other(String),
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndReason::ReachedEnd => f.write_str("ReachedEnd"),
            EndReason::ExternalStop => f.write_str("ExternalStop"),
            EndReason::TimeLimit => f.write_str("TimeLimit"),
            EndReason::Other(reason) => f.write_str(reason),
        }
    }
}

impl FromStr for EndReason {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ReachedEnd" => EndReason::ReachedEnd,
            "ExternalStop" => EndReason::ExternalStop,
            "TimeLimit" => EndReason::TimeLimit,
            other => EndReason::Other(other.to_string()),
        })
    }
}

/// Recorded once per trial, when it stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialSummary {
    pub participant: String,
    pub condition: String,
    pub trial: u32,
    /// Seconds between start and the last observed tick.
    pub duration: f64,
    pub min_distance: Option<f32>,
    pub end_reason: EndReason,
    pub raw_path: PathBuf,
    pub sample_count: usize,
}

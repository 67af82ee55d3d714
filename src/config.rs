use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tofex_core::Vec3;
use tofex_experiment::{TrialConfig, DEFAULT_CHANGE_THRESHOLD};
use tofex_sim::{CorridorConfig, NavigatorConfig, Steering, ToFArrayConfig};

/// Everything one headless run needs, as read from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentFile {
    pub trial: TrialConfig,
    pub run: RunConfig,
    pub corridor: CorridorConfig,
    pub navigator: NavigatorConfig,
    pub tof: ToFArrayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Nominal frames per second of the simulated engine loop.
    pub fps: f64,
    /// Each frame lasts `1/fps * (1 ± frame_jitter)`.
    pub frame_jitter: f64,
    /// Simulated seconds before the trial is stopped with `TimeLimit`.
    pub time_limit: f64,
    pub steering: Steering,
    /// Agent speed, metres per second.
    pub speed: f32,
    pub start: Vec3,
    /// Also write the change-driven ToF event log.
    pub events: bool,
    /// Smallest distance change, in metres, that gets a new event row.
    pub event_threshold: f32,
    /// Pace frames against the wall clock.
    pub realtime: bool,
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fps: 60.0,
            frame_jitter: 0.0,
            time_limit: 60.0,
            steering: Steering::Straight,
            speed: 1.5,
            start: Vec3::new(1.0, 0.0, 3.0),
            events: false,
            event_threshold: DEFAULT_CHANGE_THRESHOLD,
            realtime: false,
            seed: 0,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            bail!("run.fps must be a finite rate > 0, got {}", self.fps);
        }
        if !(0.0..1.0).contains(&self.frame_jitter) {
            bail!("run.frame_jitter must be in [0, 1), got {}", self.frame_jitter);
        }
        if !(self.time_limit.is_finite() && self.time_limit > 0.0) {
            bail!("run.time_limit must be > 0 seconds, got {}", self.time_limit);
        }
        if !(self.event_threshold.is_finite() && self.event_threshold >= 0.0) {
            bail!("run.event_threshold must be >= 0, got {}", self.event_threshold);
        }
        if !self.start.is_finite() {
            bail!("run.start must be finite");
        }
        Ok(())
    }
}

impl ExperimentFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        self.trial.validate()?;
        self.run.validate()
    }
}

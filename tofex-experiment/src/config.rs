use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrialError};

/// When buffered raw rows reach the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FlushPolicy {
    /// Keep every row in memory and write the raw record once, at finalize.
    OnFinalize,
    /// Append to the raw record whenever `every_rows` rows are pending.
    Periodic { every_rows: usize },
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy::OnFinalize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialConfig {
    pub participant_id: String,
    pub condition: String,
    pub trial: u32,
    pub sample_hz: f64,
    /// Metres. Hits at or beyond this range count as no hit.
    pub max_sensor_range: f32,
    pub output_directory: PathBuf,
    pub file_prefix: String,
    pub flush: FlushPolicy,
    /// Scene name of the tracked entity when no handle is bound explicitly.
    pub agent_name: String,
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            participant_id: "P001".to_string(),
            condition: "C1".to_string(),
            trial: 1,
            sample_hz: 20.0,
            max_sensor_range: 50.0,
            output_directory: PathBuf::from("."),
            file_prefix: "raydata".to_string(),
            flush: FlushPolicy::OnFinalize,
            agent_name: "agent".to_string(),
        }
    }
}

impl TrialConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| TrialError::io(path, e))?;
        let config = Self::from_json_str(&text).map_err(|source| TrialError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Seconds between scheduled samples.
    pub fn sample_period(&self) -> f64 {
        1.0 / self.sample_hz
    }

    pub fn validate(&self) -> Result<()> {
        if self.participant_id.trim().is_empty() {
            return Err(TrialError::invalid("participant_id", "must not be empty"));
        }
        if self.condition.trim().is_empty() {
            return Err(TrialError::invalid("condition", "must not be empty"));
        }
        if !(self.sample_hz.is_finite() && self.sample_hz > 0.0) {
            return Err(TrialError::invalid(
                "sample_hz",
                format!("must be a finite rate > 0, got {}", self.sample_hz),
            ));
        }
        if !(self.max_sensor_range.is_finite() && self.max_sensor_range > 0.0) {
            return Err(TrialError::invalid(
                "max_sensor_range",
                format!("must be a finite range > 0, got {}", self.max_sensor_range),
            ));
        }
        if self.file_prefix.is_empty() {
            return Err(TrialError::invalid("file_prefix", "must not be empty"));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(TrialError::invalid(
                "file_prefix",
                "must not contain path separators",
            ));
        }
        if let FlushPolicy::Periodic { every_rows: 0 } = self.flush {
            return Err(TrialError::invalid("flush.every_rows", "must be > 0"));
        }
        Ok(())
    }
}

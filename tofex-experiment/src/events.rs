//! Change-driven time-of-flight event log.
//!
//! Unlike the fixed-rate raw record, this log only gets a row when the measured
//! distance moves by more than a threshold, and every row carries wall-clock
//! and simulation timestamps plus trial metadata.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tofex_core::{Hit, Pose, RayCaster, Vec3};
use tracing::info;

use crate::config::TrialConfig;
use crate::error::{Result, TrialError};
use crate::record::{escape_field, file_component};

pub const EVENT_HEADER: &str = "unixTime,unityTime,participant,condition,trial,event,rayDistance,hitX,hitY,hitZ,agentX,agentY,agentZ";

/// Event name written for forward sensor readings.
pub const TOF_EVENT: &str = "tof";

/// Default minimum change, in metres, before a new reading is logged.
pub const DEFAULT_CHANGE_THRESHOLD: f32 = 0.02;

/// Passes a value only when it differs enough from the last one passed.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    threshold: f32,
    last: Option<f32>,
}

impl ChangeFilter {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last: None,
        }
    }

    pub fn accept(&mut self, value: f32) -> bool {
        let changed = match self.last {
            None => true,
            Some(last) => (value - last).abs() > self.threshold,
        };
        if changed {
            self.last = Some(value);
        }
        changed
    }
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CHANGE_THRESHOLD)
    }
}

/// A single sensor reading. Misses read as the full range, with the hit point
/// at the end of the ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToFReading {
    pub distance: f32,
    pub point: Vec3,
    pub agent: Vec3,
}

impl ToFReading {
    pub fn from_cast(pose: &Pose, hit: Option<Hit>, max_range: f32) -> Self {
        let hit = hit
            .filter(|h| h.within(max_range))
            .unwrap_or_else(|| Hit::along(pose.position, pose.forward, max_range));
        Self {
            distance: hit.distance,
            point: hit.point,
            agent: pose.position,
        }
    }
}

/// Buffered CSV writer for sensor events. Buffered rows are flushed on
/// [`EventLog::finish`] or when the log is dropped.
pub struct EventLog {
    path: PathBuf,
    out: BufWriter<File>,
    participant: String,
    condition: String,
    trial: u32,
}

impl EventLog {
    /// `<dir>/<prefix>_<participant>_<stamp>.csv`, with path separators in
    /// the name parts replaced like the trial records.
    pub fn path_for(config: &TrialConfig, stamp: &str) -> PathBuf {
        config.output_directory.join(format!(
            "{}_{}_{}.csv",
            file_component(&config.file_prefix),
            file_component(&config.participant_id),
            file_component(stamp),
        ))
    }

    pub fn create(config: &TrialConfig, stamp: &str) -> Result<Self> {
        let dir = &config.output_directory;
        std::fs::create_dir_all(dir).map_err(|e| TrialError::io(dir, e))?;
        let path = Self::path_for(config, stamp);
        let file = File::create(&path).map_err(|e| TrialError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{EVENT_HEADER}").map_err(|e| TrialError::io(&path, e))?;
        info!("event log -> {}", path.display());
        Ok(Self {
            path,
            out,
            participant: config.participant_id.clone(),
            condition: config.condition.clone(),
            trial: config.trial,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&mut self, event: &str, sim_time: f64, reading: &ToFReading) -> Result<()> {
        let unix_ms = chrono::Utc::now().timestamp_millis();
        self.log_at(unix_ms, event, sim_time, reading)
    }

    pub fn log_at(
        &mut self,
        unix_ms: i64,
        event: &str,
        sim_time: f64,
        reading: &ToFReading,
    ) -> Result<()> {
        let (p, a) = (reading.point, reading.agent);
        writeln!(
            self.out,
            "{unix_ms},{sim_time:.4},{},{},{},{},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4},{:.4}",
            escape_field(&self.participant),
            escape_field(&self.condition),
            self.trial,
            escape_field(event),
            reading.distance,
            p.x,
            p.y,
            p.z,
            a.x,
            a.y,
            a.z,
        )
        .map_err(|e| TrialError::io(&self.path, e))
    }

    pub fn finish(mut self) -> Result<PathBuf> {
        self.out
            .flush()
            .map_err(|e| TrialError::io(&self.path, e))?;
        Ok(self.path)
    }
}

/// Casts a forward ray each call and logs the reading when it changed.
pub struct ToFEventLogger {
    filter: ChangeFilter,
    log: EventLog,
    max_range: f32,
}

impl ToFEventLogger {
    pub fn new(log: EventLog, max_range: f32) -> Self {
        Self {
            filter: ChangeFilter::default(),
            log,
            max_range,
        }
    }

    pub fn with_filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Returns whether a row was written.
    pub fn observe<R: RayCaster + ?Sized>(
        &mut self,
        now: f64,
        pose: &Pose,
        caster: &R,
    ) -> Result<bool> {
        let hit = caster.cast(pose.position, pose.forward, self.max_range);
        let reading = ToFReading::from_cast(pose, hit, self.max_range);
        if !self.filter.accept(reading.distance) {
            return Ok(false);
        }
        self.log.log(TOF_EVENT, now, &reading)?;
        Ok(true)
    }

    pub fn finish(self) -> Result<PathBuf> {
        self.log.finish()
    }
}

//! Raw and summary CSV records.

use std::borrow::Cow;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tofex_core::{Sample, TrialSummary};

use crate::config::TrialConfig;
use crate::error::{Result, TrialError};

pub const RAW_HEADER: &str = "time_s,agent_x,agent_y,agent_z,forward_hit_m";
pub const SUMMARY_HEADER: &str =
    "participant,condition,trial,duration_s,min_forward_hit_m,end_reason,raw_path";

/// Sortable local date-time used in output file names.
pub fn stamp_now() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Output locations of one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialPaths {
    pub base_name: String,
    pub raw: PathBuf,
    pub summary: PathBuf,
}

impl TrialPaths {
    pub fn new(
        dir: &Path,
        prefix: &str,
        participant: &str,
        condition: &str,
        trial: u32,
        stamp: &str,
    ) -> Self {
        let base_name = format!(
            "{}_{}_{}_T{}_{}",
            file_component(prefix),
            file_component(participant),
            file_component(condition),
            trial,
            file_component(stamp),
        );
        Self {
            raw: dir.join(format!("{base_name}_raw.csv")),
            summary: dir.join(format!("{base_name}_summary.csv")),
            base_name,
        }
    }

    pub fn for_config(config: &TrialConfig, stamp: &str) -> Self {
        Self::new(
            &config.output_directory,
            &config.file_prefix,
            &config.participant_id,
            &config.condition,
            config.trial,
            stamp,
        )
    }
}

pub(crate) fn file_component(s: &str) -> Cow<'_, str> {
    if s.contains(['/', '\\']) {
        Cow::Owned(s.replace(['/', '\\'], "_"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Quotes a text field when it would break the row (RFC 4180).
pub fn escape_field(s: &str) -> Cow<'_, str> {
    if s.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", s.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(s)
    }
}

pub fn format_sample(sample: &Sample) -> String {
    let p = sample.position;
    format!(
        "{:.3},{:.4},{:.4},{:.4},{:.4}",
        sample.elapsed,
        p.x,
        p.y,
        p.z,
        sample.distance_or_sentinel()
    )
}

pub fn format_summary_row(summary: &TrialSummary) -> String {
    let min = match summary.min_distance {
        Some(d) => format!("{d:.4}"),
        None => "-1".to_string(),
    };
    let raw_path = summary.raw_path.display().to_string();
    format!(
        "{},{},{},{:.3},{},{},{}",
        escape_field(&summary.participant),
        escape_field(&summary.condition),
        summary.trial,
        summary.duration,
        min,
        escape_field(&summary.end_reason.to_string()),
        escape_field(&raw_path),
    )
}

fn write_rows<'a>(
    out: &mut impl Write,
    header: Option<&str>,
    rows: impl IntoIterator<Item = &'a Sample>,
) -> std::io::Result<()> {
    if let Some(header) = header {
        writeln!(out, "{header}")?;
    }
    for sample in rows {
        writeln!(out, "{}", format_sample(sample))?;
    }
    out.flush()
}

/// Writes the full raw record, replacing any existing file.
pub fn write_raw(path: &Path, samples: &[Sample]) -> Result<()> {
    let file = File::create(path).map_err(|e| TrialError::io(path, e))?;
    write_rows(&mut BufWriter::new(file), Some(RAW_HEADER), samples)
        .map_err(|e| TrialError::io(path, e))
}

/// Creates the raw record with only its header, ready for appends.
pub fn create_raw(path: &Path) -> Result<()> {
    write_raw(path, &[])
}

pub fn append_raw(path: &Path, samples: &[Sample]) -> Result<()> {
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| TrialError::io(path, e))?;
    write_rows(&mut BufWriter::new(file), None, samples).map_err(|e| TrialError::io(path, e))
}

pub fn write_summary(path: &Path, summary: &TrialSummary) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{SUMMARY_HEADER}")?;
        writeln!(out, "{}", format_summary_row(summary))?;
        out.flush()
    };
    write().map_err(|e| TrialError::io(path, e))
}

//! Errors raised while configuring, running or persisting a trial.

use std::path::PathBuf;
use thiserror::Error;

use tofex_core::TrialPhase;

#[derive(Debug, Error)]
pub enum TrialError {
    /// A configuration value is out of its accepted range.
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// The configuration file could not be parsed.
    #[error("cannot parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The tracked entity could not be resolved at start.
    #[error("tracked entity not found ({0})")]
    MissingEntity(String),

    #[error("cannot {action} a trial that is {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: TrialPhase,
    },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TrialError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration problems surface before a trial runs.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::ConfigParse { .. } | Self::MissingEntity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TrialError>;

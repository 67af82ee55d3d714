pub mod config;
pub mod error;
pub mod events;
pub mod record;
pub mod recorder;
pub mod schedule;
pub mod trial;

pub use config::{FlushPolicy, TrialConfig};
pub use error::{Result, TrialError};
pub use events::{
    ChangeFilter, DEFAULT_CHANGE_THRESHOLD, EventLog, ToFEventLogger, ToFReading,
};
pub use record::{TrialPaths, stamp_now};
pub use recorder::{TickOutcome, TrialEvent, TrialRecorder};
pub use schedule::SampleSchedule;
pub use trial::TrialRun;

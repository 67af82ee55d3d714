use tofex_core::{EntityId, Sample};

use crate::record::TrialPaths;
use crate::schedule::SampleSchedule;

/// Mutable state of a trial between start and finalize.
#[derive(Debug, Clone)]
pub struct TrialRun {
    pub entity: EntityId,
    pub paths: TrialPaths,
    pub start_time: f64,
    /// Latest tick time seen; never moves backwards.
    pub last_tick: Option<f64>,
    pub schedule: SampleSchedule,
    pub samples: Vec<Sample>,
    /// Rows already appended to the raw file.
    pub flushed: usize,
    pub min_distance: Option<f32>,
}

impl TrialRun {
    pub fn new(entity: EntityId, paths: TrialPaths, start_time: f64, hz: f64) -> Self {
        Self {
            entity,
            paths,
            start_time,
            last_tick: None,
            schedule: SampleSchedule::new(start_time, hz),
            samples: Vec::new(),
            flushed: 0,
            min_distance: None,
        }
    }

    /// Records the tick time, clamping clocks that step backwards.
    pub fn observe(&mut self, now: f64) -> f64 {
        let t = match self.last_tick {
            Some(last) if now < last => last,
            _ => now.max(self.start_time),
        };
        self.last_tick = Some(t);
        t
    }

    pub fn push(&mut self, sample: Sample) {
        if let Some(d) = sample.distance {
            self.min_distance = Some(match self.min_distance {
                Some(min) => min.min(d),
                None => d,
            });
        }
        self.samples.push(sample);
    }

    pub fn pending(&self) -> &[Sample] {
        &self.samples[self.flushed..]
    }

    pub fn duration(&self) -> f64 {
        self.last_tick.map_or(0.0, |t| t - self.start_time)
    }
}

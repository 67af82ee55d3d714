use tofex_core::{
    EndReason, EntityBinding, EntityId, EntityLookup, Sample, Scene, TrialPhase, TrialSummary,
};
use tofex_timing::Clock;
use tracing::{debug, error, info, warn};

use crate::config::{FlushPolicy, TrialConfig};
use crate::error::{Result, TrialError};
use crate::record::{self, TrialPaths};
use crate::trial::TrialRun;

/// Notifications from the host that can end a trial.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialEvent {
    /// An entity entered the goal region.
    TriggerEnter(EntityId),
    Stop(EndReason),
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The trial has not started.
    Idle,
    /// Running, but no sample is due yet.
    Waiting,
    /// A sample was due but the tracked entity had no pose.
    Skipped,
    Sampled(Sample),
    Stopped,
}

/// Samples the tracked entity at a fixed rate and writes the trial records.
///
/// Driven by the host frame loop: call [`TrialRecorder::start`] once, then
/// [`TrialRecorder::tick`] every frame until [`TrialRecorder::finalize`] or a
/// goal trigger stops the trial. Finalize is idempotent.
pub struct TrialRecorder<C: Clock> {
    config: TrialConfig,
    clock: C,
    binding: EntityBinding,
    phase: TrialPhase,
    run: Option<TrialRun>,
    summary: Option<TrialSummary>,
}

impl<C: Clock> TrialRecorder<C> {
    pub fn new(config: TrialConfig, clock: C, binding: EntityBinding) -> Result<Self> {
        config.validate().inspect_err(|e| error!("invalid trial config: {e}"))?;
        Ok(Self {
            config,
            clock,
            binding,
            phase: TrialPhase::Idle,
            run: None,
            summary: None,
        })
    }

    /// Tracks the entity named by `config.agent_name`.
    pub fn tracking_agent(config: TrialConfig, clock: C) -> Result<Self> {
        let binding = EntityBinding::Named(config.agent_name.clone());
        Self::new(config, clock, binding)
    }

    /// Idle -> Running. Resolves the tracked entity and prepares the output
    /// directory; on failure the trial stays idle.
    pub fn start<L: EntityLookup + ?Sized>(&mut self, scene: &L, stamp: &str) -> Result<&TrialPaths> {
        if !self.phase.is_idle() {
            return Err(TrialError::InvalidTransition {
                action: "start",
                phase: self.phase,
            });
        }

        let Some(entity) = self.binding.resolve(scene) else {
            error!(binding = %self.binding, "tracked entity not found, trial will not run");
            return Err(TrialError::MissingEntity(self.binding.to_string()));
        };

        let dir = &self.config.output_directory;
        std::fs::create_dir_all(dir).map_err(|e| {
            error!(dir = %dir.display(), "cannot create output directory: {e}");
            TrialError::io(dir, e)
        })?;

        let paths = TrialPaths::for_config(&self.config, stamp);
        if let FlushPolicy::Periodic { .. } = self.config.flush {
            record::create_raw(&paths.raw)?;
        }

        let start = self.clock.now();
        info!("raw -> {}", paths.raw.display());
        info!("summary -> {}", paths.summary.display());
        info!(
            participant = %self.config.participant_id,
            condition = %self.config.condition,
            trial = self.config.trial,
            hz = self.config.sample_hz,
            %entity,
            "trial started at {start:.3}s"
        );

        self.phase = TrialPhase::Running;
        let run = self
            .run
            .insert(TrialRun::new(entity, paths, start, self.config.sample_hz));
        Ok(&run.paths)
    }

    pub fn tick<S: Scene + ?Sized>(&mut self, scene: &S) -> Result<TickOutcome> {
        let now = self.clock.now();
        self.tick_at(now, scene)
    }

    /// One frame at time `now`: takes at most one sample if one is due.
    pub fn tick_at<S: Scene + ?Sized>(&mut self, now: f64, scene: &S) -> Result<TickOutcome> {
        match self.phase {
            TrialPhase::Idle => return Ok(TickOutcome::Idle),
            TrialPhase::Stopped => return Ok(TickOutcome::Stopped),
            TrialPhase::Running => {}
        }
        let Some(run) = self.run.as_mut() else {
            return Ok(TickOutcome::Idle);
        };

        let t = run.observe(now);
        if !run.schedule.is_due(t) {
            return Ok(TickOutcome::Waiting);
        }
        let Some(pose) = scene.pose(run.entity) else {
            warn!(entity = %run.entity, t, "tracked entity has no pose, skipping sample");
            return Ok(TickOutcome::Skipped);
        };
        let lag = run.schedule.lag(t);
        if lag > 0 {
            debug!(lag, "sampling behind schedule");
        }
        run.schedule.poll(t);

        let range = self.config.max_sensor_range;
        let distance = scene
            .cast(pose.position, pose.forward, range)
            .filter(|hit| hit.within(range))
            .map(|hit| hit.distance);
        let sample = Sample {
            elapsed: t - run.start_time,
            position: pose.position,
            distance,
        };
        run.push(sample);
        debug!(t = sample.elapsed, ?distance, "sample");

        if let FlushPolicy::Periodic { every_rows } = self.config.flush {
            if run.pending().len() >= every_rows {
                if let Err(e) = flush_pending(run) {
                    error!("raw record write failed, aborting trial: {e}");
                    self.phase = TrialPhase::Stopped;
                    return Err(e);
                }
            }
        }

        Ok(TickOutcome::Sampled(sample))
    }

    /// Ends the trial when the tracked entity enters the goal region.
    pub fn on_trigger_enter(&mut self, entity: EntityId) -> Result<Option<TrialSummary>> {
        match &self.run {
            Some(run) if self.phase.is_running() && run.entity == entity => {
                self.finalize(EndReason::ReachedEnd)
            }
            _ => Ok(None),
        }
    }

    pub fn handle_event(&mut self, event: TrialEvent) -> Result<Option<TrialSummary>> {
        match event {
            TrialEvent::TriggerEnter(entity) => self.on_trigger_enter(entity),
            TrialEvent::Stop(reason) => self.finalize(reason),
        }
    }

    /// Running -> Stopped, writing the raw and summary records. Only the first
    /// call has any effect; later calls return `Ok(None)`.
    pub fn finalize(&mut self, reason: EndReason) -> Result<Option<TrialSummary>> {
        if !self.phase.is_running() {
            debug!(phase = %self.phase, %reason, "finalize ignored");
            return Ok(None);
        }
        self.phase = TrialPhase::Stopped;
        let Some(run) = self.run.as_mut() else {
            return Ok(None);
        };
        run.observe(self.clock.now());

        let raw = match self.config.flush {
            FlushPolicy::OnFinalize => record::write_raw(&run.paths.raw, &run.samples),
            FlushPolicy::Periodic { .. } => record::append_raw(&run.paths.raw, run.pending()),
        };
        if let Err(e) = raw {
            error!("raw record write failed, no summary written: {e}");
            return Err(e);
        }
        run.flushed = run.samples.len();

        let summary = TrialSummary {
            participant: self.config.participant_id.clone(),
            condition: self.config.condition.clone(),
            trial: self.config.trial,
            duration: run.duration(),
            min_distance: run.min_distance,
            end_reason: reason,
            raw_path: run.paths.raw.clone(),
            sample_count: run.samples.len(),
        };
        record::write_summary(&run.paths.summary, &summary)
            .inspect_err(|e| error!("summary write failed: {e}"))?;

        let min = summary
            .min_distance
            .map_or_else(|| "-1".to_string(), |d| format!("{d:.4}"));
        info!(
            "done. duration={:.2}s minHit={} reason={} samples={}",
            summary.duration, min, summary.end_reason, summary.sample_count
        );
        info!("wrote raw: {}", run.paths.raw.display());
        info!("wrote summary: {}", run.paths.summary.display());

        self.summary = Some(summary.clone());
        Ok(Some(summary))
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.run.as_ref().map(|run| run.entity)
    }

    pub fn paths(&self) -> Option<&TrialPaths> {
        self.run.as_ref().map(|run| &run.paths)
    }

    pub fn samples(&self) -> &[Sample] {
        self.run.as_ref().map_or(&[], |run| run.samples.as_slice())
    }

    /// Smallest hit distance so far; `None` when nothing was ever hit.
    pub fn min_distance(&self) -> Option<f32> {
        self.run.as_ref().and_then(|run| run.min_distance)
    }

    /// Set once the trial has been finalized successfully.
    pub fn summary(&self) -> Option<&TrialSummary> {
        self.summary.as_ref()
    }
}

fn flush_pending(run: &mut TrialRun) -> Result<()> {
    record::append_raw(&run.paths.raw, run.pending())?;
    run.flushed = run.samples.len();
    debug!(rows = run.flushed, "raw rows flushed");
    Ok(())
}

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tofex_core::{EndReason, EntityId, Pose, PoseSource, TrialSummary};
use tofex_experiment::{stamp_now, ChangeFilter, EventLog, ToFEventLogger, TrialRecorder};
use tofex_sim::{Corridor, Driver, Mover};
use tofex_timing::{Clock, FrameTimer, ManualClock};
use tracing::{debug, info};

use crate::config::ExperimentFile;

/// Headless host loop: plays the engine's role for one trial.
pub struct App {
    config: ExperimentFile,
    clock: ManualClock,
    corridor: Corridor,
    agent: EntityId,
    driver: Driver<StdRng>,
    recorder: TrialRecorder<ManualClock>,
    events: Option<ToFEventLogger>,
    frame_rng: StdRng,
    frames: FrameTimer,
    stamp: String,
}

impl App {
    pub fn new(config: ExperimentFile) -> Result<Self> {
        Self::with_stamp(config, stamp_now())
    }

    pub fn with_stamp(config: ExperimentFile, stamp: String) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let clock = ManualClock::new(0.0);
        let mut corridor = Corridor::new(config.corridor.clone());
        let agent = corridor.spawn(
            config.trial.agent_name.clone(),
            Pose::from_yaw(config.run.start, 0.0),
        );
        let driver = Driver::new(
            Mover::new(config.run.speed),
            config.run.steering,
            config.navigator.clone(),
            config.tof.clone(),
            StdRng::seed_from_u64(config.run.seed),
        );
        let recorder = TrialRecorder::tracking_agent(config.trial.clone(), clock.clone())?;

        Ok(Self {
            frame_rng: StdRng::seed_from_u64(config.run.seed.wrapping_add(1)),
            config,
            clock,
            corridor,
            agent,
            driver,
            recorder,
            events: None,
            frames: FrameTimer::new(),
            stamp,
        })
    }

    pub fn run(mut self) -> Result<TrialSummary> {
        self.recorder
            .start(&self.corridor, &self.stamp)
            .context("trial did not start")?;
        if self.config.run.events {
            let log = EventLog::create(&self.config.trial, &self.stamp)?;
            let filter = ChangeFilter::new(self.config.run.event_threshold);
            self.events =
                Some(ToFEventLogger::new(log, self.config.tof.max_range).with_filter(filter));
        }
        info!(
            steering = ?self.driver.steering(),
            fps = self.config.run.fps,
            limit = self.config.run.time_limit,
            "running corridor trial"
        );

        self.frame(0.0)?;
        while self.recorder.is_running() {
            let started = Instant::now();
            let dt = self.next_frame_time();
            self.clock.advance(dt);
            let now = self.clock.now();
            self.driver.update(&mut self.corridor, self.agent, now, dt);
            self.frame(now)?;

            if self.recorder.is_running() && now >= self.config.run.time_limit {
                info!(now, "time limit reached");
                self.recorder.finalize(EndReason::TimeLimit)?;
            }

            if self.config.run.realtime {
                let budget = Duration::from_secs_f64(dt);
                self.frames.sleep(budget.saturating_sub(started.elapsed()));
                self.frames.record_frame(started.elapsed());
            }
        }

        if let Some(contacts) = self.corridor.collisions(self.agent).filter(|n| *n > 0) {
            info!(contacts, "agent touched obstacles");
        }
        if let Some(events) = self.events.take() {
            let path = events.finish()?;
            info!("wrote events: {}", path.display());
        }
        if self.config.run.realtime {
            let stats = self.frames.stats();
            info!(
                "frames: {:.3} ms avg, {:.1} Hz, jitter {:.3} ms",
                stats.average_frame_time_ns / 1_000_000.0,
                stats.effective_fps,
                stats.jitter_ns / 1_000_000.0,
            );
        }

        self.recorder
            .summary()
            .cloned()
            .context("trial stopped without a summary")
    }

    /// Sampling, event logging and goal triggers for the frame at `now`.
    fn frame(&mut self, now: f64) -> Result<()> {
        self.recorder.tick(&self.corridor)?;
        if let (Some(events), Some(pose)) = (self.events.as_mut(), self.corridor.pose(self.agent)) {
            events.observe(now, &pose, &self.corridor)?;
        }
        for entity in self.corridor.detect_triggers() {
            debug!(%entity, now, "trigger enter");
            self.recorder.on_trigger_enter(entity)?;
        }
        Ok(())
    }

    fn next_frame_time(&mut self) -> f64 {
        let base = 1.0 / self.config.run.fps;
        let jitter = self.config.run.frame_jitter;
        if jitter > 0.0 {
            base * (1.0 + jitter * self.frame_rng.random_range(-1.0..=1.0))
        } else {
            base
        }
    }
}

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::tof::ArrayReading;

/// Maps a distance to a vibration intensity in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HapticMap {
    /// Distances at or beyond this produce no vibration.
    pub safe_distance: f32,
}

impl HapticMap {
    pub fn intensity(&self, distance: f32) -> f32 {
        if distance < self.safe_distance && self.safe_distance > 0.0 {
            ((self.safe_distance - distance) / self.safe_distance).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for HapticMap {
    fn default() -> Self {
        Self { safe_distance: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Forward,
    Stop,
    TurnLeft,
    TurnRight,
    /// Nothing decided yet reached the end of the reaction delay.
    Wait,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    /// Seconds between a decision and its execution.
    pub reaction_delay: f64,
    /// Radians per second while turning.
    pub turn_rate: f32,
    /// Halt and turn on the spot when the front reading drops below this.
    pub stop_distance: f32,
    /// Side intensities below this are ignored.
    pub min_intensity: f32,
    /// Yaw of the way to the goal, radians from +X towards +Z.
    pub goal_heading: f32,
    /// Drift from `goal_heading` tolerated before turning back.
    pub heading_tolerance: f32,
    /// Fraction of walking speed kept while turning with a clear front.
    pub turn_walk_fraction: f32,
    pub haptic: HapticMap,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            reaction_delay: 0.2,
            turn_rate: 3.0,
            stop_distance: 0.6,
            min_intensity: 0.1,
            goal_heading: 0.0,
            heading_tolerance: 20f32.to_radians(),
            turn_walk_fraction: 0.8,
            haptic: HapticMap::default(),
        }
    }
}

/// Steers away from whichever side vibrates harder and back towards the goal
/// heading once clear, acting on decisions only after a fixed reaction delay.
///
/// A blocked front turns the agent on the spot towards the more open side;
/// it only stops outright when every ray is blocked.
#[derive(Debug, Clone)]
pub struct Navigator {
    config: NavigatorConfig,
    pending: VecDeque<(f64, Action)>,
    current: Action,
}

impl Navigator {
    pub fn new(config: NavigatorConfig) -> Self {
        Self {
            config,
            pending: VecDeque::new(),
            current: Action::Wait,
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// True when the front ray is closer than `stop_distance`.
    pub fn front_blocked(&self, reading: &ArrayReading) -> bool {
        reading.front < self.config.stop_distance
    }

    /// Decision for `reading` taken while facing `yaw`.
    pub fn decide(&self, reading: &ArrayReading, yaw: f32) -> Action {
        let stop = self.config.stop_distance;
        if self.front_blocked(reading) {
            return if reading.left < stop && reading.right < stop {
                Action::Stop
            } else if reading.left >= reading.right {
                Action::TurnLeft
            } else {
                Action::TurnRight
            };
        }

        let left = self.config.haptic.intensity(reading.left);
        let right = self.config.haptic.intensity(reading.right);
        let drift = wrap_angle(yaw - self.config.goal_heading);
        if left > right && left > self.config.min_intensity {
            Action::TurnRight
        } else if right > left && right > self.config.min_intensity {
            Action::TurnLeft
        } else if drift > self.config.heading_tolerance {
            Action::TurnRight
        } else if drift < -self.config.heading_tolerance {
            Action::TurnLeft
        } else {
            Action::Forward
        }
    }

    /// Queues the decision for `reading` and returns the action due at `now`.
    pub fn step(&mut self, now: f64, reading: &ArrayReading, yaw: f32) -> Action {
        let decision = self.decide(reading, yaw);
        self.pending.push_back((now, decision));
        while let Some(&(at, action)) = self.pending.front() {
            if at + self.config.reaction_delay > now + 1e-9 {
                break;
            }
            self.current = action;
            self.pending.pop_front();
        }
        self.current
    }
}

/// Maps an angle into `(-pi, pi]`.
fn wrap_angle(a: f32) -> f32 {
    a.sin().atan2(a.cos())
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(NavigatorConfig::default())
    }
}

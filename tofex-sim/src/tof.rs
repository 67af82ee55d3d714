use rand::Rng;
use serde::{Deserialize, Serialize};
use tofex_core::{Pose, RayCaster};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToFArrayConfig {
    /// Yaw of the side rays relative to the facing, radians.
    pub side_angle: f32,
    pub max_range: f32,
    /// Standard deviation of additive Gaussian noise, metres.
    pub noise_sigma: f32,
}

impl Default for ToFArrayConfig {
    fn default() -> Self {
        Self {
            side_angle: 30f32.to_radians(),
            max_range: 4.0,
            noise_sigma: 0.05,
        }
    }
}

/// Left, front and right distances. Misses read as the full range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayReading {
    pub left: f32,
    pub front: f32,
    pub right: f32,
}

/// Three noisy time-of-flight rangefinders fanned around the facing.
pub struct ToFArray<R: Rng> {
    config: ToFArrayConfig,
    rng: R,
}

impl<R: Rng> ToFArray<R> {
    pub fn new(config: ToFArrayConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &ToFArrayConfig {
        &self.config
    }

    pub fn read<C: RayCaster + ?Sized>(&mut self, caster: &C, pose: &Pose) -> ArrayReading {
        let side = self.config.side_angle;
        ArrayReading {
            left: self.measure(caster, &pose.rotated(side)),
            front: self.measure(caster, pose),
            right: self.measure(caster, &pose.rotated(-side)),
        }
    }

    fn measure<C: RayCaster + ?Sized>(&mut self, caster: &C, pose: &Pose) -> f32 {
        let max = self.config.max_range;
        let d = caster
            .cast(pose.position, pose.forward, max)
            .map_or(max, |hit| hit.distance);
        let noisy = d + self.config.noise_sigma * standard_normal(&mut self.rng);
        noisy.clamp(0.0, max)
    }
}

/// Box-Muller draw from N(0, 1).
fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    let u1: f32 = 1.0 - rng.random::<f32>();
    let u2: f32 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

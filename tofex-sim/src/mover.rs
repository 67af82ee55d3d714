use tofex_core::Pose;

/// Moves an entity along its facing at constant speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mover {
    /// Metres per second.
    pub speed: f32,
}

impl Mover {
    pub fn new(speed: f32) -> Self {
        Self { speed }
    }

    pub fn step(&self, pose: &Pose, dt: f64) -> Pose {
        Pose {
            position: pose.position + pose.forward * (self.speed * dt as f32),
            forward: pose.forward,
        }
    }
}

impl Default for Mover {
    fn default() -> Self {
        Self { speed: 1.5 }
    }
}

use rand::Rng;
use serde::{Deserialize, Serialize};
use tofex_core::{EntityId, Pose, PoseSource};

use crate::corridor::Corridor;
use crate::mover::Mover;
use crate::navigator::{Action, Navigator, NavigatorConfig};
use crate::tof::{ArrayReading, ToFArray, ToFArrayConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Steering {
    /// Walk straight ahead at constant speed.
    #[default]
    Straight,
    /// Steer from the ToF array through the navigator.
    Guided,
}

/// Moves one corridor agent each frame.
pub struct Driver<R: Rng> {
    mover: Mover,
    steering: Steering,
    navigator: Navigator,
    sensors: ToFArray<R>,
    last_reading: Option<ArrayReading>,
}

impl<R: Rng> Driver<R> {
    pub fn new(
        mover: Mover,
        steering: Steering,
        navigator: NavigatorConfig,
        sensors: ToFArrayConfig,
        rng: R,
    ) -> Self {
        Self {
            mover,
            steering,
            navigator: Navigator::new(navigator),
            sensors: ToFArray::new(sensors, rng),
            last_reading: None,
        }
    }

    pub fn steering(&self) -> Steering {
        self.steering
    }

    pub fn last_reading(&self) -> Option<&ArrayReading> {
        self.last_reading.as_ref()
    }

    /// Advances the agent by `dt` seconds ending at `now`. Returns the action
    /// applied, or `None` if the entity is gone.
    ///
    /// Straight agents pass through obstacles. Guided agents bounce off them
    /// and stay inside the walls.
    pub fn update(
        &mut self,
        corridor: &mut Corridor,
        id: EntityId,
        now: f64,
        dt: f64,
    ) -> Option<Action> {
        let pose = corridor.pose(id)?;
        match self.steering {
            Steering::Straight => {
                corridor.set_pose(id, self.mover.step(&pose, dt));
                Some(Action::Forward)
            }
            Steering::Guided => {
                let reading = self.sensors.read(corridor, &pose);
                self.last_reading = Some(reading);
                let action = self.navigator.step(now, &reading, pose.yaw());
                corridor.set_pose(id, self.apply(&pose, &reading, action, dt));
                corridor.resolve_collisions(id);
                corridor.clamp_to_walls(id);
                Some(action)
            }
        }
    }

    /// Turns walk on at reduced speed unless the front is blocked.
    fn apply(&self, pose: &Pose, reading: &ArrayReading, action: Action, dt: f64) -> Pose {
        let config = self.navigator.config();
        let turn = config.turn_rate * dt as f32;
        let turned = match action {
            Action::Forward => return self.mover.step(pose, dt),
            Action::Stop | Action::Wait => return *pose,
            Action::TurnLeft => pose.rotated(turn),
            Action::TurnRight => pose.rotated(-turn),
        };
        if self.navigator.front_blocked(reading) {
            turned
        } else {
            let walk = Mover::new(self.mover.speed * config.turn_walk_fraction);
            walk.step(&turned, dt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corridor::{CorridorConfig, Obstacle};
    use crate::navigator::HapticMap;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use tofex_core::Vec3;

    fn driver(steering: Steering) -> Driver<StdRng> {
        Driver::new(
            Mover::default(),
            steering,
            NavigatorConfig::default(),
            ToFArrayConfig::default(),
            StdRng::seed_from_u64(3),
        )
    }

    #[test]
    fn straight_driver_ignores_obstacles() {
        let mut corridor = Corridor::default();
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(1.0, 0.0, 2.0), 0.0));
        let mut driver = driver(Steering::Straight);
        for i in 1..=100 {
            driver.update(&mut corridor, id, i as f64 * 0.05, 0.05).unwrap();
        }
        let pose = corridor.pose(id).unwrap();
        assert!((pose.position.x - 8.5).abs() < 1e-3);
        assert_eq!(pose.position.z, 2.0);
        assert!(driver.last_reading().is_none());
    }

    #[test]
    fn guided_driver_waits_for_reaction_delay() {
        let mut corridor = Corridor::new(CorridorConfig {
            obstacles: Vec::new(),
            ..Default::default()
        });
        let start = Pose::from_yaw(Vec3::new(1.0, 0.0, 3.0), 0.0);
        let id = corridor.spawn("agent", start);
        let mut driver = driver(Steering::Guided);
        assert_eq!(driver.update(&mut corridor, id, 0.0, 0.05), Some(Action::Wait));
        assert_eq!(corridor.pose(id), Some(start));
        for i in 1..=10 {
            driver.update(&mut corridor, id, i as f64 * 0.05, 0.05);
        }
        assert!(corridor.pose(id).unwrap().position.x > 1.0);
        assert!(driver.last_reading().is_some());
    }

    /// Runs a guided agent through the default corridor until it reaches the
    /// goal. Returns the time taken and the smallest obstacle clearance seen.
    fn guided_run(seed: u64, dt: f64) -> (Option<f64>, f32, Corridor, EntityId) {
        let mut corridor = Corridor::default();
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(1.0, 0.0, 3.0), 0.0));
        let mut driver = Driver::new(
            Mover::default(),
            Steering::Guided,
            NavigatorConfig::default(),
            ToFArrayConfig::default(),
            StdRng::seed_from_u64(seed),
        );
        let mut clearance = f32::INFINITY;
        for i in 1..=(60.0 / dt) as usize {
            let now = i as f64 * dt;
            driver.update(&mut corridor, id, now, dt);
            clearance = clearance.min(corridor.obstacle_clearance(id).unwrap());
            let z = corridor.pose(id).unwrap().position.z;
            assert!((0.299..=5.701).contains(&z), "left the corridor at z={z}");
            if !corridor.detect_triggers().is_empty() {
                return (Some(now), clearance, corridor, id);
            }
        }
        (None, clearance, corridor, id)
    }

    #[test]
    fn guided_agent_reaches_goal_without_touching_obstacles() {
        for seed in [0, 1, 3, 7, 11] {
            for dt in [0.05, 1.0 / 60.0] {
                let (reached, clearance, corridor, id) = guided_run(seed, dt);
                let at = corridor.pose(id).unwrap().position;
                assert!(reached.is_some(), "seed {seed} dt {dt}: stuck at {at:?}");
                assert!(reached.unwrap() < 30.0);
                assert!(clearance > 0.0, "seed {seed} dt {dt}: clearance {clearance}");
                assert_eq!(corridor.collisions(id), Some(0));
            }
        }
    }

    #[test]
    fn guided_agent_without_avoidance_bounces_off_obstacle() {
        // Haptics off and no stop distance: the agent walks straight into the cylinder.
        let mut corridor = Corridor::new(CorridorConfig {
            obstacles: vec![Obstacle::new(3.0, 3.0, 0.5)],
            ..Default::default()
        });
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(1.0, 0.0, 3.0), 0.0));
        let mut driver = Driver::new(
            Mover::default(),
            Steering::Guided,
            NavigatorConfig {
                reaction_delay: 0.0,
                stop_distance: 0.0,
                haptic: HapticMap { safe_distance: 0.0 },
                ..Default::default()
            },
            ToFArrayConfig::default(),
            StdRng::seed_from_u64(0),
        );
        for i in 1..=40 {
            driver.update(&mut corridor, id, i as f64 * 0.05, 0.05);
        }
        assert!(corridor.collisions(id).unwrap() > 0);
        let x = corridor.pose(id).unwrap().position.x;
        assert!(x <= 2.2 + 1e-4, "passed through the obstacle: x={x}");
    }

    #[test]
    fn straight_agent_is_not_bounced() {
        let mut corridor = Corridor::new(CorridorConfig {
            obstacles: vec![Obstacle::new(3.0, 3.0, 0.5)],
            ..Default::default()
        });
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(1.0, 0.0, 3.0), 0.0));
        let mut driver = driver(Steering::Straight);
        for i in 1..=40 {
            driver.update(&mut corridor, id, i as f64 * 0.05, 0.05);
        }
        assert_eq!(corridor.collisions(id), Some(0));
        assert!((corridor.pose(id).unwrap().position.x - 4.0).abs() < 1e-3);
    }

    #[test]
    fn unknown_entity_is_not_moved() {
        let mut corridor = Corridor::default();
        let mut driver = driver(Steering::Straight);
        assert_eq!(driver.update(&mut corridor, EntityId(5), 0.0, 0.05), None);
    }
}

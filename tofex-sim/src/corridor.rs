//! Straight corridor with side walls, vertical cylindrical obstacles and a
//! goal region at the far end.
//!
//! Coordinates: +X runs down the corridor, +Y is up, and the side walls sit at
//! `z = 0` and `z = width`. Obstacles extend infinitely along Y.

use serde::{Deserialize, Serialize};
use tofex_core::{EntityId, EntityLookup, Hit, Pose, PoseSource, RayCaster, Vec3};
use tracing::debug;

/// Radius of an agent's body, used against walls and obstacles.
pub const AGENT_RADIUS: f32 = 0.3;

/// How far an agent bounces back along its facing on contact.
pub const COLLISION_PUSHBACK: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
}

impl Obstacle {
    pub const fn new(x: f32, z: f32, radius: f32) -> Self {
        Self { x, z, radius }
    }

    /// Gap between the cylinder surface and a body of `radius` at `p`;
    /// negative when they overlap.
    pub fn clearance(&self, p: Vec3, radius: f32) -> f32 {
        let (dx, dz) = (p.x - self.x, p.z - self.z);
        (dx * dx + dz * dz).sqrt() - self.radius - radius
    }

    /// Entry distance of a ray into the cylinder. Rays starting inside never hit.
    fn intersect(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let (ox, oz) = (origin.x - self.x, origin.z - self.z);
        let a = dir.x * dir.x + dir.z * dir.z;
        if a <= f32::EPSILON {
            return None;
        }
        let c = ox * ox + oz * oz - self.radius * self.radius;
        if c < 0.0 {
            return None;
        }
        let b = 2.0 * (ox * dir.x + oz * dir.z);
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let t = (-b - disc.sqrt()) / (2.0 * a);
        (t >= 0.0).then_some(t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub length: f32,
    pub width: f32,
    pub obstacles: Vec<Obstacle>,
    /// Depth of the goal region measured back from the far end.
    pub goal_depth: f32,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            length: 20.0,
            width: 6.0,
            obstacles: vec![
                Obstacle::new(5.0, 2.0, 0.5),
                Obstacle::new(10.0, 4.0, 0.6),
                Obstacle::new(15.0, 2.5, 0.4),
                Obstacle::new(8.0, 5.0, 0.5),
            ],
            goal_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Agent {
    name: String,
    pose: Pose,
    in_goal: bool,
    collisions: usize,
}

#[derive(Debug, Clone)]
pub struct Corridor {
    config: CorridorConfig,
    agents: Vec<Agent>,
}

impl Corridor {
    pub fn new(config: CorridorConfig) -> Self {
        Self {
            config,
            agents: Vec::new(),
        }
    }

    pub fn config(&self) -> &CorridorConfig {
        &self.config
    }

    pub fn goal_start_x(&self) -> f32 {
        self.config.length - self.config.goal_depth
    }

    pub fn spawn(&mut self, name: impl Into<String>, pose: Pose) -> EntityId {
        let id = EntityId(self.agents.len() as u32);
        let in_goal = self.in_goal(&pose.position);
        self.agents.push(Agent {
            name: name.into(),
            pose,
            in_goal,
            collisions: 0,
        });
        id
    }

    pub fn set_pose(&mut self, id: EntityId, pose: Pose) {
        if let Some(agent) = self.agents.get_mut(id.0 as usize) {
            agent.pose = pose;
        }
    }

    /// Keeps an agent's body inside the side walls.
    pub fn clamp_to_walls(&mut self, id: EntityId) {
        let width = self.config.width;
        if let Some(agent) = self.agents.get_mut(id.0 as usize) {
            let z = &mut agent.pose.position.z;
            *z = z.clamp(AGENT_RADIUS, (width - AGENT_RADIUS).max(AGENT_RADIUS));
        }
    }

    /// Bounces an agent that overlaps an obstacle back along its facing and
    /// counts the contact. Returns the number of obstacles touched.
    pub fn resolve_collisions(&mut self, id: EntityId) -> usize {
        let Some(agent) = self.agents.get_mut(id.0 as usize) else {
            return 0;
        };
        let mut touched = 0;
        for obstacle in &self.config.obstacles {
            if obstacle.clearance(agent.pose.position, AGENT_RADIUS) < 0.0 {
                touched += 1;
                let back = agent.pose.forward * COLLISION_PUSHBACK;
                agent.pose.position = agent.pose.position - back;
                debug!(entity = %id, x = obstacle.x, z = obstacle.z, "obstacle contact");
            }
        }
        agent.collisions += touched;
        touched
    }

    /// Obstacle contacts counted so far for `id`.
    pub fn collisions(&self, id: EntityId) -> Option<usize> {
        self.agents.get(id.0 as usize).map(|a| a.collisions)
    }

    /// Smallest gap between the agent's body and any obstacle.
    pub fn obstacle_clearance(&self, id: EntityId) -> Option<f32> {
        let pose = self.pose(id)?;
        self.config
            .obstacles
            .iter()
            .map(|o| o.clearance(pose.position, AGENT_RADIUS))
            .reduce(f32::min)
    }

    fn in_goal(&self, p: &Vec3) -> bool {
        p.x >= self.goal_start_x() && p.z >= 0.0 && p.z <= self.config.width
    }

    /// Entities that entered the goal region since the previous call. An entity
    /// must leave before it can trigger again.
    pub fn detect_triggers(&mut self) -> Vec<EntityId> {
        let goal_x = self.goal_start_x();
        let width = self.config.width;
        let mut entered = Vec::new();
        for (i, agent) in self.agents.iter_mut().enumerate() {
            let p = agent.pose.position;
            let inside = p.x >= goal_x && p.z >= 0.0 && p.z <= width;
            if inside && !agent.in_goal {
                debug!(entity = i, name = %agent.name, x = p.x, "goal entered");
                entered.push(EntityId(i as u32));
            }
            agent.in_goal = inside;
        }
        entered
    }

    fn wall_hit(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let t = if dir.z < 0.0 {
            -origin.z / dir.z
        } else if dir.z > 0.0 {
            (self.config.width - origin.z) / dir.z
        } else {
            return None;
        };
        (t >= 0.0).then_some(t)
    }

    fn floor_hit(origin: Vec3, dir: Vec3) -> Option<f32> {
        if dir.y < 0.0 && origin.y >= 0.0 {
            Some(-origin.y / dir.y)
        } else {
            None
        }
    }
}

impl Default for Corridor {
    fn default() -> Self {
        Self::new(CorridorConfig::default())
    }
}

impl RayCaster for Corridor {
    fn cast(&self, origin: Vec3, direction: Vec3, max_range: f32) -> Option<Hit> {
        let dir = direction.normalized();
        let nearest = self
            .config
            .obstacles
            .iter()
            .filter_map(|o| o.intersect(origin, dir))
            .chain(self.wall_hit(origin, dir))
            .chain(Self::floor_hit(origin, dir))
            .filter(|t| *t < max_range)
            .fold(None, |best: Option<f32>, t| Some(best.map_or(t, |b| b.min(t))))?;
        Some(Hit::along(origin, dir, nearest))
    }
}

impl PoseSource for Corridor {
    fn pose(&self, entity: EntityId) -> Option<Pose> {
        self.agents.get(entity.0 as usize).map(|a| a.pose)
    }
}

impl EntityLookup for Corridor {
    fn find_entity(&self, name: &str) -> Option<EntityId> {
        self.agents
            .iter()
            .position(|a| a.name == name)
            .map(|i| EntityId(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(length: f32, width: f32) -> Corridor {
        Corridor::new(CorridorConfig {
            length,
            width,
            obstacles: Vec::new(),
            goal_depth: 1.0,
        })
    }

    #[test]
    fn ray_down_the_corridor_hits_nothing() {
        let corridor = empty(20.0, 6.0);
        assert_eq!(corridor.cast(Vec3::new(1.0, 0.0, 3.0), Vec3::FORWARD, 50.0), None);
    }

    #[test]
    fn side_wall_distance() {
        let corridor = empty(20.0, 6.0);
        let hit = corridor
            .cast(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0), 10.0)
            .unwrap();
        assert!((hit.distance - 4.0).abs() < 1e-5);
        assert!((hit.point.z - 6.0).abs() < 1e-5);
        assert!(corridor
            .cast(Vec3::new(1.0, 0.0, 2.0), Vec3::new(0.0, 0.0, 1.0), 4.0)
            .is_none());
    }

    #[test]
    fn nearest_obstacle_wins() {
        let corridor = Corridor::new(CorridorConfig {
            obstacles: vec![Obstacle::new(8.0, 3.0, 0.5), Obstacle::new(5.0, 3.0, 1.0)],
            ..CorridorConfig::default()
        });
        let hit = corridor
            .cast(Vec3::new(1.0, 0.0, 3.0), Vec3::FORWARD, 50.0)
            .unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-5);
    }

    #[test]
    fn grazing_miss_and_origin_inside() {
        let corridor = Corridor::new(CorridorConfig {
            obstacles: vec![Obstacle::new(5.0, 3.0, 0.5)],
            ..CorridorConfig::default()
        });
        assert!(corridor
            .cast(Vec3::new(1.0, 0.0, 3.6), Vec3::FORWARD, 50.0)
            .is_none());
        assert!(corridor
            .cast(Vec3::new(5.0, 0.0, 3.0), Vec3::FORWARD, 50.0)
            .is_none());
    }

    #[test]
    fn lookup_and_pose() {
        let mut corridor = Corridor::default();
        let pose = Pose::from_yaw(Vec3::new(1.0, 0.0, 3.0), 0.0);
        let id = corridor.spawn("agent", pose);
        assert_eq!(corridor.find_entity("agent"), Some(id));
        assert_eq!(corridor.find_entity("other"), None);
        assert_eq!(corridor.pose(id), Some(pose));
        assert_eq!(corridor.pose(EntityId(42)), None);
    }

    #[test]
    fn goal_trigger_fires_once_per_entry() {
        let mut corridor = empty(10.0, 6.0);
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(8.0, 0.0, 3.0), 0.0));
        assert!(corridor.detect_triggers().is_empty());

        corridor.set_pose(id, Pose::from_yaw(Vec3::new(9.2, 0.0, 3.0), 0.0));
        assert_eq!(corridor.detect_triggers(), vec![id]);
        corridor.set_pose(id, Pose::from_yaw(Vec3::new(9.5, 0.0, 3.0), 0.0));
        assert!(corridor.detect_triggers().is_empty());

        corridor.set_pose(id, Pose::from_yaw(Vec3::new(8.5, 0.0, 3.0), 0.0));
        assert!(corridor.detect_triggers().is_empty());
        corridor.set_pose(id, Pose::from_yaw(Vec3::new(9.1, 0.0, 3.0), 0.0));
        assert_eq!(corridor.detect_triggers(), vec![id]);
    }

    #[test]
    fn clamp_keeps_agent_off_walls() {
        let mut corridor = empty(10.0, 6.0);
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(1.0, 0.0, 5.95), 0.0));
        corridor.clamp_to_walls(id);
        assert!((corridor.pose(id).unwrap().position.z - 5.7).abs() < 1e-6);
    }

    #[test]
    fn contact_bounces_agent_back_and_is_counted() {
        let mut corridor = Corridor::new(CorridorConfig {
            obstacles: vec![Obstacle::new(5.0, 3.0, 0.5)],
            ..CorridorConfig::default()
        });
        let id = corridor.spawn("agent", Pose::from_yaw(Vec3::new(4.3, 0.0, 3.0), 0.0));
        assert!(corridor.obstacle_clearance(id).unwrap() < 0.0);

        assert_eq!(corridor.resolve_collisions(id), 1);
        assert!((corridor.pose(id).unwrap().position.x - 4.1).abs() < 1e-5);
        assert_eq!(corridor.collisions(id), Some(1));

        // Clear now: nothing more to resolve.
        assert_eq!(corridor.resolve_collisions(id), 0);
        assert_eq!(corridor.collisions(id), Some(1));
        assert!((corridor.obstacle_clearance(id).unwrap() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn resolving_unknown_entity_is_a_no_op() {
        let mut corridor = Corridor::default();
        assert_eq!(corridor.resolve_collisions(EntityId(3)), 0);
        assert_eq!(corridor.collisions(EntityId(3)), None);
        assert_eq!(corridor.obstacle_clearance(EntityId(3)), None);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: CorridorConfig = serde_json::from_str(r#"{ "length": 12.0 }"#).unwrap();
        assert_eq!(config.length, 12.0);
        assert_eq!(config.width, 6.0);
        assert_eq!(config.obstacles.len(), 4);
    }
}

use serde::{Deserialize, Serialize};
use trackway_common::{ArchetypeId, EntityId, Transform};
use trackway_kernel::Scene;

use crate::path::{WaypointId, WaypointPath};

/// A spawned traffic vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct RivalAgent {
    pub entity: EntityId,
    /// Waypoint the agent is steering for. Not owned; looked up on the path.
    pub target: Option<WaypointId>,
    /// Whether a pursuit controller currently drives the vehicle.
    pub external_control: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub archetype: Option<ArchetypeId>,
    pub count: usize,
    /// Distance between consecutive agents along the waypoint's backward axis.
    pub spacing: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            archetype: Some(ArchetypeId::new("rival_car")),
            count: 4,
            spacing: 12.0,
        }
    }
}

/// Places a fixed number of agents along a waypoint path, once.
pub struct TrafficSpawner {
    config: SpawnerConfig,
}

impl TrafficSpawner {
    pub fn new(config: SpawnerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Agent `i` goes to waypoint `min(i, last)`, pushed back by
    /// `spacing * i` against that waypoint's forward and facing along it.
    ///
    /// Without an archetype or a non-empty path nothing is spawned.
    pub fn spawn(&self, path: Option<&WaypointPath>, scene: &mut impl Scene) -> Vec<RivalAgent> {
        let (Some(archetype), Some(path)) = (self.config.archetype.as_ref(), path) else {
            return Vec::new();
        };
        if path.is_empty() {
            return Vec::new();
        }

        let mut agents = Vec::with_capacity(self.config.count);
        for i in 0..self.config.count {
            let Some(wp) = path.at_clamped(i) else {
                break;
            };
            let position = wp.position - wp.forward * self.config.spacing * i as f32;
            let transform = Transform::looking_along(position, wp.forward);
            let entity = scene.instantiate(archetype, transform, None);
            tracing::debug!(agent = i, waypoint = wp.id.0, ?position, "spawned rival");
            agents.push(RivalAgent {
                entity,
                target: Some(wp.id),
                external_control: false,
            });
        }
        tracing::info!(count = agents.len(), "traffic spawned");
        agents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use trackway_kernel::World;

    fn two_point_path() -> WaypointPath {
        WaypointPath::from_points(&[Vec3::ZERO, Vec3::new(0.0, 0.0, 100.0)], false).unwrap()
    }

    #[test]
    fn extra_agents_clamp_to_last_waypoint() {
        let mut world = World::new();
        let spawner = TrafficSpawner::new(SpawnerConfig {
            count: 5,
            ..SpawnerConfig::default()
        });
        let path = two_point_path();
        let agents = spawner.spawn(Some(&path), &mut world);

        assert_eq!(agents.len(), 5);
        assert_eq!(agents[0].target, Some(WaypointId(0)));
        assert_eq!(agents[1].target, Some(WaypointId(1)));
        for agent in &agents[2..] {
            assert_eq!(agent.target, Some(WaypointId(1)));
        }
        assert_eq!(world.entity_count(), 5);
    }

    #[test]
    fn agents_recede_behind_their_waypoint() {
        let mut world = World::new();
        let spawner = TrafficSpawner::new(SpawnerConfig {
            count: 4,
            spacing: 10.0,
            ..SpawnerConfig::default()
        });
        let path = two_point_path();
        let agents = spawner.spawn(Some(&path), &mut world);

        // waypoint 1 sits at z=100 facing +Z
        let z: Vec<f32> = agents
            .iter()
            .map(|a| world.get(a.entity).unwrap().transform.position.z)
            .collect();
        for (actual, expected) in z.iter().zip([0.0, 90.0, 80.0, 70.0]) {
            assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
        }
        for agent in &agents {
            let forward = world.get(agent.entity).unwrap().transform.forward();
            assert!((forward - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn missing_inputs_spawn_nothing() {
        let mut world = World::new();
        let spawner = TrafficSpawner::new(SpawnerConfig::default());
        assert!(spawner.spawn(None, &mut world).is_empty());
        assert!(spawner.spawn(Some(&WaypointPath::default()), &mut world).is_empty());

        let no_archetype = TrafficSpawner::new(SpawnerConfig {
            archetype: None,
            ..SpawnerConfig::default()
        });
        assert!(no_archetype.spawn(Some(&two_point_path()), &mut world).is_empty());
        assert_eq!(world.entity_count(), 0);
    }
}

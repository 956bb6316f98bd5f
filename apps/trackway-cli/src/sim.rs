use anyhow::Context;
use glam::Vec3;
use serde::Serialize;
use trackway_common::{ArchetypeId, EntityId, Transform};
use trackway_config::SimConfig;
use trackway_kernel::{SimRng, World};
use trackway_stream::{AdvanceLatency, TrackStreamer};
use trackway_traffic::{
    ControllerId, PursuitController, RivalAgent, TrafficSpawner, WaypointPath,
};

use crate::vehicle::{KinematicVehicle, VehicleSpec};

struct Rival {
    agent: RivalAgent,
    controller: PursuitController,
    vehicle: KinematicVehicle,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamTotals {
    pub segments_spawned: usize,
    pub segments_evicted: usize,
    pub obstacles_spawned: usize,
    pub obstacles_destroyed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RivalReport {
    pub position: [f32; 3],
    pub speed: f32,
    pub target: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub seed: u64,
    pub ticks: u64,
    pub player_distance: f32,
    pub active_segments: usize,
    pub window_front: Option<f32>,
    pub active_obstacles: usize,
    pub totals: StreamTotals,
    pub entity_count: usize,
    pub rivals: Vec<RivalReport>,
    pub state_hash: u64,
    pub slides: u64,
    pub avg_slide_us: u128,
    pub max_slide_us: u128,
    pub events_retained: usize,
}

/// A headless session: one streaming track plus pursuit-driven traffic.
pub struct Session {
    config: SimConfig,
    world: World,
    streamer: TrackStreamer,
    path: WaypointPath,
    rivals: Vec<Rival>,
    player: EntityId,
    totals: StreamTotals,
    latency: AdvanceLatency,
    record_events: bool,
}

impl Session {
    /// Start a session that discards the world event log every tick.
    pub fn new(config: SimConfig) -> anyhow::Result<Self> {
        Self::start(config, false)
    }

    /// Start a session that keeps the full event log for replay. Memory grows
    /// with the number of ticks run.
    pub fn recording(config: SimConfig) -> anyhow::Result<Self> {
        Self::start(config, true)
    }

    fn start(config: SimConfig, record_events: bool) -> anyhow::Result<Self> {
        config.validate().context("invalid session config")?;
        let path = config.path.build().context("building waypoint path")?;

        let mut world = World::with_seed(config.seed);
        let player = world.spawn(&ArchetypeId::new("player"), Transform::default());

        let mut streamer = TrackStreamer::new(
            config.track.clone(),
            config.content.clone(),
            SimRng::from_seed_u64(config.seed),
        );
        streamer.initialize(&mut world);

        let spawner = TrafficSpawner::new(config.traffic.clone());
        let rivals = spawner
            .spawn(Some(&path), &mut world)
            .into_iter()
            .enumerate()
            .map(|(i, mut agent)| {
                let controller =
                    PursuitController::new(ControllerId(i as u64 + 1), config.pursuit.clone());
                let mut vehicle = KinematicVehicle::new(VehicleSpec::default());
                controller.activate(&mut agent, &mut vehicle);
                Rival {
                    agent,
                    controller,
                    vehicle,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            seed = config.seed,
            segments = streamer.window().len(),
            rivals = rivals.len(),
            waypoints = path.len(),
            record_events,
            "session started"
        );

        Ok(Self {
            config,
            world,
            streamer,
            path,
            rivals,
            player,
            totals: StreamTotals::default(),
            latency: AdvanceLatency::new(256),
            record_events,
        })
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn streamer(&self) -> &TrackStreamer {
        &self.streamer
    }

    pub fn player_position(&self) -> Vec3 {
        self.world
            .get(self.player)
            .map(|d| d.transform.position)
            .unwrap_or_default()
    }

    /// Advance the whole session by one fixed tick.
    pub fn step(&mut self) {
        let dt = self.config.tick_dt;

        let mut player = self
            .world
            .get(self.player)
            .map(|d| d.transform)
            .unwrap_or_default();
        player.position.z += self.config.player_speed * dt;
        self.world.set_transform(self.player, player);

        let stats = self.streamer.advance(&mut self.world, Some(player.position));
        self.totals.segments_spawned += stats.segments_spawned;
        self.totals.segments_evicted += stats.segments_evicted;
        self.totals.obstacles_spawned += stats.obstacles_spawned;
        self.totals.obstacles_destroyed += stats.obstacles_destroyed;
        self.latency.record(stats);

        for rival in &mut self.rivals {
            let Some(transform) = self.world.get(rival.agent.entity).map(|d| d.transform) else {
                continue;
            };
            rival.controller.tick(
                &mut rival.agent,
                &transform,
                &self.path,
                Some(&mut rival.vehicle),
            );
            let next = rival.vehicle.integrate(&transform, dt);
            self.world.set_transform(rival.agent.entity, next);
        }

        self.world.step();
        if !self.record_events {
            self.world.drain_events();
        }
    }

    pub fn run(&mut self, ticks: u64) -> RunReport {
        for _ in 0..ticks {
            self.step();
        }
        self.report()
    }

    /// Release every vehicle and destroy all spawned content.
    pub fn teardown(&mut self) {
        for rival in &mut self.rivals {
            rival.controller.deactivate(&mut rival.agent, &mut rival.vehicle);
            self.world.despawn(rival.agent.entity);
        }
        self.rivals.clear();
        let removed = self.streamer.teardown(&mut self.world);
        tracing::debug!(removed, "track torn down");
    }

    pub fn report(&self) -> RunReport {
        use trackway_traffic::MotionController;

        let window = self.streamer.window();
        RunReport {
            seed: self.config.seed,
            ticks: self.world.tick(),
            player_distance: self.player_position().z,
            active_segments: window.len(),
            window_front: window.front().map(|s| s.offset),
            active_obstacles: window.obstacle_count(),
            totals: self.totals.clone(),
            entity_count: self.world.entity_count(),
            rivals: self
                .rivals
                .iter()
                .map(|r| RivalReport {
                    position: self
                        .world
                        .get(r.agent.entity)
                        .map(|d| d.transform.position.to_array())
                        .unwrap_or_default(),
                    speed: r.vehicle.current_speed(),
                    target: r.agent.target.map(|id| id.0),
                })
                .collect(),
            state_hash: self.world.state_hash(),
            slides: self.latency.slide_count(),
            avg_slide_us: self.latency.average_slide().as_micros(),
            max_slide_us: self.latency.max_slide().as_micros(),
            events_retained: self.world.events().len(),
        }
    }
}

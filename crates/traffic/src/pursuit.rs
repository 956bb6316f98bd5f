use glam::Vec3;
use serde::{Deserialize, Serialize};
use trackway_common::{signed_angle_deg, Transform, UP};

use crate::motion::{ControllerId, ExternalInput, MotionController};
use crate::path::{Waypoint, WaypointPath};
use crate::spawner::RivalAgent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Distance ahead of the waypoint, along its forward, that the agent aims at.
    pub look_ahead: f32,
    /// Target cruising speed. Must be positive.
    pub desired_speed: f32,
    /// When set, an agent this close to its target moves on to the next waypoint.
    pub advance_radius: Option<f32>,
}

impl Default for PursuitConfig {
    fn default() -> Self {
        Self {
            look_ahead: 10.0,
            desired_speed: 30.0,
            advance_radius: None,
        }
    }
}

/// Steering command in `[-1, 1]`: heading error toward the look-ahead point
/// divided by the vehicle's own steer limit.
pub fn steer_toward(
    agent: &Transform,
    waypoint: &Waypoint,
    look_ahead: f32,
    steer_angle_limit: f32,
) -> f32 {
    let target = waypoint.position + waypoint.forward * look_ahead;
    let to_target = (target - agent.position).normalize_or_zero();
    let heading_error = signed_angle_deg(agent.forward(), to_target, UP);
    (heading_error / steer_angle_limit).clamp(-1.0, 1.0)
}

/// Proportional throttle in `[0, 1]`.
///
/// Never negative: above the desired speed the law only lifts off, it does
/// not brake.
pub fn throttle_for(desired_speed: f32, current_speed: f32) -> f32 {
    if desired_speed <= 0.0 {
        return 0.0;
    }
    ((desired_speed - current_speed) / desired_speed).clamp(0.0, 1.0)
}

/// Per-agent pursuit steering over an external-input lease.
#[derive(Debug, Clone)]
pub struct PursuitController {
    id: ControllerId,
    config: PursuitConfig,
}

impl PursuitController {
    pub fn new(id: ControllerId, config: PursuitConfig) -> Self {
        Self { id, config }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn config(&self) -> &PursuitConfig {
        &self.config
    }

    /// Take exclusive ownership of the vehicle's external inputs.
    pub fn activate<M: MotionController>(&self, agent: &mut RivalAgent, motion: &mut M) {
        if let Some(previous) = motion.lease_mut().acquire(self.id) {
            tracing::debug!(
                controller = self.id.0,
                previous = previous.0,
                "took over vehicle inputs"
            );
        }
        motion.use_external_input(true);
        agent.external_control = true;
    }

    /// Hand the vehicle back. A no-op unless this controller holds the lease.
    pub fn deactivate<M: MotionController>(&self, agent: &mut RivalAgent, motion: &mut M) {
        if motion.lease_mut().release(self.id) {
            motion.use_external_input(false);
            agent.external_control = false;
        }
    }

    /// One physics tick. Returns the input that was dispatched, or `None` if
    /// the agent was left coasting (no vehicle, no lease, no target or no
    /// steering spec).
    pub fn tick<M: MotionController>(
        &self,
        agent: &mut RivalAgent,
        transform: &Transform,
        path: &WaypointPath,
        motion: Option<&mut M>,
    ) -> Option<ExternalInput> {
        let motion = motion?;
        if !motion.lease().is_held_by(self.id) {
            return None;
        }
        let limit = motion.steer_angle_limit().filter(|l| *l > 0.0)?;
        self.maybe_advance(agent, transform.position, path);
        let waypoint = agent.target.and_then(|id| path.get(id))?;

        let steer = steer_toward(transform, waypoint, self.config.look_ahead, limit);
        let throttle = throttle_for(self.config.desired_speed, motion.current_speed());
        let input = ExternalInput::drive(steer, throttle);
        motion.set_external_input(input);
        tracing::trace!(
            controller = self.id.0,
            waypoint = waypoint.id.0,
            steer,
            throttle,
            "pursuit input"
        );
        Some(input)
    }

    fn maybe_advance(&self, agent: &mut RivalAgent, position: Vec3, path: &WaypointPath) {
        let Some(radius) = self.config.advance_radius else {
            return;
        };
        let Some(current) = agent.target.and_then(|id| path.get(id)) else {
            return;
        };
        if current.position.distance(position) <= radius {
            agent.target = path.get_next(Some(current.id)).map(|wp| wp.id);
        }
    }
}

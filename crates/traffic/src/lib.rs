//! Traffic: waypoint paths, rival spawning and pursuit steering.
//!
//! # Invariants
//! - A path has no duplicate waypoint ids; an open path holds on its last waypoint.
//! - Spawning runs once and clamps agents beyond the path length to the last waypoint.
//! - A vehicle's external inputs have at most one controlling lease holder.
//! - Throttle is never negative; the pursuit law does not brake.

pub mod motion;
pub mod path;
pub mod pursuit;
pub mod spawner;

pub use motion::{ControllerId, ExternalInput, InputLease, MotionController};
pub use path::{PathError, Waypoint, WaypointId, WaypointPath};
pub use pursuit::{steer_toward, throttle_for, PursuitConfig, PursuitController};
pub use spawner::{RivalAgent, SpawnerConfig, TrafficSpawner};

pub fn crate_info() -> &'static str {
    "trackway-traffic v0.1.0"
}

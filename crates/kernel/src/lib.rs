//! World Kernel: authoritative scene state, spawn/despawn sink, simulation
//! stepping, deterministic replay hooks.
//!
//! # Invariants
//! - All state mutations flow through explicit operations.
//! - Destroying an entity destroys its descendants; no child outlives its parent.
//! - Given the same seed and operation sequence, entity ids and state hashes match.

pub mod rng;
pub mod world;

pub use rng::SimRng;
pub use world::{EntityData, Scene, World, WorldEvent};

pub fn crate_info() -> &'static str {
    "trackway-kernel v0.1.0"
}

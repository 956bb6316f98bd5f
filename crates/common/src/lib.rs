//! Shared types: entity ids, archetype names, transforms, axis conventions.
//!
//! # Conventions
//! - `+Y` is up.
//! - `+Z` is the track's longitudinal axis and an entity's local forward.
//! - `X` is lateral.

mod types;

pub use types::{signed_angle_deg, ArchetypeId, EntityId, Transform, FORWARD, UP};

pub fn crate_info() -> &'static str {
    "trackway-common v0.1.0"
}

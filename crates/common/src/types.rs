use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// World up axis.
pub const UP: Vec3 = Vec3::Y;

/// Local forward axis. Also the track's longitudinal axis.
pub const FORWARD: Vec3 = Vec3::Z;

/// Unique identifier for an entity in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build an id from caller-supplied random bytes (used for seeded allocation).
    pub fn from_random_bytes(bytes: [u8; 16]) -> Self {
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of a spawnable archetype (a segment, obstacle or agent prefab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(pub String);

impl ArchetypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArchetypeId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Transform at `position` whose forward axis points along `forward`.
    pub fn looking_along(position: Vec3, forward: Vec3) -> Self {
        let dir = forward.normalize_or_zero();
        let rotation = if dir == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(FORWARD, dir)
        };
        Self {
            position,
            rotation,
            scale: Vec3::ONE,
        }
    }

    /// World-space forward direction.
    pub fn forward(&self) -> Vec3 {
        self.rotation * FORWARD
    }
}

/// Signed angle in degrees from `from` to `to`, measured around `axis`.
///
/// Negative when `axis · (from × to)` is negative. Returns 0 when either
/// vector is too short to define a direction.
pub fn signed_angle_deg(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    const EPSILON_SQ: f32 = 1e-15;
    if from.length_squared() < EPSILON_SQ || to.length_squared() < EPSILON_SQ {
        return 0.0;
    }
    let cos = (from.dot(to) / (from.length() * to.length())).clamp(-1.0, 1.0);
    let unsigned = cos.acos().to_degrees();
    if axis.dot(from.cross(to)) < 0.0 {
        -unsigned
    } else {
        unsigned
    }
}

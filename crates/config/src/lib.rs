//! Session configuration: everything the streamer, spawner and pursuit
//! controllers need, loaded from YAML and validated once at startup.
//!
//! # Invariants
//! - Numeric settings that would divide by zero or invert a sampling range
//!   are rejected here, never at tick time.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;
use trackway_common::ArchetypeId;
use trackway_stream::{StreamConfig, TrackContent};
use trackway_traffic::{PathError, PursuitConfig, SpawnerConfig, Waypoint, WaypointPath};

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid path: {0}")]
    Path(#[from] PathError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// One authored waypoint. `forward` defaults to facing the next point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointSpec {
    pub position: Vec3,
    #[serde(default)]
    pub forward: Option<Vec3>,
}

/// Where rival traffic drives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathConfig {
    /// Explicit waypoint list.
    Authored {
        #[serde(default)]
        looped: bool,
        waypoints: Vec<WaypointSpec>,
    },
    /// Generated elliptical loop.
    Oval {
        center: Vec3,
        radius_x: f32,
        radius_z: f32,
        count: usize,
    },
}

impl Default for PathConfig {
    fn default() -> Self {
        Self::Oval {
            center: Vec3::new(0.0, 0.0, 250.0),
            radius_x: 60.0,
            radius_z: 240.0,
            count: 24,
        }
    }
}

impl PathConfig {
    /// Build the waypoint path described by this config.
    pub fn build(&self) -> Result<WaypointPath, PathError> {
        match self {
            Self::Oval {
                center,
                radius_x,
                radius_z,
                count,
            } => WaypointPath::oval(*center, *radius_x, *radius_z, *count),
            Self::Authored { looped, waypoints } => {
                let points: Vec<Vec3> = waypoints.iter().map(|w| w.position).collect();
                let generated = WaypointPath::from_points(&points, *looped)?;
                let merged = waypoints
                    .iter()
                    .zip(generated.iter())
                    .enumerate()
                    .map(|(i, (spec, auto))| {
                        Waypoint::new(i as u32, spec.position, spec.forward.unwrap_or(auto.forward))
                    })
                    .collect();
                WaypointPath::new(merged, *looped)
            }
        }
    }
}

/// Full session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seed for every random draw in the session.
    pub seed: u64,
    /// Ticks to simulate when running headless.
    pub ticks: u64,
    /// Fixed timestep in seconds.
    pub tick_dt: f32,
    /// Speed of the streaming reference along `+Z`.
    pub player_speed: f32,
    pub track: StreamConfig,
    pub content: TrackContent,
    pub traffic: SpawnerConfig,
    pub pursuit: PursuitConfig,
    pub path: PathConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 3_000,
            tick_dt: 1.0 / 60.0,
            player_speed: 40.0,
            track: StreamConfig::default(),
            content: TrackContent::new(
                ["road_straight", "road_bridge", "road_tunnel"].map(ArchetypeId::new),
                ["cone", "barrier", "oil_slick"].map(ArchetypeId::new),
            ),
            traffic: SpawnerConfig::default(),
            pursuit: PursuitConfig {
                advance_radius: Some(15.0),
                ..PursuitConfig::default()
            },
            path: PathConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::info!(path = %path.as_ref().display(), "loaded config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Reject degenerate numeric settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.track;
        if !(t.segment_length.is_finite() && t.segment_length > 0.0) {
            return Err(invalid("track.segment_length", "must be positive and finite"));
        }
        if !non_negative(t.seam_margin) {
            return Err(invalid("track.seam_margin", "must be finite and not negative"));
        }
        if t.segment_length <= 2.0 * t.seam_margin {
            return Err(invalid(
                "track.segment_length",
                format!(
                    "{} leaves no room for obstacles between {} unit seam margins",
                    t.segment_length, t.seam_margin
                ),
            ));
        }
        if t.max_segments == 0 {
            return Err(invalid("track.max_segments", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&t.obstacle_chance) {
            return Err(invalid("track.obstacle_chance", "must be within [0, 1]"));
        }
        if t.obstacle_count_min >= t.obstacle_count_max {
            return Err(invalid(
                "track.obstacle_count_max",
                "must be greater than obstacle_count_min",
            ));
        }
        if !non_negative(t.lateral_extent) {
            return Err(invalid("track.lateral_extent", "must be finite and not negative"));
        }

        let p = &self.pursuit;
        if !(p.desired_speed.is_finite() && p.desired_speed > 0.0) {
            return Err(invalid("pursuit.desired_speed", "must be positive"));
        }
        if !non_negative(p.look_ahead) {
            return Err(invalid("pursuit.look_ahead", "must be finite and not negative"));
        }
        if p.advance_radius.is_some_and(|r| !(r.is_finite() && r > 0.0)) {
            return Err(invalid(
                "pursuit.advance_radius",
                "must be positive and finite when set",
            ));
        }

        if !non_negative(self.traffic.spacing) {
            return Err(invalid("traffic.spacing", "must be finite and not negative"));
        }
        if !(self.tick_dt.is_finite() && self.tick_dt > 0.0) {
            return Err(invalid("tick_dt", "must be positive"));
        }
        if !self.player_speed.is_finite() {
            return Err(invalid("player_speed", "must be finite"));
        }

        self.path.build()?;
        Ok(())
    }
}

// NaN fails every comparison, so a plain `x < 0.0` check lets it through.
fn non_negative(x: f32) -> bool {
    x.is_finite() && x >= 0.0
}

pub fn crate_info() -> &'static str {
    "trackway-config v0.1.0"
}

use serde::{Deserialize, Serialize};
use trackway_common::ArchetypeId;

/// Streaming configuration: window size, segment spacing, obstacle placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Longitudinal length of one segment (world units).
    pub segment_length: f32,
    /// Maximum number of segments active at once.
    pub max_segments: usize,
    /// Probability in `[0, 1]` that a new segment carries obstacles.
    pub obstacle_chance: f32,
    /// Inclusive lower bound of the per-segment obstacle count.
    pub obstacle_count_min: u32,
    /// Exclusive upper bound of the per-segment obstacle count.
    pub obstacle_count_max: u32,
    /// Obstacles are placed laterally within `[-lateral_extent, lateral_extent]`.
    pub lateral_extent: f32,
    /// Obstacles keep this distance from both segment seams.
    pub seam_margin: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            segment_length: 100.0,
            max_segments: 5,
            obstacle_chance: 0.35,
            obstacle_count_min: 1,
            obstacle_count_max: 4,
            lateral_extent: 6.0,
            seam_margin: 10.0,
        }
    }
}

impl StreamConfig {
    /// Longitudinal span covered by a full window.
    pub fn window_span(&self) -> f32 {
        self.segment_length * self.max_segments as f32
    }

    /// Obstacle longitudinal range for a segment starting at `head`, or
    /// `None` when the seam margins leave no room.
    pub fn obstacle_range(&self, head: f32) -> Option<(f32, f32)> {
        let lo = head + self.seam_margin;
        let hi = head + self.segment_length - self.seam_margin;
        (lo < hi).then_some((lo, hi))
    }
}

/// Archetype pools the streamer draws from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackContent {
    pub segments: Vec<ArchetypeId>,
    pub obstacles: Vec<ArchetypeId>,
}

impl TrackContent {
    pub fn new(
        segments: impl IntoIterator<Item = ArchetypeId>,
        obstacles: impl IntoIterator<Item = ArchetypeId>,
    ) -> Self {
        Self {
            segments: segments.into_iter().collect(),
            obstacles: obstacles.into_iter().collect(),
        }
    }
}

use std::collections::VecDeque;
use trackway_common::{ArchetypeId, EntityId};

/// A hazard spawned on a segment. Owned by its segment and destroyed with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub entity: EntityId,
    pub archetype: ArchetypeId,
    /// World-space lateral offset (X).
    pub lateral: f32,
    /// World-space longitudinal offset (Z).
    pub longitudinal: f32,
}

/// One spawned unit of track geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSegment {
    pub entity: EntityId,
    pub archetype: ArchetypeId,
    /// Longitudinal offset of the segment's trailing seam.
    pub offset: f32,
    pub(crate) obstacles: Vec<Obstacle>,
}

impl TrackSegment {
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }
}

/// FIFO of active segments, oldest (closest behind the reference) first.
#[derive(Debug, Clone, Default)]
pub struct ActiveWindow {
    segments: VecDeque<TrackSegment>,
}

impl ActiveWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Oldest segment.
    pub fn front(&self) -> Option<&TrackSegment> {
        self.segments.front()
    }

    /// Newest segment.
    pub fn back(&self) -> Option<&TrackSegment> {
        self.segments.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackSegment> {
        self.segments.iter()
    }

    /// Segment offsets, oldest first.
    pub fn offsets(&self) -> Vec<f32> {
        self.segments.iter().map(|s| s.offset).collect()
    }

    /// Total obstacles carried by active segments.
    pub fn obstacle_count(&self) -> usize {
        self.segments.iter().map(|s| s.obstacles.len()).sum()
    }

    /// True when offsets increase by exactly `segment_length` with no gaps.
    pub fn is_contiguous(&self, segment_length: f32) -> bool {
        self.segments
            .iter()
            .zip(self.segments.iter().skip(1))
            .all(|(a, b)| (b.offset - a.offset - segment_length).abs() <= segment_length * 1e-5)
    }

    pub(crate) fn push_back(&mut self, segment: TrackSegment) {
        self.segments.push_back(segment);
    }

    pub(crate) fn pop_front(&mut self) -> Option<TrackSegment> {
        self.segments.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(offset: f32) -> TrackSegment {
        TrackSegment {
            entity: EntityId::new(),
            archetype: ArchetypeId::new("straight"),
            offset,
            obstacles: Vec::new(),
        }
    }

    #[test]
    fn fifo_order() {
        let mut window = ActiveWindow::new();
        window.push_back(segment(0.0));
        window.push_back(segment(100.0));
        assert_eq!(window.front().map(|s| s.offset), Some(0.0));
        assert_eq!(window.back().map(|s| s.offset), Some(100.0));
        assert_eq!(window.pop_front().map(|s| s.offset), Some(0.0));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn contiguity_detects_gaps() {
        let mut window = ActiveWindow::new();
        window.push_back(segment(0.0));
        window.push_back(segment(100.0));
        assert!(window.is_contiguous(100.0));
        window.push_back(segment(300.0));
        assert!(!window.is_contiguous(100.0));
    }
}

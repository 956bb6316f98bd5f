use glam::Vec3;
use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Instant;
use trackway_common::Transform;
use trackway_kernel::{Scene, SimRng};

use crate::config::{StreamConfig, TrackContent};
use crate::segment::{ActiveWindow, Obstacle, TrackSegment};
use crate::stats::StreamStats;

/// Keeps a bounded window of track segments ahead of a moving reference.
///
/// New segments are appended at the head; the oldest segment is evicted once
/// the reference has moved more than one full segment past its trailing seam.
/// At most one segment is evicted and one spawned per `advance`, so a large
/// jump of the reference is caught up over several ticks.
pub struct TrackStreamer<R = SimRng> {
    config: StreamConfig,
    content: TrackContent,
    rng: R,
    window: ActiveWindow,
    next_spawn_offset: f32,
    stats: StreamStats,
}

impl<R: Rng> TrackStreamer<R> {
    pub fn new(config: StreamConfig, content: TrackContent, rng: R) -> Self {
        Self {
            config,
            content,
            rng,
            window: ActiveWindow::new(),
            next_spawn_offset: 0.0,
            stats: StreamStats::default(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn content(&self) -> &TrackContent {
        &self.content
    }

    pub fn window(&self) -> &ActiveWindow {
        &self.window
    }

    /// Offset at which the next segment will be spawned.
    pub fn next_spawn_offset(&self) -> f32 {
        self.next_spawn_offset
    }

    /// Statistics from the last `advance`.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Fill the window with `max_segments` segments starting at offset 0.
    /// Does nothing if the window already holds segments.
    pub fn initialize(&mut self, scene: &mut impl Scene) -> usize {
        if !self.window.is_empty() {
            return 0;
        }
        let mut spawned = 0;
        for _ in 0..self.config.max_segments {
            if self.spawn_segment(scene).is_some() {
                spawned += 1;
            }
        }
        tracing::debug!(
            spawned,
            next_offset = self.next_spawn_offset,
            "track window initialized"
        );
        spawned
    }

    /// Slide the window forward if the reference has left the trailing segment.
    pub fn advance(&mut self, scene: &mut impl Scene, reference: Option<Vec3>) -> &StreamStats {
        let _span = tracing::info_span!("stream_advance").entered();
        let start = Instant::now();
        let mut stats = StreamStats::default();

        let trailing_passed = match (reference, self.window.front()) {
            (Some(reference), Some(front)) => {
                reference.z - front.offset > self.config.segment_length
            }
            _ => false,
        };
        if trailing_passed {
            if let Some(evicted) = self.window.pop_front() {
                let removed = scene.destroy(evicted.entity);
                tracing::debug!(
                    offset = evicted.offset,
                    obstacles = evicted.obstacles.len(),
                    removed,
                    "evicting segment"
                );
                stats.segments_evicted = 1;
                stats.obstacles_destroyed = evicted.obstacles.len();
            }
            if let Some(segment) = self.spawn_segment(scene) {
                stats.segments_spawned = 1;
                stats.obstacles_spawned = segment.obstacles.len();
            }
        }

        stats.active_segments = self.window.len();
        stats.elapsed = start.elapsed();
        tracing::trace!(
            spawned = stats.segments_spawned,
            evicted = stats.segments_evicted,
            active = stats.active_segments,
            "stream advance complete"
        );
        self.stats = stats;
        &self.stats
    }

    /// Spawn one segment at the head, possibly with obstacles.
    ///
    /// Returns `None` without side effects when the segment pool is empty or
    /// the window is already full.
    fn spawn_segment(&mut self, scene: &mut impl Scene) -> Option<&TrackSegment> {
        if self.window.len() >= self.config.max_segments {
            return None;
        }
        let archetype = self.content.segments.choose(&mut self.rng)?.clone();
        let offset = self.next_spawn_offset;
        let entity = scene.instantiate(
            &archetype,
            Transform::from_position(Vec3::new(0.0, 0.0, offset)),
            None,
        );
        self.next_spawn_offset += self.config.segment_length;

        let mut segment = TrackSegment {
            entity,
            archetype,
            offset,
            obstacles: Vec::new(),
        };
        if self.rng.r#gen::<f32>() < self.config.obstacle_chance {
            self.place_obstacles(scene, &mut segment);
        }
        tracing::debug!(
            offset,
            archetype = %segment.archetype,
            obstacles = segment.obstacles.len(),
            "spawned segment"
        );

        self.window.push_back(segment);
        self.window.back()
    }

    /// Destroy every active segment (and its obstacles). Used at region teardown.
    pub fn teardown(&mut self, scene: &mut impl Scene) -> usize {
        let mut removed = 0;
        while let Some(segment) = self.window.pop_front() {
            removed += scene.destroy(segment.entity);
        }
        removed
    }

    fn place_obstacles(&mut self, scene: &mut impl Scene, segment: &mut TrackSegment) {
        if self.content.obstacles.is_empty() {
            return;
        }
        let Some((lo, hi)) = self.config.obstacle_range(segment.offset) else {
            tracing::debug!(
                segment_length = self.config.segment_length,
                "segment too short for obstacle margins, skipping"
            );
            return;
        };
        let (min, max) = (self.config.obstacle_count_min, self.config.obstacle_count_max);
        if min >= max {
            return;
        }
        let count = self.rng.gen_range(min..max);
        let extent = self.config.lateral_extent.abs();
        for _ in 0..count {
            let Some(archetype) = self.content.obstacles.choose(&mut self.rng).cloned() else {
                return;
            };
            let lateral = self.rng.gen_range(-extent..=extent);
            let longitudinal = self.rng.gen_range(lo..=hi);
            let entity = scene.instantiate(
                &archetype,
                Transform::from_position(Vec3::new(lateral, 0.0, longitudinal)),
                Some(segment.entity),
            );
            segment.obstacles.push(Obstacle {
                entity,
                archetype,
                lateral,
                longitudinal,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackway_common::ArchetypeId;
    use trackway_kernel::World;

    fn content() -> TrackContent {
        TrackContent::new(
            [ArchetypeId::new("straight"), ArchetypeId::new("bridge")],
            [ArchetypeId::new("cone"), ArchetypeId::new("barrier")],
        )
    }

    fn streamer(config: StreamConfig, seed: u64) -> TrackStreamer {
        TrackStreamer::new(config, content(), SimRng::from_seed_u64(seed))
    }

    fn at(z: f32) -> Option<Vec3> {
        Some(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn initialize_fills_window() {
        let mut world = World::with_seed(1);
        let mut s = streamer(StreamConfig::default(), 1);
        assert_eq!(s.initialize(&mut world), 5);
        assert_eq!(s.window().len(), 5);
        assert_eq!(s.window().offsets(), vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        assert_eq!(s.next_spawn_offset(), 500.0);

        // second call is a no-op
        assert_eq!(s.initialize(&mut world), 0);
        assert_eq!(s.window().len(), 5);
    }

    #[test]
    fn full_window_refuses_extra_segments() {
        let mut world = World::new();
        let mut s = streamer(StreamConfig::default(), 2);
        s.initialize(&mut world);
        let entities = world.entity_count();

        assert!(s.spawn_segment(&mut world).is_none());
        assert_eq!(s.window().len(), 5);
        assert_eq!(s.next_spawn_offset(), 500.0);
        assert_eq!(world.entity_count(), entities);
    }

    #[test]
    fn eviction_trigger_threshold() {
        let mut world = World::new();
        let mut s = streamer(StreamConfig::default(), 3);
        s.initialize(&mut world);

        let stats = s.advance(&mut world, at(99.99)).clone();
        assert_eq!(stats.segments_evicted, 0);
        assert_eq!(stats.segments_spawned, 0);
        assert_eq!(s.window().front().map(|f| f.offset), Some(0.0));

        let stats = s.advance(&mut world, at(150.01)).clone();
        assert_eq!(stats.segments_evicted, 1);
        assert_eq!(stats.segments_spawned, 1);
        assert_eq!(s.window().offsets(), vec![100.0, 200.0, 300.0, 400.0, 500.0]);
    }

    #[test]
    fn exactly_one_segment_length_does_not_evict() {
        let mut world = World::new();
        let mut s = streamer(StreamConfig::default(), 3);
        s.initialize(&mut world);
        s.advance(&mut world, at(100.0));
        assert_eq!(s.window().front().map(|f| f.offset), Some(0.0));
    }

    #[test]
    fn large_jump_catches_up_one_segment_per_tick() {
        let mut world = World::new();
        let mut s = streamer(StreamConfig::default(), 4);
        s.initialize(&mut world);

        for expected_front in [100.0, 200.0, 300.0] {
            s.advance(&mut world, at(1000.0));
            assert_eq!(s.window().front().map(|f| f.offset), Some(expected_front));
            assert_eq!(s.window().len(), 5);
        }
    }

    #[test]
    fn window_bound_and_contiguity_hold_while_driving() {
        let mut world = World::new();
        let config = StreamConfig::default();
        let mut s = streamer(config.clone(), 5);
        s.initialize(&mut world);

        for tick in 0..2_000 {
            s.advance(&mut world, at(tick as f32 * 1.7));
            assert!(s.window().len() <= config.max_segments);
            assert!(s.window().is_contiguous(config.segment_length));
            let front = s.window().front().map(|f| f.offset).unwrap_or_default();
            assert_eq!(s.next_spawn_offset(), front + config.window_span());
        }
    }

    #[test]
    fn obstacles_stay_inside_segment_margins() {
        let mut world = World::new();
        let config = StreamConfig {
            obstacle_chance: 1.0,
            ..StreamConfig::default()
        };
        let mut s = streamer(config.clone(), 6);
        s.initialize(&mut world);

        let mut seen = 0;
        for tick in 0..200 {
            s.advance(&mut world, at(tick as f32 * 20.0));
            for segment in s.window().iter() {
                assert!((1..4).contains(&segment.obstacles().len()));
                for o in segment.obstacles() {
                    assert!(o.lateral >= -6.0 && o.lateral <= 6.0);
                    assert!(o.longitudinal >= segment.offset + 10.0);
                    assert!(o.longitudinal <= segment.offset + config.segment_length - 10.0);
                    seen += 1;
                }
            }
        }
        assert!(seen > 0);
    }

    #[test]
    fn eviction_destroys_owned_obstacles() {
        let mut world = World::new();
        let config = StreamConfig {
            obstacle_chance: 1.0,
            ..StreamConfig::default()
        };
        let mut s = streamer(config, 7);
        s.initialize(&mut world);

        let front = s.window().front().cloned().unwrap();
        assert!(!front.obstacles().is_empty());
        let before = world.entity_count();

        let stats = s.advance(&mut world, at(150.0)).clone();
        assert_eq!(stats.obstacles_destroyed, front.obstacles().len());
        assert!(!world.contains(front.entity));
        for o in front.obstacles() {
            assert!(!world.contains(o.entity));
        }
        assert_eq!(
            world.entity_count(),
            before - 1 - front.obstacles().len() + 1 + stats.obstacles_spawned
        );
    }

    #[test]
    fn zero_chance_places_no_obstacles() {
        let mut world = World::new();
        let config = StreamConfig {
            obstacle_chance: 0.0,
            ..StreamConfig::default()
        };
        let mut s = streamer(config, 8);
        s.initialize(&mut world);
        assert_eq!(s.window().obstacle_count(), 0);
        assert_eq!(world.entity_count(), 5);
    }

    #[test]
    fn empty_segment_pool_is_a_silent_no_op() {
        let mut world = World::new();
        let mut s = TrackStreamer::new(
            StreamConfig::default(),
            TrackContent::default(),
            SimRng::from_seed_u64(9),
        );
        assert_eq!(s.initialize(&mut world), 0);
        assert!(s.window().is_empty());
        let stats = s.advance(&mut world, at(10_000.0)).clone();
        assert_eq!(stats.segments_spawned, 0);
        assert_eq!(world.entity_count(), 0);
        assert_eq!(s.next_spawn_offset(), 0.0);
    }

    #[test]
    fn empty_obstacle_pool_skips_placement() {
        let mut world = World::new();
        let config = StreamConfig {
            obstacle_chance: 1.0,
            ..StreamConfig::default()
        };
        let content = TrackContent::new([ArchetypeId::new("straight")], Vec::<ArchetypeId>::new());
        let mut s = TrackStreamer::new(config, content, SimRng::from_seed_u64(10));
        s.initialize(&mut world);
        assert_eq!(s.window().obstacle_count(), 0);
    }

    #[test]
    fn short_segments_skip_obstacles() {
        let mut world = World::new();
        let config = StreamConfig {
            segment_length: 20.0,
            obstacle_chance: 1.0,
            ..StreamConfig::default()
        };
        let mut s = streamer(config, 11);
        s.initialize(&mut world);
        assert_eq!(s.window().len(), 5);
        assert_eq!(s.window().obstacle_count(), 0);
    }

    #[test]
    fn missing_reference_is_a_no_op() {
        let mut world = World::new();
        let mut s = streamer(StreamConfig::default(), 12);
        s.initialize(&mut world);
        let stats = s.advance(&mut world, None).clone();
        assert_eq!(stats.segments_evicted, 0);
        assert_eq!(s.window().front().map(|f| f.offset), Some(0.0));
    }

    #[test]
    fn same_seed_reproduces_placements() {
        let config = StreamConfig {
            obstacle_chance: 0.5,
            ..StreamConfig::default()
        };
        let run = |seed| {
            let mut world = World::with_seed(0);
            let mut s = streamer(config.clone(), seed);
            s.initialize(&mut world);
            for tick in 0..50 {
                s.advance(&mut world, at(tick as f32 * 30.0));
            }
            s.window()
                .iter()
                .map(|seg| {
                    let obstacles: Vec<(String, f32, f32)> = seg
                        .obstacles()
                        .iter()
                        .map(|o| (o.archetype.0.clone(), o.lateral, o.longitudinal))
                        .collect();
                    (seg.archetype.0.clone(), seg.offset, obstacles)
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn teardown_destroys_everything() {
        let mut world = World::new();
        let config = StreamConfig {
            obstacle_chance: 1.0,
            ..StreamConfig::default()
        };
        let mut s = streamer(config, 13);
        s.initialize(&mut world);
        let total = world.entity_count();
        assert_eq!(s.teardown(&mut world), total);
        assert!(s.window().is_empty());
        assert_eq!(world.entity_count(), 0);
    }
}

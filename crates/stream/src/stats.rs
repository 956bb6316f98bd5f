use std::collections::VecDeque;
use std::time::Duration;

/// Per-advance streaming statistics for instrumentation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub segments_spawned: usize,
    pub segments_evicted: usize,
    pub obstacles_spawned: usize,
    pub obstacles_destroyed: usize,
    pub active_segments: usize,
    pub elapsed: Duration,
}

impl StreamStats {
    /// True when this advance evicted or spawned a segment.
    pub fn slid(&self) -> bool {
        self.segments_evicted > 0 || self.segments_spawned > 0
    }
}

/// Latency of window slides, kept apart from the idle advances where the
/// reference has not crossed a segment boundary.
///
/// Only the most recent `capacity` slides are retained.
#[derive(Debug, Clone)]
pub struct AdvanceLatency {
    slides: VecDeque<Duration>,
    capacity: usize,
    total_slides: u64,
    idle: u64,
}

impl AdvanceLatency {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slides: VecDeque::with_capacity(capacity),
            capacity,
            total_slides: 0,
            idle: 0,
        }
    }

    pub fn record(&mut self, stats: &StreamStats) {
        if !stats.slid() {
            self.idle += 1;
            return;
        }
        if self.slides.len() == self.capacity {
            self.slides.pop_front();
        }
        self.slides.push_back(stats.elapsed);
        self.total_slides += 1;
    }

    /// Mean slide latency over the retained window.
    pub fn average_slide(&self) -> Duration {
        if self.slides.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.slides.iter().sum();
        total / self.slides.len() as u32
    }

    pub fn max_slide(&self) -> Duration {
        self.slides.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Slides recorded since construction, including ones no longer retained.
    pub fn slide_count(&self) -> u64 {
        self.total_slides
    }

    pub fn idle_count(&self) -> u64 {
        self.idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(ms: u64) -> StreamStats {
        StreamStats {
            segments_spawned: 1,
            segments_evicted: 1,
            active_segments: 5,
            elapsed: Duration::from_millis(ms),
            ..StreamStats::default()
        }
    }

    fn idle(ms: u64) -> StreamStats {
        StreamStats {
            active_segments: 5,
            elapsed: Duration::from_millis(ms),
            ..StreamStats::default()
        }
    }

    #[test]
    fn idle_advances_do_not_dilute_slide_latency() {
        let mut latency = AdvanceLatency::new(8);
        latency.record(&slide(10));
        for _ in 0..100 {
            latency.record(&idle(0));
        }
        latency.record(&slide(30));

        assert_eq!(latency.slide_count(), 2);
        assert_eq!(latency.idle_count(), 100);
        assert_eq!(latency.average_slide(), Duration::from_millis(20));
        assert_eq!(latency.max_slide(), Duration::from_millis(30));
    }

    #[test]
    fn oldest_slides_are_dropped_past_capacity() {
        let mut latency = AdvanceLatency::new(2);
        latency.record(&slide(90));
        latency.record(&slide(10));
        latency.record(&slide(30));

        assert_eq!(latency.slide_count(), 3);
        assert_eq!(latency.average_slide(), Duration::from_millis(20));
        assert_eq!(latency.max_slide(), Duration::from_millis(30));
    }

    #[test]
    fn spawn_only_advance_counts_as_slide() {
        let mut latency = AdvanceLatency::new(4);
        latency.record(&StreamStats {
            segments_spawned: 1,
            elapsed: Duration::from_millis(5),
            ..StreamStats::default()
        });
        assert_eq!(latency.slide_count(), 1);
        assert_eq!(latency.idle_count(), 0);
    }

    #[test]
    fn no_slides_reports_zero() {
        let mut latency = AdvanceLatency::new(4);
        latency.record(&idle(3));
        assert_eq!(latency.average_slide(), Duration::ZERO);
        assert_eq!(latency.max_slide(), Duration::ZERO);
    }
}

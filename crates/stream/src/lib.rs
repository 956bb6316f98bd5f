//! Track streaming: a bounded sliding window of segments ahead of a moving
//! reference, with probabilistic obstacle placement.
//!
//! # Invariants
//! - At most `max_segments` segments are active; exactly that many after init.
//! - Active segment offsets form a gap-free arithmetic sequence.
//! - Obstacles are owned by their segment and destroyed with it.
//! - Missing content or reference never errors; the track simply stops growing.

mod config;
mod segment;
mod stats;
mod streamer;

pub use config::{StreamConfig, TrackContent};
pub use segment::{ActiveWindow, Obstacle, TrackSegment};
pub use stats::{AdvanceLatency, StreamStats};
pub use streamer::TrackStreamer;

pub fn crate_info() -> &'static str {
    "trackway-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}

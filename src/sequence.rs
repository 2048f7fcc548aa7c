//! A loaded show sequence: tick cadence, length, and its channel table.

use crate::channel::ChannelTable;

/// One parsed `.lms` score, ready to be played tick by tick.
#[derive(Debug, Default)]
pub struct Sequence {
    /// Milliseconds per tick, taken from the narrowest effect duration seen
    /// while loading (mirrors `lormedia_sequence_load`'s step_time_ms pass).
    pub step_time_ms: u32,
    /// Total number of ticks in the sequence, derived from the longest track.
    pub frame_count: u32,
    pub channels: ChannelTable,
}

impl Sequence {
    pub fn new(step_time_ms: u32, frame_count: u32, channels: ChannelTable) -> Self {
        Self {
            step_time_ms,
            frame_count,
            channels,
        }
    }

    /// Total wall-clock duration of the sequence.
    pub fn duration_ms(&self) -> u64 {
        u64::from(self.step_time_ms) * u64::from(self.frame_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_step_times_frame_count() {
        let seq = Sequence::new(50, 200, ChannelTable::new());
        assert_eq!(seq.duration_ms(), 10_000);
    }
}

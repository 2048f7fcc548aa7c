//! Show iteration, audio lifecycle, and the per-sequence tick loop.
//!
//! Ported from `player_init`/`player_start`/`player_advance`/`player_free` in
//! the original C player. The original threads a single OpenAL source/buffer
//! and a `sequence_files_cur`/`show_loop_counter` pair of module statics
//! through free functions; here that state is owned by one `Player<A, T>`
//! value, generic over the audio and transport seams (`audio::AudioSource`,
//! `transport::Transport`) so it runs against `NullSource`/`NullTransport`
//! in tests without touching real hardware.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::audio::AudioSource;
use crate::buffer::OutputBuffer;
use crate::channel::ChannelTable;
use crate::encoder;
use crate::error::Result;
use crate::interval::Interval;
use crate::loader;
use crate::minify::minify_frame;
use crate::output_state::OutputState;
use crate::show::{LoopCount, Show};
use crate::transport::Transport;

/// Owns the show, the per-sequence scratch state, and the audio/transport
/// collaborators for one run of the player.
pub struct Player<A: AudioSource, T: Transport> {
    audio: A,
    transport: T,
    show: Show,
    buffer: OutputBuffer,
    channels: ChannelTable,
    state: OutputState,
}

impl<A: AudioSource, T: Transport> Player<A, T> {
    /// Acquires the show file and wires in the audio/transport collaborators
    /// (`player_init`). Rejects an empty show file (`Error::EmptyShow`).
    pub fn init(audio: A, transport: T, show_path: &Path, loop_count: LoopCount) -> Result<Self> {
        let show = Show::load(show_path, loop_count)?;
        Ok(Self {
            audio,
            transport,
            show,
            buffer: OutputBuffer::new(),
            channels: ChannelTable::new(),
            state: OutputState::new(0),
        })
    }

    /// The next sequence path to play, or `None` once the show (and its
    /// loop budget) is exhausted (`player_advance`/`player_has_next`).
    pub fn next_sequence(&mut self) -> Option<PathBuf> {
        self.show.next_sequence().map(Path::to_path_buf)
    }

    /// Plays one sequence end to end: load, start audio, tick until audio
    /// stops, flush a reset frame, then reset per-sequence state
    /// (`player_start`).
    pub fn start(&mut self, sequence_path: &Path, time_correction_ms: u32) -> Result<()> {
        let (sequence, audio_hint) = loader::load(sequence_path)?;
        let step_time_ms = sequence.step_time_ms;
        debug!(
            "loaded {sequence_path:?}: step_time_ms={step_time_ms}, frame_count={}, channels={}",
            sequence.frame_count,
            sequence.channels.len()
        );

        self.channels = sequence.channels;
        self.state = OutputState::new(self.channels.len());

        let audio_path = loader::resolve_audio_path(sequence_path, &audio_hint);
        debug!("resolved audio path {audio_path:?}");
        self.audio.load(&audio_path)?;
        self.audio.play()?;

        let mut interval = Interval::new(Duration::from_millis(u64::from(step_time_ms)));
        let mut tick = time_correction_ms / step_time_ms;

        // Reset the initial output state; otherwise channels left active by
        // a previous sequence would still be driving the controllers.
        self.flush_reset_frame(step_time_ms)?;

        loop {
            interval.wake();

            minify_frame(&mut self.buffer, &self.channels, &mut self.state, tick)?;
            encoder::encode_heartbeat_frame(&mut self.buffer, tick, step_time_ms);

            self.write_tick(step_time_ms)?;

            tick += 1;

            // Defer to the audio engine's own state rather than the
            // sequence's frame_count, so playback length always matches
            // what's actually audible.
            if !self.audio.is_playing() {
                break;
            }

            interval.sleep();
        }

        self.flush_reset_frame(step_time_ms)?;
        debug!("sequence {sequence_path:?} finished after {tick} ticks");

        self.channels.reset();
        self.state.reset();
        self.buffer.free();

        Ok(())
    }

    fn flush_reset_frame(&mut self, step_time_ms: u32) -> Result<()> {
        encoder::encode_reset_frame(&mut self.buffer);
        self.write_tick(step_time_ms)
    }

    /// Writes the tick's accumulated bytes to the transport, bounded by half
    /// a tick period, then clears the buffer for the next tick.
    fn write_tick(&mut self, step_time_ms: u32) -> Result<()> {
        let timeout = Duration::from_millis(u64::from(step_time_ms) / 2);
        self.transport.write_timeout(self.buffer.as_slice(), timeout)?;
        self.buffer.reset();
        Ok(())
    }

    /// Releases the player's collaborators. `A`/`T`'s own `Drop` impls do
    /// the actual teardown (audio buffer/source, open port); this just
    /// makes the release point explicit at the call site, matching
    /// `player_free`'s shape without needing manual resource bookkeeping.
    pub fn free(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullSource;
    use crate::transport::NullTransport;
    use std::io::Write;

    fn write_lms(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".lms").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SINGLE_ON_EFFECT: &str = r#"<?xml version="1.0"?>
<sequence musicFilename="song.mp3">
  <channels>
    <channel unit="1" circuit="1">
      <effect type="intensity" intensity="100" startCentisecond="0" endCentisecond="100"/>
    </channel>
  </channels>
  <tracks>
    <track totalCentiseconds="100"/>
  </tracks>
</sequence>
"#;

    fn write_show(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", lines.join("\n")).unwrap();
        file
    }

    #[test]
    fn init_rejects_empty_show() {
        let show_file = write_show(&[]);
        let err = Player::init(
            NullSource::default(),
            NullTransport::default(),
            show_file.path(),
            LoopCount::Finite(1),
        )
        .unwrap_err();
        assert!(matches!(err, crate::error::Error::EmptyShow { .. }));
    }

    #[test]
    fn start_writes_reset_tick_reset() {
        let sequence_file = write_lms(SINGLE_ON_EFFECT);
        let show_file = write_show(&[sequence_file.path().to_str().unwrap()]);

        let mut player = Player::init(
            NullSource::playing_for_ticks(0),
            NullTransport::default(),
            show_file.path(),
            LoopCount::Finite(1),
        )
        .unwrap();

        let path = player.next_sequence().unwrap();
        player.start(&path, 0).unwrap();

        // initial reset, one tick's payload, final reset.
        assert_eq!(player.transport.writes.len(), 3);
        assert!(!player.transport.writes[1].is_empty());
    }

    #[test]
    fn show_exhausts_after_configured_loop_count() {
        let sequence_file = write_lms(SINGLE_ON_EFFECT);
        let show_file = write_show(&[sequence_file.path().to_str().unwrap()]);

        let mut player = Player::init(
            NullSource::default(),
            NullTransport::default(),
            show_file.path(),
            LoopCount::Finite(2),
        )
        .unwrap();

        assert!(player.next_sequence().is_some());
        assert!(player.next_sequence().is_some());
        assert!(player.next_sequence().is_none());
    }
}

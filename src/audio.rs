//! Audio playback collaborator.
//!
//! The original wraps OpenAL/ALUT directly in `player/audio.c`
//! (`alGenSources`, `alutCreateBufferFromFile`, `alSourcePlay`,
//! `alGetSourcei(AL_SOURCE_STATE)`). This crate uses `rodio` for the same
//! decode-and-play shape, the pattern the pack's `dividebysandwich-rusty-pipes`
//! also builds on (`cpal`+`rodio` alongside `quick-xml`).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use crate::error::{Error, Result};

/// The player's view of "something that plays audio files and can report
/// whether it's still going". Generic over this trait so `player::Player`
/// can be driven by `NullSource` in tests without a real sound device.
pub trait AudioSource {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn is_playing(&self) -> bool;
}

/// Real playback backend: decodes via `rodio::Decoder` and drives a
/// `rodio::Sink`.
pub struct Player {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    sink: Option<Sink>,
}

impl Player {
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| Error::Audio(e.to_string()))?;
        Ok(Self {
            _stream: stream,
            handle,
            sink: None,
        })
    }
}

impl AudioSource for Player {
    fn load(&mut self, path: &Path) -> Result<()> {
        let file = File::open(path).map_err(Error::System)?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| Error::Audio(e.to_string()))?;
        let sink = Sink::try_new(&self.handle).map_err(|e| Error::Audio(e.to_string()))?;
        sink.append(decoder);
        sink.pause();
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(Error::Audio("no audio loaded".into())),
        }
    }

    fn is_playing(&self) -> bool {
        match &self.sink {
            Some(sink) => !sink.empty() && !sink.is_paused(),
            None => false,
        }
    }
}

/// A test double that tracks play/stop state without touching any audio
/// device, the seam `player::Player`'s generic parameter exists for.
#[derive(Debug, Default)]
pub struct NullSource {
    loaded: bool,
    playing: bool,
    /// When set, counts down the remaining `true` results from `is_playing`
    /// instead of following `playing`, so a tick loop driven by this source
    /// stops after a known number of checks.
    remaining_ticks: std::cell::Cell<Option<u32>>,
}

impl AudioSource for NullSource {
    fn load(&mut self, _path: &Path) -> Result<()> {
        self.loaded = true;
        self.playing = false;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if !self.loaded {
            return Err(Error::Audio("no audio loaded".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        match self.remaining_ticks.get() {
            Some(0) => false,
            Some(n) => {
                self.remaining_ticks.set(Some(n - 1));
                true
            }
            None => self.playing,
        }
    }
}

impl NullSource {
    /// Lets tests simulate the audio finishing on its own.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// Builds a source that reports `is_playing() == true` for exactly
    /// `ticks` checks after `play()`, then `false` — lets a test drive a
    /// bounded tick loop without polling a real clock.
    pub fn playing_for_ticks(ticks: u32) -> Self {
        Self {
            loaded: false,
            playing: false,
            remaining_ticks: std::cell::Cell::new(Some(ticks)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn null_source_requires_load_before_play() {
        let mut src = NullSource::default();
        assert!(src.play().is_err());
        src.load(&PathBuf::from("x.mp3")).unwrap();
        src.play().unwrap();
        assert!(src.is_playing());
    }

    #[test]
    fn null_source_stop_reports_not_playing() {
        let mut src = NullSource::default();
        src.load(&PathBuf::from("x.mp3")).unwrap();
        src.play().unwrap();
        src.stop();
        assert!(!src.is_playing());
    }
}

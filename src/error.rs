//! Typed error taxonomy for the player core.
//!
//! Every distinct failure mode gets its own variant here rather than being
//! collapsed to a generic code or a bare string, so callers can match on
//! what actually went wrong.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("system error: {0}")]
    System(#[from] std::io::Error),

    #[error("audio error: {0}")]
    Audio(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("sequence {path:?} has no frames (frame_count = 0)")]
    NoFrames { path: PathBuf },

    #[error("sequence {path:?} has no channels")]
    NoChannels { path: PathBuf },

    #[error("show file {path:?} is empty")]
    EmptyShow { path: PathBuf },

    #[error("sequence path {path:?} has no file extension")]
    BadExt { path: PathBuf },

    #[error("sequence path {path:?} has unsupported extension {ext:?} (only .lms is supported)")]
    UnsupportedExt { path: PathBuf, ext: String },

    #[error("malformed score data in {path:?}: {reason}")]
    MalformedData { path: PathBuf, reason: String },

    #[error("unsupported score data in {path:?}: {reason}")]
    UnsupportedData { path: PathBuf, reason: String },

    #[error("primitive emitter wrote {written} bytes, exceeding the 16-byte ceiling")]
    BlobTooSmall { written: usize },

    #[error("encoder received an unsupported or empty action")]
    UnsupportedAction,

    #[error("minifier left unconsumed pending data for channel index {index} at tick {tick}")]
    UnconsumedData { index: usize, tick: u32 },

    #[error("channel frame buffer write index {index} out of bounds (capacity {capacity})")]
    WriteIndex { index: usize, capacity: usize },

    #[error("channel table is full (capacity {capacity})")]
    ChannelTableFull { capacity: usize },

    #[error("allocation failure growing channel frame buffer")]
    AllocFailure,
}

pub type Result<T> = std::result::Result<T, Error>;

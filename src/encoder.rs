//! Wraps the wire primitives (`wire`) with frame-level dispatch and buffer
//! management, matching `encode_frame`/`encode_heartbeat_frame`/
//! `encode_reset_frame` in
//! `examples/original_source/src/lorinterface/encode.c`.

use crate::buffer::OutputBuffer;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::wire::{self, ChannelAddress, SimpleAction};

/// Encodes `frame` for `(unit, address)` into `buf`. `Frame::Empty` has
/// nothing to encode and is a caller bug (the minifier never passes one
/// through) — returns `Error::UnsupportedAction`.
pub fn encode_frame(
    buf: &mut OutputBuffer,
    unit: u8,
    address: ChannelAddress,
    frame: Frame,
) -> Result<()> {
    let mut scratch = Vec::with_capacity(wire::MAX_MESSAGE_LEN);
    match frame {
        Frame::Empty => return Err(Error::UnsupportedAction),
        Frame::SetBrightness { level } => {
            wire::channel_set_brightness(&mut scratch, unit, address, level)
        }
        Frame::Fade {
            from,
            to,
            duration_half_seconds,
        } => wire::channel_fade(&mut scratch, unit, address, from, to, duration_half_seconds),
        Frame::On => wire::channel_action(&mut scratch, unit, address, SimpleAction::On),
        Frame::Shimmer => wire::channel_action(&mut scratch, unit, address, SimpleAction::Shimmer),
        Frame::Twinkle => wire::channel_action(&mut scratch, unit, address, SimpleAction::Twinkle),
    }

    if scratch.len() > wire::MAX_MESSAGE_LEN {
        return Err(Error::BlobTooSmall {
            written: scratch.len(),
        });
    }

    buf.append(&scratch);
    Ok(())
}

/// Emits a heartbeat frame if `frame_index` falls on a 500ms boundary given
/// `step_time_ms`, matching `frame_index % (500 / step_time_ms) == 0`.
pub fn encode_heartbeat_frame(buf: &mut OutputBuffer, frame_index: u32, step_time_ms: u32) {
    if step_time_ms == 0 {
        return;
    }
    let period = (500 / step_time_ms).max(1);
    if frame_index % period == 0 {
        let mut scratch = Vec::with_capacity(2);
        wire::heartbeat(&mut scratch);
        buf.append(&scratch);
    }
}

/// Emits the broadcast all-units-off reset frame used at start/end of a show
/// and between sequences.
pub fn encode_reset_frame(buf: &mut OutputBuffer) {
    let mut scratch = Vec::with_capacity(wire::MAX_MESSAGE_LEN);
    wire::unit_action_off(&mut scratch, wire::UNIT_BROADCAST);
    buf.append(&scratch);
}

//! Byte-level LOR message primitives.
//!
//! The original player links against `liblightorama`, a closed-source
//! external library that only `examples/original_source/src/lorinterface/encode.c`
//! calls into (`lor_write_channel_set_brightness`, `lor_write_channel_fade`,
//! `lor_write_unit_action`, `lor_brightness_curve_squared`, ...). Its exact wire
//! bytes live outside the filtered source tree, so this module reimplements
//! the primitive emitter from scratch, matching only the calling behavior
//! `encode.c` exercises: one sync byte, a command byte, addressing bytes, and
//! a payload, never more than `MAX_MESSAGE_LEN` bytes per call.

/// No single emitted message may exceed this many bytes.
pub const MAX_MESSAGE_LEN: usize = 16;

/// Broadcast unit address, used for the all-units reset frame.
pub const UNIT_BROADCAST: u8 = 0xFF;

const SYNC: u8 = 0x00;

#[repr(u8)]
enum Command {
    SetBrightness = 0x01,
    Fade = 0x02,
    On = 0x03,
    Shimmer = 0x04,
    Twinkle = 0x05,
    UnitOff = 0x10,
    Heartbeat = 0xFE,
}

/// How a single wire message addresses channels on a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAddress {
    /// One specific circuit.
    Single(u8),
    /// Circuits 0..8 selected by bit (bit `i` is circuit `i`).
    Mask8 { mask: u8 },
    /// Circuits 0..16 selected by bit (bit `i` is circuit `i`).
    Mask16 { mask: u16 },
}

/// Squares the normalized brightness, matching `lor_brightness_curve_squared`
/// — perceived brightness scales roughly with the square of duty cycle.
pub fn brightness_curve_squared(level: u8) -> u8 {
    let normalized = f32::from(level) / 255.0;
    let curved = normalized * normalized;
    (curved * 255.0).round() as u8
}

/// Encodes a fade duration, given in tenths of a second, into the
/// half-second units the wire format uses, clamped to a single byte.
pub fn duration_to_half_seconds(tenths_of_second: u32) -> u8 {
    let half_seconds = tenths_of_second / 5;
    half_seconds.min(u8::MAX as u32) as u8
}

fn write_header(out: &mut Vec<u8>, command: Command, unit: u8) {
    out.push(SYNC);
    out.push(command as u8);
    out.push(unit);
}

fn write_address(out: &mut Vec<u8>, address: ChannelAddress) {
    match address {
        ChannelAddress::Single(circuit) => {
            out.push(0x01);
            out.push(circuit);
        }
        ChannelAddress::Mask8 { mask } => {
            out.push(0x08);
            out.push(mask);
        }
        ChannelAddress::Mask16 { mask } => {
            out.push(0x10);
            out.push((mask & 0xFF) as u8);
            out.push((mask >> 8) as u8);
        }
    }
}

/// Emits a `SET_BRIGHTNESS` message for the given unit/address.
pub fn channel_set_brightness(out: &mut Vec<u8>, unit: u8, address: ChannelAddress, level: u8) {
    write_header(out, Command::SetBrightness, unit);
    write_address(out, address);
    out.push(brightness_curve_squared(level));
}

/// Emits a `FADE` message for the given unit/address.
pub fn channel_fade(
    out: &mut Vec<u8>,
    unit: u8,
    address: ChannelAddress,
    from: u8,
    to: u8,
    duration_half_seconds: u8,
) {
    write_header(out, Command::Fade, unit);
    write_address(out, address);
    out.push(brightness_curve_squared(from));
    out.push(brightness_curve_squared(to));
    out.push(duration_half_seconds);
}

/// A non-brightness, non-fade channel action: on, shimmer, or twinkle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleAction {
    On,
    Shimmer,
    Twinkle,
}

/// Emits an `ON`/`SHIMMER`/`TWINKLE` message for the given unit/address.
pub fn channel_action(out: &mut Vec<u8>, unit: u8, address: ChannelAddress, action: SimpleAction) {
    let command = match action {
        SimpleAction::On => Command::On,
        SimpleAction::Shimmer => Command::Shimmer,
        SimpleAction::Twinkle => Command::Twinkle,
    };
    write_header(out, command, unit);
    write_address(out, address);
}

/// Emits a whole-unit action (currently only `UNIT_OFF`), used for the
/// broadcast reset frame.
pub fn unit_action_off(out: &mut Vec<u8>, unit: u8) {
    write_header(out, Command::UnitOff, unit);
}

/// Emits the periodic heartbeat frame that keeps controllers from timing out.
pub fn heartbeat(out: &mut Vec<u8>) {
    out.push(SYNC);
    out.push(Command::Heartbeat as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_curve_is_monotonic_and_bounded() {
        assert_eq!(brightness_curve_squared(0), 0);
        assert_eq!(brightness_curve_squared(255), 255);
        let mut prev = 0;
        for level in (0..=255).step_by(17) {
            let cur = brightness_curve_squared(level);
            assert!(cur >= prev);
            prev = cur;
        }
    }

    #[test]
    fn messages_never_exceed_max_length() {
        let mut out = Vec::new();
        channel_fade(&mut out, 1, ChannelAddress::Mask16 { mask: 0xFFFF }, 0, 255, 10);
        assert!(out.len() <= MAX_MESSAGE_LEN);
    }

    #[test]
    fn heartbeat_is_two_bytes() {
        let mut out = Vec::new();
        heartbeat(&mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn duration_clamps_to_u8() {
        assert_eq!(duration_to_half_seconds(10), 2);
        assert_eq!(duration_to_half_seconds(100_000), u8::MAX);
    }
}

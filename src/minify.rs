//! Per-tick diffing and per-unit bitmask grouping, reducing wire bytes by
//! only sending what changed and coalescing identical values onto one
//! message where the addressing allows it.
//!
//! Ported from `minify_frame`/`minify_unit`/
//! `minify_write_frames_optimized`/`minify_write_frames_unoptimized`/
//! `minify_channels_fit_bitmask` in
//! `examples/original_source/src/lorinterface/minify.c`.

use std::collections::BTreeMap;

use crate::buffer::OutputBuffer;
use crate::channel::ChannelTable;
use crate::encoder::encode_frame;
use crate::error::{Error, Result};
use crate::frame::{EqualsMode, Frame};
use crate::output_state::OutputState;
use crate::wire::ChannelAddress;

/// A bitmask message can only ever address circuits `0..MASK_SPAN` (mirrors
/// `sizeof(lor_channel_t) * 8` in the original, one bit per circuit id).
const MASK_SPAN: u8 = 16;

struct Entry {
    index: usize,
    unit: u8,
    circuit: u8,
}

/// Diffs every channel in `table` against `state` at `tick`, writing the
/// minimal set of wire messages into `buf`, then commits the new values into
/// `state` for the next tick's diff.
pub fn minify_frame(
    buf: &mut OutputBuffer,
    table: &ChannelTable,
    state: &mut OutputState,
    tick: u32,
) -> Result<()> {
    let channels: Vec<_> = table.iter().collect();

    let mut entries: Vec<Entry> = channels
        .iter()
        .enumerate()
        .map(|(index, channel)| Entry {
            index,
            unit: channel.unit,
            circuit: channel.circuit,
        })
        .collect();
    entries.sort_by_key(|e| (e.unit, e.circuit));

    // upcoming[i] indexed by the *original* channel-table index, matching
    // state's indexing.
    let upcoming: Vec<Frame> = channels.iter().map(|c| c.get(tick)).collect();

    let mut start = 0;
    while start < entries.len() {
        let mut end = start + 1;
        while end < entries.len() && entries[end].unit == entries[start].unit {
            end += 1;
        }
        minify_unit(buf, state, &entries[start..end], &upcoming, tick)?;
        start = end;
    }

    Ok(())
}

fn minify_unit(
    buf: &mut OutputBuffer,
    state: &mut OutputState,
    group: &[Entry],
    upcoming: &[Frame],
    tick: u32,
) -> Result<()> {
    let changed: Vec<&Entry> = group
        .iter()
        .filter(|e| {
            let up = upcoming[e.index];
            up.is_set() && !Frame::equals(state.last_sent(e.index), up, EqualsMode::Strict)
        })
        .collect();

    if changed.is_empty() {
        for entry in group {
            state.commit(entry.index, upcoming[entry.index]);
        }
        return Ok(());
    }

    for entry in &changed {
        state.set_pending(entry.index, upcoming[entry.index]);
    }

    if group_is_mask_eligible(group) {
        write_frames_optimized(buf, state, &changed, group[0].unit)?;
    } else {
        write_frames_unoptimized(buf, state, &changed, group[0].unit)?;
    }

    for entry in &changed {
        if state.pending(entry.index).is_set() {
            return Err(Error::UnconsumedData {
                index: entry.index,
                tick,
            });
        }
    }

    for entry in group {
        state.commit(entry.index, upcoming[entry.index]);
    }

    Ok(())
}

/// `|group| <= MASK_SPAN` and every circuit in the group is addressable by
/// bit — checked against the whole group, not just the
/// changed subset.
fn group_is_mask_eligible(group: &[Entry]) -> bool {
    group.len() <= usize::from(MASK_SPAN) && group.iter().all(|e| e.circuit < MASK_SPAN)
}

/// Coalesce changed channels sharing a Value-equal pending frame into one
/// bitmask message each. Mask bits address circuits directly
/// (bit `i` is circuit `i`), matching `1u << other_channel.circuit` in the
/// original — there is no base-circuit offset.
fn write_frames_optimized(
    buf: &mut OutputBuffer,
    state: &mut OutputState,
    changed: &[&Entry],
    unit: u8,
) -> Result<()> {
    let mut groups: BTreeMap<FrameKey, Vec<&Entry>> = BTreeMap::new();
    for &entry in changed {
        let pending = state.pending(entry.index);
        groups.entry(FrameKey(pending)).or_default().push(entry);
    }

    for (key, members) in groups {
        let frame = key.0;
        let mut mask: u32 = 0;
        for m in &members {
            mask |= 1u32 << m.circuit;
        }

        let address = if mask <= u32::from(u8::MAX) {
            ChannelAddress::Mask8 { mask: mask as u8 }
        } else {
            ChannelAddress::Mask16 { mask: mask as u16 }
        };

        encode_frame(buf, unit, address, frame)?;

        for m in &members {
            state.clear_pending(m.index);
        }
    }

    Ok(())
}

fn write_frames_unoptimized(
    buf: &mut OutputBuffer,
    state: &mut OutputState,
    changed: &[&Entry],
    unit: u8,
) -> Result<()> {
    for entry in changed {
        let pending = state.pending(entry.index);
        encode_frame(buf, unit, ChannelAddress::Single(entry.circuit), pending)?;
        state.clear_pending(entry.index);
    }
    Ok(())
}

/// Wraps a `Frame` so it can key a `BTreeMap`, grouping under
/// value-equality — two fades with the same from/to/duration coalesce.
#[derive(Clone, Copy)]
struct FrameKey(Frame);

impl PartialEq for FrameKey {
    fn eq(&self, other: &Self) -> bool {
        Frame::equals(self.0, other.0, EqualsMode::Value)
    }
}
impl Eq for FrameKey {}

impl Ord for FrameKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        fn rank(f: Frame) -> u8 {
            match f {
                Frame::Empty => 0,
                Frame::On => 1,
                Frame::Shimmer => 2,
                Frame::Twinkle => 3,
                Frame::SetBrightness { .. } => 4,
                Frame::Fade { .. } => 5,
            }
        }
        fn bytes(f: Frame) -> (u8, u8, u8) {
            match f {
                Frame::SetBrightness { level } => (level, 0, 0),
                Frame::Fade {
                    from,
                    to,
                    duration_half_seconds,
                } => (from, to, duration_half_seconds),
                _ => (0, 0, 0),
            }
        }
        rank(self.0)
            .cmp(&rank(other.0))
            .then_with(|| bytes(self.0).cmp(&bytes(other.0)))
    }
}
impl PartialOrd for FrameKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelTable;

    fn table_with(channels: &[(u8, u8)]) -> ChannelTable {
        let mut table = ChannelTable::new();
        for &(unit, circuit) in channels {
            table.get_or_insert(unit, circuit).unwrap();
        }
        table
    }

    #[test]
    fn unchanged_channels_emit_nothing() {
        let table = table_with(&[(1, 1)]);
        let mut state = OutputState::new(1);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn single_channel_change_emits_one_message() {
        let mut table = table_with(&[(1, 1)]);
        table.get_or_insert(1, 1).unwrap().set(0, Frame::On).unwrap();
        let mut state = OutputState::new(1);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        assert!(!buf.is_empty());
        assert_eq!(state.last_sent(0), Frame::On);
        assert_eq!(state.pending(0), Frame::Empty);
    }

    #[test]
    fn fade_reemits_every_tick_it_is_scheduled() {
        let mut table = table_with(&[(1, 1)]);
        let fade = Frame::Fade {
            from: 0,
            to: 255,
            duration_half_seconds: 4,
        };
        table.get_or_insert(1, 1).unwrap().set(0, fade).unwrap();
        table.get_or_insert(1, 1).unwrap().set(1, fade).unwrap();
        let mut state = OutputState::new(1);

        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        assert!(!buf.is_empty());

        buf.reset();
        minify_frame(&mut buf, &table, &mut state, 1).unwrap();
        // Strict inequality bans fades from ever matching their own baseline:
        // every tick the same fade is scheduled, it is re-emitted (P5).
        assert!(!buf.is_empty());
    }

    #[test]
    fn repeated_identical_tick_sends_nothing_on_second_pass() {
        let mut table = table_with(&[(1, 1)]);
        table.get_or_insert(1, 1).unwrap().set(0, Frame::On).unwrap();
        table.get_or_insert(1, 1).unwrap().set(1, Frame::On).unwrap();
        let mut state = OutputState::new(1);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        buf.reset();
        minify_frame(&mut buf, &table, &mut state, 1).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn same_value_group_coalesces_into_one_message() {
        let mut table = table_with(&[(1, 1), (1, 2), (1, 3)]);
        for circuit in 1..=3u8 {
            table
                .get_or_insert(1, circuit)
                .unwrap()
                .set(0, Frame::SetBrightness { level: 128 })
                .unwrap();
        }
        let mut state = OutputState::new(3);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        // One coalesced mask message is far shorter than three singles.
        assert!(buf.len() < 3 * 5);
    }

    #[test]
    fn different_units_get_independent_messages() {
        let mut table = table_with(&[(1, 1), (2, 1)]);
        for unit in [1u8, 2] {
            table
                .get_or_insert(unit, 1)
                .unwrap()
                .set(0, Frame::On)
                .unwrap();
        }
        let mut state = OutputState::new(2);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        // Two separate unit messages, each addressing circuit 0 alone.
        assert_eq!(buf.len(), 2 * 5);
    }

    #[test]
    fn circuit_at_or_above_span_forces_unoptimized_path() {
        let mut table = table_with(&[(1, 16), (1, 17)]);
        for circuit in [16u8, 17] {
            table
                .get_or_insert(1, circuit)
                .unwrap()
                .set(0, Frame::On)
                .unwrap();
        }
        let mut state = OutputState::new(2);
        let mut buf = OutputBuffer::new();
        minify_frame(&mut buf, &table, &mut state, 0).unwrap();
        // Unoptimized path: one SingleChannelId message per changed circuit.
        assert_eq!(buf.len(), 2 * 5);
    }
}

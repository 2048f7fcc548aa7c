//! Sparse per-`(unit, circuit)` action timeline.
//!
//! Each `Channel` stores a dense run of frames starting at `first_tick`, the
//! first tick any effect was scheduled on it — channels that only light up
//! late in a show don't pay for leading `Empty` slots. Ported from the
//! realloc-on-growth array in `channel.c`/`channel.h`; growth here is owned
//! `Vec` resizing instead of manual `realloc`.

use crate::error::{Error, Result};
use crate::frame::Frame;

/// Initial backing capacity for a channel's frame array, in ticks.
const INITIAL_CAPACITY: usize = 512;

/// Build-time ceiling on the number of distinct channels a show can address.
pub const CHANNEL_TABLE_MAX: usize = 128;

/// One addressable dimmer output.
#[derive(Debug, Clone)]
pub struct Channel {
    pub unit: u8,
    pub circuit: u8,
    frames: Vec<Frame>,
    first_tick: Option<u32>,
}

impl Channel {
    fn new(unit: u8, circuit: u8) -> Self {
        Self {
            unit,
            circuit,
            frames: Vec::new(),
            first_tick: None,
        }
    }

    /// Tick `first_tick`, or `None` if nothing has been scheduled yet.
    pub fn first_tick(&self) -> Option<u32> {
        self.first_tick
    }

    /// Look up the frame scheduled at `tick`. Returns `Empty` for any tick
    /// before `first_tick` or past the end of the stored run (I1/P2).
    pub fn get(&self, tick: u32) -> Frame {
        match self.first_tick {
            None => Frame::Empty,
            Some(first) if tick < first => Frame::Empty,
            Some(first) => {
                let offset = (tick - first) as usize;
                self.frames.get(offset).copied().unwrap_or(Frame::Empty)
            }
        }
    }

    /// Record `frame` at `tick`. The first call fixes `first_tick`; later
    /// calls at an earlier tick are rejected (the loader only ever writes
    /// ticks in ascending score order).
    pub fn set(&mut self, tick: u32, frame: Frame) -> Result<()> {
        let first = match self.first_tick {
            None => {
                self.first_tick = Some(tick);
                tick
            }
            Some(first) if tick < first => {
                return Err(Error::WriteIndex {
                    index: tick as usize,
                    capacity: first as usize,
                });
            }
            Some(first) => first,
        };

        let offset = (tick - first) as usize;
        self.ensure_capacity(offset + 1)?;
        self.frames[offset] = frame;
        Ok(())
    }

    fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if self.frames.len() >= needed {
            return Ok(());
        }
        let mut new_len = self.frames.len().max(INITIAL_CAPACITY);
        while new_len < needed {
            new_len = new_len
                .checked_mul(2)
                .ok_or(Error::AllocFailure)?;
        }
        self.frames.resize(new_len, Frame::Empty);
        Ok(())
    }
}

/// A fixed-capacity set of channels, populated by the loader in insertion
/// order.
#[derive(Debug, Clone, Default)]
pub struct ChannelTable {
    channels: Vec<Channel>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    /// Get or create the channel for `(unit, circuit)`, preserving insertion
    /// order and failing once `CHANNEL_TABLE_MAX` is reached.
    pub fn get_or_insert(&mut self, unit: u8, circuit: u8) -> Result<&mut Channel> {
        if let Some(idx) = self
            .channels
            .iter()
            .position(|c| c.unit == unit && c.circuit == circuit)
        {
            return Ok(&mut self.channels[idx]);
        }

        if self.channels.len() >= CHANNEL_TABLE_MAX {
            return Err(Error::ChannelTableFull {
                capacity: CHANNEL_TABLE_MAX,
            });
        }

        self.channels.push(Channel::new(unit, circuit));
        Ok(self.channels.last_mut().expect("just pushed"))
    }

    /// Reset to empty, ready for the next sequence (R2).
    pub fn reset(&mut self) {
        self.channels.clear();
    }
}

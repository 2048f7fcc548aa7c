//! Serial transport to the LOR controller network.
//!
//! Grounded on `examples/original_source/src/main.c`'s `sp_init_port`/
//! `handle_frame_interrupt` (`sp_blocking_write` with a half-tick timeout)
//! wrapping `libserialport`. `serialport` is the idiomatic pure-Rust
//! equivalent — no pack example happens to touch serial I/O, so it's
//! adopted directly as the standard ecosystem crate for the job (see
//! DESIGN.md).

use std::io::Write;
use std::time::Duration;

use crate::error::{Error, Result};

/// Something the player can write a tick's encoded bytes to, within a
/// bounded timeout.
pub trait Transport {
    fn write_timeout(&mut self, bytes: &[u8], timeout: Duration) -> Result<usize>;
}

/// A real RS-232/RS-485 serial connection to a LOR controller chain.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self { port })
    }
}

impl Transport for SerialTransport {
    fn write_timeout(&mut self, bytes: &[u8], timeout: Duration) -> Result<usize> {
        self.port
            .set_timeout(timeout)
            .map_err(|e| Error::Transport(e.to_string()))?;
        self.port
            .write_all(bytes)
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(bytes.len())
    }
}

/// A test double that records every write without touching real hardware.
#[derive(Debug, Default)]
pub struct NullTransport {
    pub writes: Vec<Vec<u8>>,
}

impl Transport for NullTransport {
    fn write_timeout(&mut self, bytes: &[u8], _timeout: Duration) -> Result<usize> {
        self.writes.push(bytes.to_vec());
        Ok(bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_transport_records_every_write() {
        let mut t = NullTransport::default();
        t.write_timeout(&[1, 2, 3], Duration::from_millis(10)).unwrap();
        t.write_timeout(&[4], Duration::from_millis(10)).unwrap();
        assert_eq!(t.writes, vec![vec![1, 2, 3], vec![4]]);
    }
}

//! Runtime configuration, resolved from CLI flags.
//!
//! The original derives its run parameters from `getopt`-style `argv`
//! parsing in `main.c`. This is a flag-driven CLI rather than a GUI with a
//! persisted preferences file, so there's no `config.json` to load or save
//! here — `clap`'s derive API plays the same "typed, validated
//! configuration" role a hand-rolled parser would, matching the `clap` +
//! logging stack used for CLIs elsewhere.

use std::path::PathBuf;

use clap::Parser;

use crate::show::LoopCount;

/// Default baud rate for LOR controller networks.
pub const DEFAULT_BAUD: u32 = 19200;

/// Default show file name, resolved relative to the current working
/// directory.
pub const DEFAULT_SHOW_PATH: &str = "show.txt";

fn parse_loop_count(s: &str) -> std::result::Result<LoopCount, String> {
    LoopCount::parse(s)
}

/// Real-time sequence player for LOR-protocol lighting controller networks.
#[derive(Debug, Parser)]
#[command(name = "lorplay", version, about)]
pub struct RuntimeConfig {
    /// Serial port to write the LOR protocol stream to.
    pub port: String,

    /// Baud rate of the serial connection.
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,

    /// Show file listing one sequence path per line.
    #[arg(short = 'f', long = "show", default_value = DEFAULT_SHOW_PATH)]
    pub show_path: PathBuf,

    /// Start-time correction, in milliseconds.
    #[arg(short = 'c', long = "correction", default_value_t = 0, value_parser = clap::value_parser!(u32).range(0..=65535))]
    pub time_correction_ms: u32,

    /// Loop count: a positive integer, or "i" for infinite.
    #[arg(short = 'l', long = "loop", default_value = "1", value_parser = parse_loop_count)]
    pub loop_count: LoopCount,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        RuntimeConfig::command().debug_assert();
    }

    #[test]
    fn defaults_match_the_documented_cli() {
        let cfg = RuntimeConfig::parse_from(["lorplay", "/dev/ttyUSB0"]);
        assert_eq!(cfg.port, "/dev/ttyUSB0");
        assert_eq!(cfg.baud, DEFAULT_BAUD);
        assert_eq!(cfg.show_path, PathBuf::from(DEFAULT_SHOW_PATH));
        assert_eq!(cfg.time_correction_ms, 0);
        assert_eq!(cfg.loop_count, LoopCount::Finite(1));
    }

    #[test]
    fn loop_flag_accepts_infinite_marker() {
        let cfg = RuntimeConfig::parse_from(["lorplay", "/dev/ttyUSB0", "-l", "i"]);
        assert_eq!(cfg.loop_count, LoopCount::Infinite);
    }

    #[test]
    fn correction_above_range_is_rejected() {
        let result = RuntimeConfig::try_parse_from(["lorplay", "/dev/ttyUSB0", "-c", "70000"]);
        assert!(result.is_err());
    }
}

//! CLI entry point.
//!
//! Parses flags with `clap`, wires the real audio/transport collaborators
//! (`audio::Player`, `transport::SerialTransport`) into `player::Player`,
//! drives the show to completion, and converts the top-level error into the
//! process exit code the original's `main.c` used (0 success, 1 failure).

mod audio;
mod buffer;
mod channel;
mod config;
mod encoder;
mod error;
mod frame;
mod interval;
mod loader;
mod minify;
mod output_state;
mod player;
mod sequence;
mod show;
mod transport;
mod wire;

use clap::Parser;
use log::{error, info};

use audio::Player as AudioPlayer;
use config::RuntimeConfig;
use error::Result;
use player::Player;
use transport::SerialTransport;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RuntimeConfig::parse();

    if let Err(err) = run(config) {
        error!("{err}");
        std::process::exit(1);
    }
}

fn run(config: RuntimeConfig) -> Result<()> {
    info!(
        "opening {} at {} baud, show {:?}",
        config.port, config.baud, config.show_path
    );

    let audio = AudioPlayer::new()?;
    let transport = SerialTransport::open(&config.port, config.baud)?;

    let mut player = Player::init(audio, transport, &config.show_path, config.loop_count)?;

    while let Some(sequence_path) = player.next_sequence() {
        info!("playing {sequence_path:?}");
        player.start(&sequence_path, config.time_correction_ms)?;
    }

    info!("show complete");
    player.free();

    Ok(())
}

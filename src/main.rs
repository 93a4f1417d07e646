// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use padboard::announcer::ConsoleAnnouncer;
use padboard::audio;
use padboard::board::Board;
use padboard::config;
use padboard::controller::{keyboard, Controller};
use padboard::pads::SoundRegistry;
use padboard::sequence::{RunOutcome, SequenceRunner};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sound pad board with remappable trigger keys."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available audio output devices.
    Devices {},
    /// Lists and verifies the pads in the given board config.
    Pads {
        /// The path to the board config.
        config_path: String,
    },
    /// Plays a sequence of trigger letters once and exits.
    Play {
        /// The path to the board config.
        config_path: String,
        /// The letters to play, e.g. "asdf". Letters not bound to a pad are dropped.
        sequence: String,
    },
    /// Start will start the board, reading commands from stdin.
    Start {
        /// The path to the board config.
        config_path: String,
    },
}

/// Loads the board config and resolves its pads relative to the config file.
fn load_registry(config_path: &str) -> Result<(config::Board, SoundRegistry), Box<dyn Error>> {
    let path = PathBuf::from(config_path);
    let board_config = config::Board::deserialize(&path)?;
    let base_path = path.parent().unwrap_or(Path::new("."));
    let registry = SoundRegistry::new(board_config.pad_definitions(base_path)?)?;
    Ok((board_config, registry))
}

/// Opens the audio device and builds the shared board.
fn init_board(config_path: &str) -> Result<(config::Board, Arc<Board>), Box<dyn Error>> {
    let (board_config, registry) = load_registry(config_path)?;
    let device = audio::get_device(board_config.audio(), registry.pads())?;
    let board = Board::new(registry, device, Arc::new(ConsoleAnnouncer::new()));
    Ok((board_config, Arc::new(board)))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Pads { config_path } => {
            let (_, registry) = load_registry(&config_path)?;

            println!("{}", registry.mapping_text());
            println!("Pads (count: {}):", registry.len());
            let mut missing = 0;
            for pad in registry.pads() {
                if pad.source().path().is_file() {
                    println!("- {}", pad);
                } else {
                    missing += 1;
                    println!("- {} MISSING", pad);
                }
            }

            if missing > 0 {
                return Err(format!("{} sound file(s) missing", missing).into());
            }
        }
        Commands::Play {
            config_path,
            sequence,
        } => {
            let (board_config, board) = init_board(&config_path)?;
            let runner = SequenceRunner::new(board, board_config.step_duration()?);

            let normalized = runner.normalize(&sequence);
            if runner.run(&normalized).await? == RunOutcome::Empty {
                println!("Nothing to play: no letters in {:?} are bound to a pad.", sequence);
            }
        }
        Commands::Start { config_path } => {
            let (board_config, board) = init_board(&config_path)?;
            let mut controller = Controller::new(
                board,
                board_config.step_duration()?,
                Arc::new(keyboard::Driver::new()),
            );

            controller.join().await?;
        }
    };

    Ok(())
}

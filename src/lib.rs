pub mod cli;
pub mod game;
pub mod host;

use std::fs;
use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use simplelog::{Config, LevelFilter, WriteLogger};

use cli::Cli;
use game::state::GameState;
use host::StdioHost;

/// The interpreter's own version, as reported to hosts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The interpreter version broken into its components, plus the Unix
/// time the binary was built (stamped by the build script).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub subminor: u32,
    pub timestamp: u64,
}

impl Version {
    pub fn current() -> Version {
        Version {
            major: env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0),
            minor: env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0),
            subminor: env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0),
            timestamp: env!("BUILD_TIMESTAMP").parse().unwrap_or(0),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let log_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("zinnia.log")
        .context("Couldn't prepare log file")?;

    let log_level = if cli.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    WriteLogger::init(log_level, Config::default(), log_file)
        .context("Couldn't start logger")?;

    let game_file = fs::read(&cli.game_file).context("Couldn't open story file")?;

    let save_path = PathBuf::from(&cli.game_file).with_extension("sav");
    let mut host = StdioHost::new(save_path);

    let mut game_state =
        GameState::new(game_file).context("Error loading story file")?;

    game_state.run(&mut host)
}

//! # Steno Stick
//!
//! Write steno chords with a game controller.
//!
//! Reads every connected gamepad (or the one named in the configuration),
//! recognizes stick gestures, trigger pulls, button chords and hat pushes,
//! and writes each completed stroke to stdout or a file.
//!
//! # Usage
//!
//! ```bash
//! steno-stick                      # config/default.toml, or built-in defaults
//! steno-stick /etc/steno-stick.toml
//! RUST_LOG=steno_stick=debug steno-stick
//! ```
//!
//! Expected output:
//! ```text
//! INFO steno_stick: Steno Stick v0.1.0 starting...
//! INFO steno_stick::controller::gamepad: Found gamepad 0 at /dev/input/event20 (Xbox Wireless Controller)
//! INFO steno_stick: Listening on 1 device(s), press Ctrl+C to exit
//! TW
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use steno_stick::config::Config;
use steno_stick::controller::gamepad::Gamepad;
use steno_stick::controller::mapper::EventMapper;
use steno_stick::grammar::{self, Mapping};
use steno_stick::output;
use steno_stick::session::Session;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Prefix of the daily rolling log files
const LOG_FILE_PREFIX: &str = "steno-stick.log";

/// Main entry point for Steno Stick
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration and set up logging
///    - Load the mapping (built-in unless a file is configured)
///    - Open gamepads and start one reader thread per pad
///
/// 2. **Main Loop**
///    - Route device events to per-device engines
///    - Write every completed stroke
///
/// 3. **Shutdown**
///    - On Ctrl+C, or once every pad is gone
///    - Unfinished strokes are discarded
///
/// # Errors
///
/// Returns error if:
/// - The configuration file is invalid
/// - The mapping or output file cannot be opened
/// - No gamepad is found
#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config(std::env::args_os().nth(1).map(PathBuf::from))?;
    let _log_guard = init_logging(config.log_dir().as_deref())?;

    info!("Steno Stick v{} starting...", env!("CARGO_PKG_VERSION"));

    let mapping = Arc::new(load_mapping(config.mapping_path().as_deref())?);
    info!(
        "Mapping has {} stick(s), {} trigger(s), {} chord rule(s), {} gesture rule(s)",
        mapping.sticks().len(),
        mapping.triggers().len(),
        mapping.unordered_mappings().len(),
        mapping.ordered_mappings().len()
    );

    let pads = Gamepad::open_all(config.device_path().as_deref()).context("No usable gamepad")?;
    let pad_count = pads.len();

    let (tx, rx) = mpsc::channel(config.device.channel_capacity);
    let mut readers = Vec::with_capacity(pad_count);
    for pad in pads {
        let mapper = EventMapper::for_device(pad.device(), &mapping, config.device.trigger_dead_zone)
            .with_context(|| format!("Failed to read axis ranges of {}", pad.device_path().display()))?;
        readers.push(pad.spawn_reader(mapper, tx.clone())?);
    }
    // The channel closes once every reader has exited
    drop(tx);

    let sink = output::open(config.output.format, config.output_path().as_deref())
        .context("Failed to open stroke output")?;
    let session = Session::new(Arc::clone(&mapping), config.engine_settings(), sink);

    info!("Listening on {} device(s), press Ctrl+C to exit", pad_count);

    let session = session
        .run(rx, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Total strokes written: {}", session.strokes_sent());

    // Readers blocked in fetch_events exit with the process
    drop(readers);
    Ok(())
}

/// Loads the configuration at `path`, or the default file.
///
/// A missing default file is not an error; an explicitly named one is.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load configuration from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Installs the tracing subscriber, with a daily log file when `dir` is set.
fn init_logging(dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    // Strokes may go to stdout, so logs go to stderr
    let console = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let Some(dir) = dir else {
        tracing_subscriber::registry().with(filter).with(console).init();
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();
    Ok(Some(guard))
}

/// Loads the mapping file, or the built-in mapping.
fn load_mapping(path: Option<&Path>) -> Result<Mapping> {
    let Some(path) = path else {
        info!("Using built-in mapping");
        return Ok(Mapping::builtin());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read mapping {}", path.display()))?;
    let outcome = grammar::parse(&text);
    if !outcome.diagnostics.is_empty() {
        warn!(
            "Skipped {} unrecognized line(s) in {}",
            outcome.diagnostics.len(),
            path.display()
        );
    }
    info!("Loaded mapping from {}", path.display());
    Ok(outcome.mapping)
}

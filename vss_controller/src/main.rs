//! # VSS
//!
//! Vacuum safety system daemon. Loads one TOML configuration, validates it
//! (fail closed), wires the relay and reset-button handlers to the selected
//! I/O driver and then heartbeats until SIGINT/SIGTERM.

use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use vss_common::config::{GeneralConfig, VssConfig};
use vss_controller::bootstrap::{self, Bootstrap};
use vss_controller::error::StartupError;
use vss_controller::supervisor::{Finalizer, ShutdownSignal, Supervisor};
use vss_hal::DriverRegistry;

#[cfg(feature = "gpio")]
const DEFAULT_DRIVER: &str = "rpi";
#[cfg(not(feature = "gpio"))]
const DEFAULT_DRIVER: &str = "simulation";

/// VSS: vacuum safety interlock
#[derive(Parser, Debug)]
#[command(name = "vss")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Cuts power on vacuum over-pressure and alerts the operators")]
struct Args {
    /// Path to the configuration TOML.
    #[arg(short, long, default_value = "config/vss.toml")]
    config: PathBuf,

    /// I/O driver name.
    #[arg(long, default_value = DEFAULT_DRIVER)]
    driver: String,

    /// Shorthand for `--driver simulation`.
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,

    /// Also write logs to this file (overrides `[general] log_file`).
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Validate the configuration and exit without touching hardware.
    /// With `--json` the report is also printed to stdout.
    #[arg(long)]
    check: bool,
}

fn main() {
    let args = Args::parse();
    let config = VssConfig::from_file(&args.config);

    if let Err(e) = setup_tracing(&args, config.as_ref().ok().map(|c| &c.general)) {
        eprintln!("Cannot set up logging: {e}");
        process::exit(1);
    }

    info!("VSS v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {}: {e}", args.config.display());
            process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("VSS shutdown complete");
}

fn run(args: &Args, config: &VssConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.check {
        let report = bootstrap::validate(config);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        if !report.is_empty() {
            return Err(StartupError::Configuration(report).into());
        }
        info!("Configuration OK");
        return Ok(());
    }

    // Setup signal handler for graceful shutdown. Installed before any
    // channel is claimed; a signal during startup stops the loop at once.
    let signal = Arc::new(ShutdownSignal::new());
    let s = Arc::clone(&signal);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        s.trigger();
    })?;

    let driver = if args.simulate {
        "simulation"
    } else {
        args.driver.as_str()
    };
    let drivers = DriverRegistry::with_builtin_drivers();
    info!("Available drivers: {:?}", drivers.list_drivers());
    let io = drivers.create_driver(driver)?;
    info!("Using '{}' I/O driver", io.name());

    let controller = Bootstrap::new(config, io).run()?;
    let mut finalizer = Finalizer::new(Arc::clone(&controller));

    let heartbeat = Duration::from_secs(config.general.heartbeat_secs);
    Supervisor::new(heartbeat, signal).run();

    info!(state = %controller.state(), "Stopping");
    finalizer.run();
    Ok(())
}

/// Setup tracing subscriber from CLI arguments and `[general]`.
fn setup_tracing(args: &Args, general: Option<&GeneralConfig>) -> std::io::Result<()> {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        general.map_or(Level::INFO, |g| g.log_level.into())
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let log_file = args
        .log_file
        .as_deref()
        .or_else(|| general.and_then(|g| g.log_file.as_deref()));
    let file_layer = log_file
        .map(open_log_file)
        .transpose()?
        .map(|file| fmt::layer().with_ansi(false).with_writer(Mutex::new(file)));

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    if args.json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
    Ok(())
}

fn open_log_file(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

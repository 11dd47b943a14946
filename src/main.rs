mod combo;
mod config;
mod consts;
mod devices;
mod dispatch;
mod error;
mod exec;
mod idle;
mod names;
mod triggers;

use crate::{
    consts::DEFAULT_TICK_SECS,
    devices::DeviceSet,
    dispatch::{Dispatcher, Mode},
    exec::ShellExecutor,
    triggers::TriggerTables,
};
use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{Receiver, bounded};
use log::{debug, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::PathBuf;
use std::thread;

/// Run shell commands on key combinations, switch changes and idle time.
#[derive(Parser, Debug)]
#[command(name = "evhook")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print recognized combinations and switch states without running anything
    #[arg(short, long, conflicts_with_all = ["list", "config"])]
    monitor: bool,

    /// List input devices and exit
    #[arg(short, long, conflicts_with = "config")]
    list: bool,

    /// Configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug logging, and keep the output of started commands
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list {
        return devices::list_devices();
    }

    let shutdown = shutdown_channel()?;

    if args.monitor {
        monitor(shutdown)
    } else {
        run(args, shutdown)
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Receives one message on SIGINT or SIGTERM.
fn shutdown_channel() -> Result<Receiver<()>> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("Failed to install signal handlers")?;
    let (tx, rx) = bounded(1);

    thread::spawn(move || {
        if let Some(signal) = signals.forever().next() {
            debug!("Received signal {}", signal);
            let _ = tx.send(());
        }
    });

    Ok(rx)
}

fn monitor(shutdown: Receiver<()>) -> Result<()> {
    let tables = TriggerTables::default();
    let mut devices = DeviceSet::open(&devices::discover()?, false, shutdown)?;
    info!("Monitoring {} devices", devices.device_count());

    Dispatcher::new(&tables, DEFAULT_TICK_SECS, ShellExecutor::new(false), Mode::Monitor)
        .run(&mut devices)
}

fn run(args: Args, shutdown: Receiver<()>) -> Result<()> {
    let path = config::config_path(args.config);
    let config = config::load(&path)?;
    config::report_issues(&path, &config.issues);

    let (tables, issues) = TriggerTables::load(&config.bindings);
    config::report_issues(&path, &issues);
    let tick = config.tick_seconds(&tables);

    let mut devices = if config.listen.is_empty() {
        DeviceSet::open(&devices::discover()?, false, shutdown)?
    } else {
        DeviceSet::open(&config.listen, true, shutdown)?
    };

    info!(
        "Loaded {} key, {} switch and {} idle bindings from {}",
        tables.key_count(),
        tables.switch_count(),
        tables.idle_count(),
        path.display()
    );
    info!(
        "Listening on {} devices, idle tick {}s",
        devices.device_count(),
        tick
    );

    Dispatcher::new(&tables, tick, ShellExecutor::new(args.verbose), Mode::Execute)
        .run(&mut devices)
}

//! Threshold-alerting controller
//!
//! Simulates a pulse-width temperature sensor, tracks the median over the
//! last second and blinks a warning when the median stays above the
//! threshold for longer than the debounce period.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use thermo_guard::{
    actors::coordinator::Coordinator,
    clock::MonotonicClock,
    config::Config,
    diagnostics::{ConsoleSink, Diagnostics},
    util::get_log_dir,
};
use tracing::{info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(name = "thermo-guard")]
#[command(about = "Sensor-driven threshold alerting controller", long_about = None)]
struct Args {
    /// Config file
    #[arg(short, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Total measurement duration in milliseconds (overrides config file)
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Seed for the pulse generator (overrides config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Do not write a diagnostic log file
    #[arg(long)]
    no_log_file: bool,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_target("thermo_guard", LevelFilter::DEBUG);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

fn build_sink(config: &Config) -> Arc<ConsoleSink> {
    if !config.log.enabled {
        return Arc::new(ConsoleSink::stdout());
    }

    let directory = get_log_dir().unwrap_or_else(|| config.log.directory.clone());
    match ConsoleSink::with_log_file(&directory) {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            warn!(
                "could not create log file in {}: {e}, continuing without it",
                directory.display()
            );
            Arc::new(ConsoleSink::stdout())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let mut config = Config::load(args.file.as_deref())?;
    if let Some(duration_ms) = args.duration_ms {
        config.run_duration_ms = duration_ms;
    }
    if let Some(seed) = args.seed {
        config.pulse.seed = Some(seed);
    }
    if args.no_log_file {
        config.log.enabled = false;
    }
    config.validate()?;

    let sink = build_sink(&config);
    if let Some(path) = sink.log_path() {
        info!("diagnostics are logged to {}", path.display());
    }

    let coordinator = Coordinator::new(
        config,
        Arc::new(MonotonicClock::new()),
        Diagnostics::new(sink.clone()),
    );

    let shutdown = coordinator.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, stopping controller");
            shutdown.cancel();
        }
    });

    let report = coordinator.run().await.context("controller run failed")?;
    sink.flush();

    info!(
        "processed {} of {} readings ({} overwritten), {} alerts, {} warnings on / {} off",
        report.readings_processed,
        report.readings_generated,
        report.readings_overwritten,
        report.alerts_raised,
        report.warnings_on,
        report.warnings_off
    );
    info!("run report: {}", serde_json::to_string(&report)?);

    Ok(())
}

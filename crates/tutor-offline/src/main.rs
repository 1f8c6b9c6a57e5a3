//! Math Tutor offline worker host.
//!
//! Installs and activates the offline worker against a live or simulated
//! network, dispatches the requested events, and prints one JSON line per
//! event on stdout.

mod args;
mod host;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tutor_common::{init_logging, LogConfig};
use tutor_core::OfflineConfig;

use crate::args::Args;
use crate::host::Host;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_config = if args.verbose {
        LogConfig::debug()
    } else {
        LogConfig::default()
    };
    init_logging(log_config.with_format(args.log_format))?;
    // Route `log` records from tutor-core through the subscriber.
    let _ = tracing_log::LogTracer::init();

    info!("Starting tutor-offline {}", env!("CARGO_PKG_VERSION"));

    let config = OfflineConfig::discover(args.config.as_deref()).context("loading configuration")?;
    info!(origin = %config.origin, cache = %config.cache_name, "Configuration loaded");

    let host = Host::new(config, &args)?;
    if let Err(e) = host.run(&args).await {
        error!("{e:#}");
        return Err(e);
    }

    Ok(())
}

//! Drishti IO - camera streaming daemon
//!
//! ## Protocol
//!
//! - **UDP port 9000**: a viewer sends one empty datagram; the daemon then
//!   streams every frame to that address as raw chunks of up to 59192 bytes
//!
//! ## Usage
//!
//! ```bash
//! drishti-io                         # defaults: mock camera on 0.0.0.0:9000
//! drishti-io drishti.toml
//! drishti-io --config drishti.toml --bind 127.0.0.1:9000
//! RUST_LOG=debug drishti-io
//! ```

use clap::Parser;
use drishti_io::config::Config;
use drishti_io::error::{Error, Result};
use drishti_io::app;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Parser)]
#[command(name = "drishti-io")]
#[command(about = "Stream camera frames to a single UDP subscriber")]
struct Args {
    /// Configuration file (TOML)
    #[arg(value_name = "CONFIG")]
    config_path: Option<PathBuf>,

    /// Configuration file (TOML), same as the positional argument
    #[arg(short, long, conflicts_with = "config_path")]
    config: Option<PathBuf>,

    /// Override `network.bind_address`
    #[arg(long)]
    bind: Option<String>,
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match args.config.as_ref().or(args.config_path.as_ref()) {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            Config::load(path)?
        }
        None => {
            log::info!("No config file given, using defaults");
            Config::default()
        }
    };

    if let Some(bind) = &args.bind {
        config.network.bind_address = bind.clone();
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Drishti IO v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args).inspect_err(|e| log::error!("Configuration failed: {}", e))?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let stream = app::start(&config, running)
        .inspect_err(|e| log::error!("Stream setup failed, not starting: {}", e))?;

    log::info!(
        "Drishti IO listening on {}. Press Ctrl-C to stop.",
        stream.local_addr()
    );

    stream.join()?;

    log::info!("Drishti IO stopped");
    Ok(())
}

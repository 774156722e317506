//! Display server: show frames received over UDP, with idle content in between.
//!
//! ```text
//! display_server wall.toml --port 1337
//! ```
//!
//! Send frames with `send_frames`, or any program that writes `width * height * 3` bytes of
//! row-major RGB per datagram.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crate_matrix::{
    arbiter::Arbiter,
    config::Config,
    ingest::FrameListener,
    panel::{self, Panel},
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "display_server")]
#[command(about = "Show frames received over UDP on a crate LED wall")]
struct Args {
    /// Configuration file describing the crate layout
    config: PathBuf,

    /// UDP port to listen on (overrides `server.port`)
    #[arg(short, long)]
    port: Option<u16>,

    /// LED device file (overrides `device.path`)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Log level, used when `RUST_LOG` is not set
    #[arg(long, default_value = "info", env = "CRATE_MATRIX_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(device) = args.device {
        config.device.path = device;
    }
    let resolved = config.resolve().context("invalid configuration")?;
    resolved.topology.log();

    let sink = panel::open_device(&resolved.device_path)
        .with_context(|| format!("opening {}", resolved.device_path.display()))?;
    let listener = FrameListener::bind(&resolved.listener, resolved.geometry.frame_size())
        .await
        .context("binding frame listener")?;
    let stats = listener.stats();
    let (frames, receiver) = listener.spawn(resolved.listener.channel_capacity);

    let panel = Panel::new(resolved.topology, sink);
    let arbiter = Arbiter::new(panel, Box::new(resolved.idle), resolved.arbiter);
    let result = arbiter.run(frames, shutdown_signal()).await;

    receiver.abort();
    let counts = stats.snapshot();
    info!(
        accepted = counts.accepted,
        dropped_length = counts.dropped_length,
        dropped_checksum = counts.dropped_checksum,
        dropped_host = counts.dropped_host,
        checksum_anomalies = counts.checksum_anomalies,
        "display server stopped"
    );
    result.context("display loop failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "cannot listen for Ctrl-C, running until killed");
        core::future::pending::<()>().await;
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .with_context(|| format!("invalid log level {log_level:?}"))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

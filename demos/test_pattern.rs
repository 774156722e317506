//! Wiring check: flash random pixels on every LED until Ctrl-C, then blank the wall.
//!
//! ```text
//! test_pattern wall.toml --interval-ms 10
//! ```

use core::time::Duration;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crate_matrix::{
    config::Config,
    frame::{Frame, RGB8},
    panel::{self, Panel, PanelTopology},
};
use rand::Rng;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "test_pattern")]
#[command(about = "Show random colors on every LED of a crate wall")]
struct Args {
    /// Configuration file describing the crate layout
    config: PathBuf,

    /// LED device file (overrides `device.path`)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Time between frames in milliseconds
    #[arg(short = 's', long, default_value_t = 10)]
    interval_ms: u64,

    /// Log level, used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing::subscriber::set_global_default(FmtSubscriber::builder().with_env_filter(filter).finish())?;

    // Only the layout matters here; idle content and server settings are not resolved.
    let config = Config::load(&args.config)?;
    let layout = &config.layout;
    let geometry = panel::PanelGeometry::new(
        layout.crate_rows,
        layout.crate_columns,
        layout.crate_width,
        layout.crate_height,
    )?;
    let topology = PanelTopology::resolve(&layout.crates.tokens(), geometry)?;
    topology.log();

    let device_path = args.device.unwrap_or(config.device.path);
    let sink = panel::open_device(&device_path)
        .with_context(|| format!("opening {}", device_path.display()))?;
    let mut panel = Panel::new(topology, sink);

    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut rng = rand::thread_rng();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    info!(interval_ms = args.interval_ms, "showing test pattern, Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = ticker.tick() => {
                let mut frame = Frame::new(geometry.width(), geometry.height());
                for y_index in 0..geometry.height() {
                    for x_index in 0..geometry.width() {
                        frame[(x_index, y_index)] = RGB8::new(rng.r#gen(), rng.r#gen(), rng.r#gen());
                    }
                }
                panel.write_frame(&frame)?;
            }
        }
    }

    panel.shutdown()?;
    Ok(())
}

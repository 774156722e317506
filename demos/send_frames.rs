//! Send generated frames to a running `display_server`.
//!
//! ```text
//! send_frames 192.168.1.20:1337 --width 15 --height 12 --pattern rainbow --crc
//! ```

use core::time::Duration;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crate_matrix::{
    frame::{Frame, RGB8, colors},
    ingest::encode_datagram,
};
use rand::Rng;
use tokio::net::UdpSocket;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Pattern {
    /// Hue gradient scrolling left.
    Rainbow,
    /// One lit column sweeping across.
    Sweep,
    /// Random pixels.
    Noise,
}

#[derive(Parser, Debug)]
#[command(name = "send_frames")]
#[command(about = "Send test frames to a crate wall display server")]
struct Args {
    /// Display server address
    target: SocketAddr,

    /// Panel width in pixels
    #[arg(long, default_value_t = 15)]
    width: usize,

    /// Panel height in pixels
    #[arg(long, default_value_t = 12)]
    height: usize,

    /// What to send
    #[arg(long, value_enum, default_value_t = Pattern::Rainbow)]
    pattern: Pattern,

    /// Frames per second
    #[arg(long, default_value_t = 20)]
    fps: u32,

    /// Number of frames to send (0 = forever)
    #[arg(short = 'n', long, default_value_t = 0)]
    count: u64,

    /// Append a CRC32 trailer to each datagram
    #[arg(long)]
    crc: bool,

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

    let bind_addr: SocketAddr = if args.target.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };
    let socket = UdpSocket::bind(bind_addr).await.context("binding UDP socket")?;
    socket.connect(args.target).await.context("connecting UDP socket")?;
    info!(target = %args.target, width = args.width, height = args.height, pattern = ?args.pattern, "sending frames");

    let mut ticker = tokio::time::interval(Duration::from_secs(1) / args.fps.max(1));
    let mut rng = rand::thread_rng();
    let mut sent = 0u64;
    while args.count == 0 || sent < args.count {
        ticker.tick().await;
        let frame = match args.pattern {
            Pattern::Rainbow => rainbow(args.width, args.height, sent as usize),
            Pattern::Sweep => sweep(args.width, args.height, sent as usize),
            Pattern::Noise => {
                let mut frame = Frame::new(args.width, args.height);
                for y_index in 0..args.height {
                    for x_index in 0..args.width {
                        frame[(x_index, y_index)] = RGB8::new(rng.r#gen(), rng.r#gen(), rng.r#gen());
                    }
                }
                frame
            }
        };
        let datagram = encode_datagram(&frame.to_rgb_bytes(), args.crc);
        socket.send(&datagram).await.context("sending frame")?;
        debug!(frame = sent, bytes = datagram.len(), "sent");
        sent += 1;
    }
    info!(sent, "done");
    Ok(())
}

fn rainbow(width: usize, height: usize, step: usize) -> Frame {
    let mut frame = Frame::new(width, height);
    for x_index in 0..width {
        let color = wheel(((x_index * 256 / width.max(1) + step * 4) % 256) as u8);
        for y_index in 0..height {
            frame[(x_index, y_index)] = color;
        }
    }
    frame
}

fn sweep(width: usize, height: usize, step: usize) -> Frame {
    let mut frame = Frame::new(width, height);
    if width > 0 {
        let x_index = step % width;
        for y_index in 0..height {
            frame[(x_index, y_index)] = colors::ORANGE;
        }
    }
    frame
}

// Red -> green -> blue -> red over 0..=255.
fn wheel(position: u8) -> RGB8 {
    match position {
        0..=84 => RGB8::new(255 - position * 3, position * 3, 0),
        85..=169 => {
            let position = position - 85;
            RGB8::new(0, 255 - position * 3, position * 3)
        }
        _ => {
            let position = position - 170;
            RGB8::new(position * 3, 0, 255 - position * 3)
        }
    }
}

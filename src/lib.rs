//! Drive an LED wall built from daisy-chained, serpentine-wired crates.
//!
//! # Glossary
//!
//! - **Crate:** one physical LED sub-panel (`crate_width × crate_height` LEDs) with a fixed
//!   wiring entry and exit and an internal serpentine trace.
//! - **Topology:** where each crate in the wiring chain sits in the crate grid, and which
//!   corner its trace enters from ([`panel::PanelTopology`]).
//! - **Frame:** row-major RGB pixels for the whole wall ([`frame::Frame`]).
//! - **Device frame:** the bytes written to hardware, in wiring order
//!   ([`panel::assemble`]).
//! - **Filler:** idle content shown while no live frames arrive ([`idle::Filler`]).
//!
//! # Data flow
//!
//! [`ingest::FrameListener`] receives UDP datagrams on a receiver task and passes accepted
//! frames over a bounded channel to the [`arbiter::Arbiter`]. The arbiter owns the
//! [`panel::Panel`], writes live frames straight through, and falls back to idle content
//! after a quiet period.
//!
//! # Example
//!
//! ```rust,no_run
//! use crate_matrix::{arbiter::Arbiter, config::Config, ingest::FrameListener, panel};
//!
//! # async fn example() -> crate_matrix::Result<()> {
//! let resolved = Config::load("wall.toml")?.resolve()?;
//! let sink = panel::open_device(&resolved.device_path)?;
//! let listener = FrameListener::bind(&resolved.listener, resolved.geometry.frame_size()).await?;
//! let (frames, _receiver) = listener.spawn(resolved.listener.channel_capacity);
//!
//! let panel = panel::Panel::new(resolved.topology, sink);
//! let arbiter = Arbiter::new(panel, Box::new(resolved.idle), resolved.arbiter);
//! arbiter.run(frames, async { tokio::signal::ctrl_c().await.ok(); }).await
//! # }
//! ```

pub mod arbiter;
pub mod config;
mod error;
pub mod frame;
pub mod idle;
pub mod ingest;
pub mod panel;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};

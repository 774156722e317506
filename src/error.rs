//! Crate-wide error type.
//!
//! Startup problems ([`Error::Config`], [`Error::UnknownOrientation`], [`Error::Topology`])
//! are fatal before any hardware I/O happens. Runtime sink failures ([`Error::DeviceIo`],
//! [`Error::DeviceHalted`]) stop all further output.

use std::io;

use crate::panel::orientation::Orientation;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors produced while configuring or driving an LED wall.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum Error {
    /// Invalid geometry, unreadable configuration, or bad idle content settings.
    #[display("configuration error: {message}")]
    Config {
        /// Human readable description of what is wrong.
        message: String,
    },

    /// A crate orientation token that names none of the four orientations.
    #[display("unknown crate orientation {token:?} at position {index}")]
    UnknownOrientation {
        /// The token as written in the configuration.
        token: String,
        /// Zero-based position of the token in the crate list.
        index: usize,
    },

    /// The crate chain is not physically contiguous.
    #[display(
        "crate {index} ({found}) cannot follow {previous}: expected {next_row} (next row) or {next_column} (next column)"
    )]
    Topology {
        /// Zero-based position of the offending crate in the chain.
        index: usize,
        /// Orientation of the crate before it.
        previous: Orientation,
        /// Orientation that was configured.
        found: Orientation,
        /// Orientation a next-row neighbour would have.
        next_row: Orientation,
        /// Orientation a next-column neighbour would have.
        next_column: Orientation,
    },

    /// The chain is contiguous but does not tile the configured crate grid.
    #[display("crate chain does not tile a {columns}x{rows} grid: {reason}")]
    TopologyShape {
        /// Configured crate columns.
        columns: usize,
        /// Configured crate rows.
        rows: usize,
        /// What went wrong.
        reason: String,
    },

    /// A pixel payload whose length does not fill the frame it is meant for.
    #[display("{actual} bytes cannot fill a {width}x{height} RGB frame ({expected} expected)")]
    FrameSize {
        /// Frame width in pixels.
        width: usize,
        /// Frame height in pixels.
        height: usize,
        /// Required byte count, `width * height * 3`.
        expected: usize,
        /// Byte count received.
        actual: usize,
    },

    /// The configuration file is not valid TOML for [`crate::config::Config`].
    #[from]
    #[display("cannot parse configuration: {_0}")]
    ConfigParse(toml::de::Error),

    /// An idle animation or image could not be decoded.
    #[from]
    #[display("cannot decode idle image: {_0}")]
    Image(image::ImageError),

    /// Opening, writing or flushing the hardware sink failed.
    #[display("device I/O error: {source}")]
    DeviceIo {
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A previous sink failure halted the panel; nothing more is written.
    #[display("device halted after an earlier I/O failure")]
    DeviceHalted,

    /// Binding or reading the UDP socket failed.
    #[display("network error: {source}")]
    Network {
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl Error {
    /// Build an [`Error::Config`] from anything printable.
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) const fn device_io(source: io::Error) -> Self {
        Self::DeviceIo { source }
    }

    pub(crate) const fn network(source: io::Error) -> Self {
        Self::Network { source }
    }
}

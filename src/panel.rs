//! Assemble frames into the byte stream the daisy-chained crates expect, and write it.
//!
//! [`assemble`] is the pure part: it walks the [`PanelTopology`] in wiring order and runs
//! each crate's region of the frame through
//! [`transform_crate`](orientation::transform_crate). [`Panel`] owns the hardware sink and
//! writes one device frame per call.
//!
//! # Example
//!
//! ```rust
//! use crate_matrix::{
//!     frame::{Frame, colors},
//!     panel::{Panel, PanelGeometry, PanelTopology},
//! };
//!
//! let geometry = PanelGeometry::new(2, 2, 5, 4)?;
//! let topology = PanelTopology::resolve(
//!     &["bottomleft", "bottomright", "topright", "topleft"],
//!     geometry,
//! )?;
//!
//! // Any `std::io::Write` can be the sink; on hardware it is the SPI device file.
//! let mut panel = Panel::new(topology, Vec::new());
//! panel.write_frame(&Frame::filled(10, 8, colors::ORANGE))?;
//! assert_eq!(panel.sink().len(), 240);
//! # Ok::<(), crate_matrix::Error>(())
//! ```

pub mod orientation;
pub mod topology;

use std::{
    borrow::Cow,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use tracing::{debug, info, warn};

pub use orientation::Orientation;
pub use topology::{CratePlacement, PanelGeometry, PanelTopology};

use crate::{Error, Result, frame::Frame};

/// Bring `frame` to panel dimensions.
///
/// Frames of the right size pass through untouched. A frame with the right pixel count but
/// other dimensions is reinterpreted row-major. Anything else is resized nearest-neighbour.
#[must_use]
pub fn fit_frame<'a>(frame: &'a Frame, geometry: &PanelGeometry) -> Cow<'a, Frame> {
    let (width, height) = (geometry.width(), geometry.height());
    if frame.width() == width && frame.height() == height {
        return Cow::Borrowed(frame);
    }
    if let Some(reshaped) = frame.clone().reshaped(width, height) {
        return Cow::Owned(reshaped);
    }
    debug!(
        from_width = frame.width(),
        from_height = frame.height(),
        width,
        height,
        "resizing frame to panel dimensions"
    );
    Cow::Owned(frame.resized(width, height))
}

/// Convert `frame` into a device frame, appending to `out` (which is cleared first).
///
/// The result always holds exactly [`PanelGeometry::device_frame_len`] bytes.
pub fn assemble_into(frame: &Frame, topology: &PanelTopology, out: &mut Vec<u8>) {
    let geometry = topology.geometry();
    let frame = fit_frame(frame, geometry);
    let crate_size = (geometry.crate_width(), geometry.crate_height());

    out.clear();
    out.reserve(geometry.device_frame_len());
    for placement in topology.placements() {
        // Normalized placements are non-negative and inside the grid.
        let origin = (
            placement.grid_x as usize * geometry.crate_width(),
            placement.grid_y as usize * geometry.crate_height(),
        );
        orientation::transform_crate(&frame, origin, crate_size, placement.orientation, out);
    }
    debug_assert_eq!(out.len(), geometry.device_frame_len());
}

/// Convert `frame` into a freshly allocated device frame.
#[must_use]
pub fn assemble(frame: &Frame, topology: &PanelTopology) -> Vec<u8> {
    let mut out = Vec::new();
    assemble_into(frame, topology, &mut out);
    out
}

/// Open the hardware sink (e.g. `/dev/spidev0.0`) for writing.
///
/// # Errors
///
/// Returns [`Error::DeviceIo`] if the device cannot be opened.
pub fn open_device(path: impl AsRef<Path>) -> Result<File> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(Error::device_io)?;
    info!(path = %path.display(), "opened LED device");
    Ok(file)
}

/// The LED wall: a resolved topology plus the sink its bytes go to.
///
/// The sink is opened once by the caller and reused for every frame. Each frame is one
/// `write_all` followed by one `flush`. After any sink error the panel is halted and
/// refuses further writes.
pub struct Panel<S: Write> {
    topology: PanelTopology,
    sink: S,
    buffer: Vec<u8>,
    halted: bool,
    frames_written: u64,
}

impl<S: Write> Panel<S> {
    /// Wrap an already opened sink.
    #[must_use]
    pub fn new(topology: PanelTopology, sink: S) -> Self {
        let capacity = topology.geometry().device_frame_len();
        Self {
            topology,
            sink,
            buffer: Vec::with_capacity(capacity),
            halted: false,
            frames_written: 0,
        }
    }

    /// The topology frames are assembled with.
    #[must_use]
    pub const fn topology(&self) -> &PanelTopology {
        &self.topology
    }

    /// Panel geometry.
    #[must_use]
    pub const fn geometry(&self) -> &PanelGeometry {
        self.topology.geometry()
    }

    /// The underlying sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Device frames written so far.
    #[must_use]
    pub const fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Whether an earlier sink failure stopped output.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Assemble `frame` and write it to the sink.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceIo`] if the write or flush fails (the panel is then halted),
    /// or [`Error::DeviceHalted`] if it already was.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if self.halted {
            return Err(Error::DeviceHalted);
        }
        let mut buffer = core::mem::take(&mut self.buffer);
        assemble_into(frame, &self.topology, &mut buffer);
        let result = self.write_device_frame(&buffer);
        self.buffer = buffer;
        result
    }

    /// Write an all-zero device frame.
    ///
    /// # Errors
    ///
    /// Same as [`Self::write_frame`].
    pub fn blank(&mut self) -> Result<()> {
        if self.halted {
            return Err(Error::DeviceHalted);
        }
        let blank = vec![0; self.geometry().device_frame_len()];
        self.write_device_frame(&blank)
    }

    /// Turn the lights off and release the sink.
    ///
    /// # Errors
    ///
    /// Returns the error of the final blank write; the sink is dropped either way.
    pub fn shutdown(mut self) -> Result<()> {
        info!(frames = self.frames_written, "panel shutting down");
        self.blank()
    }

    fn write_device_frame(&mut self, bytes: &[u8]) -> Result<()> {
        let result = self
            .sink
            .write_all(bytes)
            .and_then(|()| self.sink.flush());
        match result {
            Ok(()) => {
                self.frames_written += 1;
                Ok(())
            }
            Err(source) => {
                warn!(error = %source, "LED device write failed, halting output");
                self.halted = true;
                Err(Error::device_io(source))
            }
        }
    }
}

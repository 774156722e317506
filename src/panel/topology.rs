//! Resolve an ordered list of crate orientations into a validated panel layout.
//!
//! The crates of a wall are daisy-chained, so the configuration only lists their
//! orientations in wiring order. [`PanelTopology::resolve`] walks that chain, placing each
//! crate next to the previous one according to [`Orientation::neighbours`], then shifts
//! the result so the top-left crate sits at `(0, 0)`.
//!
//! ```text
//! 2×2 wall, crates listed as [bottomleft, bottomright, topright, topleft]:
//!
//!   chain order          grid (x, y)
//!   ┌────┬────┐          ┌──────┬──────┐
//!   │ 3  │ 2  │          │(0,0) │(1,0) │
//!   ├────┼────┤          ├──────┼──────┤
//!   │ 4  │ 1  │          │(0,1) │(1,1) │
//!   └────┴────┘          └──────┴──────┘
//! ```

use itertools::Itertools;
use tracing::info;

use crate::{
    Error, Result,
    panel::orientation::{Orientation, parse_orientations},
};

/// Size of the wall in crates and of each crate in LEDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelGeometry {
    crate_rows: usize,
    crate_columns: usize,
    crate_width: usize,
    crate_height: usize,
}

impl PanelGeometry {
    /// Validate a geometry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any dimension is zero or a derived size (LED count,
    /// frame bytes, datagram bytes) overflows.
    pub fn new(
        crate_rows: usize,
        crate_columns: usize,
        crate_width: usize,
        crate_height: usize,
    ) -> Result<Self> {
        if crate_rows == 0 || crate_columns == 0 || crate_width == 0 || crate_height == 0 {
            return Err(Error::config(format!(
                "crate_rows ({crate_rows}), crate_columns ({crate_columns}), crate_width \
                 ({crate_width}) and crate_height ({crate_height}) must all be positive"
            )));
        }
        let total_bytes = crate_rows
            .checked_mul(crate_columns)
            .and_then(|crates| crates.checked_mul(crate_width))
            .and_then(|leds| leds.checked_mul(crate_height))
            .and_then(|leds| leds.checked_mul(3))
            .and_then(|bytes| bytes.checked_add(5));
        if total_bytes.is_none() {
            return Err(Error::config("panel geometry is too large"));
        }
        Ok(Self {
            crate_rows,
            crate_columns,
            crate_width,
            crate_height,
        })
    }

    /// Number of crate rows.
    #[must_use]
    pub const fn crate_rows(&self) -> usize {
        self.crate_rows
    }

    /// Number of crate columns.
    #[must_use]
    pub const fn crate_columns(&self) -> usize {
        self.crate_columns
    }

    /// LEDs across one crate.
    #[must_use]
    pub const fn crate_width(&self) -> usize {
        self.crate_width
    }

    /// LEDs down one crate.
    #[must_use]
    pub const fn crate_height(&self) -> usize {
        self.crate_height
    }

    /// Total number of crates.
    #[must_use]
    pub const fn num_crates(&self) -> usize {
        self.crate_rows * self.crate_columns
    }

    /// LEDs in one crate.
    #[must_use]
    pub const fn leds_per_crate(&self) -> usize {
        self.crate_width * self.crate_height
    }

    /// Wall width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.crate_width * self.crate_columns
    }

    /// Wall height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.crate_height * self.crate_rows
    }

    /// Bytes of one row-major RGB frame (the datagram payload size).
    #[must_use]
    pub const fn frame_size(&self) -> usize {
        self.width() * self.height() * 3
    }

    /// Bytes of one device frame. Always equal to [`Self::frame_size`].
    #[must_use]
    pub const fn device_frame_len(&self) -> usize {
        self.num_crates() * self.leds_per_crate() * 3
    }
}

/// One crate of the wall at its grid position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CratePlacement {
    /// Crate column, 0 is leftmost.
    pub grid_x: i32,
    /// Crate row, 0 is topmost.
    pub grid_y: i32,
    /// Wiring entry corner.
    pub orientation: Orientation,
}

impl CratePlacement {
    /// `(grid_x, grid_y)`.
    #[must_use]
    pub const fn position(&self) -> (i32, i32) {
        (self.grid_x, self.grid_y)
    }

    /// Where this crate's chain continues, given the next crate's orientation.
    ///
    /// Returns `None` when `next` is neither the next-row nor the next-column neighbour.
    #[must_use]
    pub fn follow(&self, next: Orientation) -> Option<Self> {
        let neighbours = self.orientation.neighbours();
        let (grid_x, grid_y) = if next == neighbours.next_row.orientation {
            (self.grid_x, self.grid_y + neighbours.next_row.displacement)
        } else if next == neighbours.next_column.orientation {
            (self.grid_x + neighbours.next_column.displacement, self.grid_y)
        } else {
            return None;
        };
        Some(Self {
            grid_x,
            grid_y,
            orientation: next,
        })
    }
}

/// Resolved, normalized crate layout in wiring order.
///
/// Built once at startup and never modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelTopology {
    geometry: PanelGeometry,
    placements: Vec<CratePlacement>,
}

impl PanelTopology {
    /// Resolve orientation tokens (e.g. `"bottomleft"`) into a topology.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownOrientation`] for an unrecognized token (checked before placement).
    /// - [`Error::Config`] if the number of tokens is not `crate_rows * crate_columns`.
    /// - [`Error::Topology`] if a crate cannot follow its predecessor.
    /// - [`Error::TopologyShape`] if the chain overlaps itself or does not tile the grid.
    pub fn resolve<S: AsRef<str>>(tokens: &[S], geometry: PanelGeometry) -> Result<Self> {
        let orientations = parse_orientations(tokens)?;
        Self::from_orientations(&orientations, geometry)
    }

    /// Like [`Self::resolve`] for already-parsed orientations.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn from_orientations(
        orientations: &[Orientation],
        geometry: PanelGeometry,
    ) -> Result<Self> {
        if orientations.len() != geometry.num_crates() {
            return Err(Error::config(format!(
                "{} crates listed but the layout is {} rows x {} columns ({} crates)",
                orientations.len(),
                geometry.crate_rows(),
                geometry.crate_columns(),
                geometry.num_crates()
            )));
        }

        let placements = place_chain(orientations)?;
        let placements = normalize(placements);
        check_tiles_grid(&placements, &geometry)?;

        Ok(Self {
            geometry,
            placements,
        })
    }

    /// Placements in wiring order.
    #[must_use]
    pub fn placements(&self) -> &[CratePlacement] {
        &self.placements
    }

    /// Geometry the topology was resolved for.
    #[must_use]
    pub const fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    /// Log the layout, one line per crate.
    pub fn log(&self) {
        info!(
            crates = self.placements.len(),
            width = self.geometry.width(),
            height = self.geometry.height(),
            "resolved panel topology"
        );
        for (index, placement) in self.placements.iter().enumerate() {
            info!(
                index,
                grid_x = placement.grid_x,
                grid_y = placement.grid_y,
                orientation = %placement.orientation,
                "crate"
            );
        }
    }
}

fn place_chain(orientations: &[Orientation]) -> Result<Vec<CratePlacement>> {
    let Some((&first, rest)) = orientations.split_first() else {
        return Ok(Vec::new());
    };
    let mut placements = Vec::with_capacity(orientations.len());
    placements.push(CratePlacement {
        grid_x: 0,
        grid_y: 0,
        orientation: first,
    });

    for (offset, &orientation) in rest.iter().enumerate() {
        let previous = placements[offset];
        let placement = previous.follow(orientation).ok_or_else(|| {
            let neighbours = previous.orientation.neighbours();
            Error::Topology {
                index: offset + 1,
                previous: previous.orientation,
                found: orientation,
                next_row: neighbours.next_row.orientation,
                next_column: neighbours.next_column.orientation,
            }
        })?;
        placements.push(placement);
    }
    Ok(placements)
}

fn normalize(mut placements: Vec<CratePlacement>) -> Vec<CratePlacement> {
    let min_x = placements.iter().map(|placement| placement.grid_x).min();
    let min_y = placements.iter().map(|placement| placement.grid_y).min();
    if let (Some(min_x), Some(min_y)) = (min_x, min_y) {
        for placement in &mut placements {
            placement.grid_x -= min_x;
            placement.grid_y -= min_y;
        }
    }
    placements
}

fn check_tiles_grid(placements: &[CratePlacement], geometry: &PanelGeometry) -> Result<()> {
    let shape_error = |reason: String| Error::TopologyShape {
        columns: geometry.crate_columns(),
        rows: geometry.crate_rows(),
        reason,
    };

    if let Some(position) = placements
        .iter()
        .map(CratePlacement::position)
        .duplicates()
        .next()
    {
        return Err(shape_error(format!(
            "two crates share grid position {position:?}"
        )));
    }

    for placement in placements {
        let inside = usize::try_from(placement.grid_x)
            .is_ok_and(|grid_x| grid_x < geometry.crate_columns())
            && usize::try_from(placement.grid_y)
                .is_ok_and(|grid_y| grid_y < geometry.crate_rows());
        if !inside {
            return Err(shape_error(format!(
                "crate at {:?} lies outside the grid",
                placement.position()
            )));
        }
    }

    // Unique, in bounds and rows*columns of them: the grid is covered exactly.
    Ok(())
}

//! The four crate orientations and the serpentine wiring transform each one implies.
//!
//! Every crate is a small LED panel whose data line enters in one corner and snakes through
//! the crate column by column. The corner it enters from is its [`Orientation`]. Because
//! crates are daisy-chained, the orientation of a crate also fixes the orientation of the
//! crate that can follow it, both in the next crate row and in the next crate column.
//!
//! All of this is static data in [`Orientation::neighbours`] and [`Orientation::wiring`], so
//! the whole wiring contract can be audited in one place.

use core::{fmt, str::FromStr};

use crate::{Error, frame::Frame};

/// Corner of a crate where its data line enters.
///
/// ```rust
/// use crate_matrix::panel::orientation::Orientation;
///
/// let orientation: Orientation = "BottomLeftCrate".parse().unwrap();
/// assert_eq!(orientation, Orientation::BottomLeft);
/// assert_eq!(orientation.neighbours().next_row.orientation, Orientation::BottomRight);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Data enters bottom-left.
    BottomLeft,
    /// Data enters bottom-right.
    BottomRight,
    /// Data enters top-left.
    TopLeft,
    /// Data enters top-right.
    TopRight,
}

/// One step of a contiguous crate chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainStep {
    /// Displacement along the step's axis, in crate units.
    pub displacement: i32,
    /// Orientation the neighbouring crate must have.
    pub orientation: Orientation,
}

/// Where the chain may continue after a crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbours {
    /// Continue in the same crate column, `displacement` rows away (y axis).
    pub next_row: ChainStep,
    /// Continue in the same crate row, `displacement` columns away (x axis).
    pub next_column: ChainStep,
}

/// Which 1-based line indices get reversed to produce the serpentine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    /// Lines 1, 3, 5, ...
    Odd,
    /// Lines 2, 4, 6, ...
    Even,
}

impl Parity {
    /// Whether the 1-based `line_number` has this parity.
    #[must_use]
    pub const fn matches(self, line_number: usize) -> bool {
        match self {
            Self::Odd => line_number % 2 == 1,
            Self::Even => line_number % 2 == 0,
        }
    }
}

/// Pixel-reordering parameters of one orientation.
///
/// The crate block handed to [`transform_crate`] is column-major: its rows are the physical
/// LED columns of the crate and its columns run along them. The field names use the block's
/// own axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Wiring {
    /// Reverse the order of the block rows (mirror the crate left-right).
    pub row_flip: bool,
    /// Reverse every block row (mirror the crate top-bottom).
    pub column_flip: bool,
    /// Block rows whose 1-based index has this parity are reversed after flipping.
    pub reversed_columns: Parity,
}

/// All orientations, in declaration order.
pub const ALL_ORIENTATIONS: [Orientation; 4] = [
    Orientation::BottomLeft,
    Orientation::BottomRight,
    Orientation::TopLeft,
    Orientation::TopRight,
];

impl Orientation {
    /// Chain continuation table.
    ///
    /// | Orientation | next row (dy, kind) | next column (dx, kind) |
    /// |---|---|---|
    /// | `BottomLeft` | (-1, `BottomRight`) | (+1, `TopLeft`) |
    /// | `BottomRight` | (-1, `BottomLeft`) | (-1, `TopRight`) |
    /// | `TopLeft` | (+1, `TopRight`) | (+1, `BottomLeft`) |
    /// | `TopRight` | (+1, `TopLeft`) | (-1, `BottomRight`) |
    #[must_use]
    pub const fn neighbours(self) -> Neighbours {
        const fn step(displacement: i32, orientation: Orientation) -> ChainStep {
            ChainStep {
                displacement,
                orientation,
            }
        }
        match self {
            Self::BottomLeft => Neighbours {
                next_row: step(-1, Self::BottomRight),
                next_column: step(1, Self::TopLeft),
            },
            Self::BottomRight => Neighbours {
                next_row: step(-1, Self::BottomLeft),
                next_column: step(-1, Self::TopRight),
            },
            Self::TopLeft => Neighbours {
                next_row: step(1, Self::TopRight),
                next_column: step(1, Self::BottomLeft),
            },
            Self::TopRight => Neighbours {
                next_row: step(1, Self::TopLeft),
                next_column: step(-1, Self::BottomRight),
            },
        }
    }

    /// Wiring table.
    ///
    /// | Orientation | row flip | column flip | reversed columns |
    /// |---|---|---|---|
    /// | `BottomLeft` | no | no | odd |
    /// | `BottomRight` | yes | no | odd |
    /// | `TopLeft` | no | no | even |
    /// | `TopRight` | yes | no | even |
    #[must_use]
    pub const fn wiring(self) -> Wiring {
        const fn wiring(row_flip: bool, reversed_columns: Parity) -> Wiring {
            Wiring {
                row_flip,
                column_flip: false,
                reversed_columns,
            }
        }
        match self {
            Self::BottomLeft => wiring(false, Parity::Odd),
            Self::BottomRight => wiring(true, Parity::Odd),
            Self::TopLeft => wiring(false, Parity::Even),
            Self::TopRight => wiring(true, Parity::Even),
        }
    }

    /// Canonical lower-case token.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::BottomLeft => "bottomleft",
            Self::BottomRight => "bottomright",
            Self::TopLeft => "topleft",
            Self::TopRight => "topright",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parse error for orientation tokens. Position information is added by the caller.
#[derive(Clone, Debug, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown crate orientation {token:?}")]
pub struct ParseOrientationError {
    /// The rejected token.
    pub token: String,
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    /// Accepts `bottomleft` and the older `bottomleftcrate` spelling, in any case, with
    /// surrounding whitespace ignored.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim().to_ascii_lowercase();
        let name = normalized.strip_suffix("crate").unwrap_or(&normalized);
        ALL_ORIENTATIONS
            .into_iter()
            .find(|orientation| orientation.token() == name)
            .ok_or_else(|| ParseOrientationError {
                token: token.to_owned(),
            })
    }
}

/// Parse an ordered token list, reporting the position of the first unknown token.
///
/// # Errors
///
/// Returns [`Error::UnknownOrientation`] for the first token that names no orientation.
pub fn parse_orientations<S: AsRef<str>>(tokens: &[S]) -> crate::Result<Vec<Orientation>> {
    tokens
        .iter()
        .enumerate()
        .map(|(index, token)| {
            token
                .as_ref()
                .parse()
                .map_err(|ParseOrientationError { token }| Error::UnknownOrientation {
                    token,
                    index,
                })
        })
        .collect()
}

/// Reorder one crate's pixels into physical wiring order and append them to `out`.
///
/// The crate occupies the `crate_width × crate_height` region of `frame` whose top-left
/// pixel is `(origin_x, origin_y)`. The region is read column-major (the transposed
/// frame), flipped and serpentined per [`Orientation::wiring`], and flattened to RGB bytes.
/// Exactly `crate_width * crate_height * 3` bytes are appended.
///
/// # Panics
///
/// Panics if the region does not lie inside `frame`.
pub fn transform_crate(
    frame: &Frame,
    (origin_x, origin_y): (usize, usize),
    (crate_width, crate_height): (usize, usize),
    orientation: Orientation,
    out: &mut Vec<u8>,
) {
    assert!(
        origin_x + crate_width <= frame.width() && origin_y + crate_height <= frame.height(),
        "crate region must lie inside the frame"
    );
    let wiring = orientation.wiring();
    out.reserve(crate_width * crate_height * 3);

    for line_index in 0..crate_width {
        // Block row `line_index` after the optional row flip, i.e. which LED column is next.
        let column = if wiring.row_flip {
            crate_width - 1 - line_index
        } else {
            line_index
        };
        let reversed = wiring.column_flip ^ wiring.reversed_columns.matches(line_index + 1);
        for step in 0..crate_height {
            let row = if reversed {
                crate_height - 1 - step
            } else {
                step
            };
            let pixel = frame[(origin_x + column, origin_y + row)];
            out.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
        }
    }
}

/// Convenience wrapper around [`transform_crate`] for a frame that is exactly one crate.
#[must_use]
pub fn transform_block(block: &Frame, orientation: Orientation) -> Vec<u8> {
    let mut out = Vec::with_capacity(block.width() * block.height() * 3);
    transform_crate(
        block,
        (0, 0),
        (block.width(), block.height()),
        orientation,
        &mut out,
    );
    out
}

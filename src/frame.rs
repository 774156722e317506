//! Row-major RGB pixel buffers.
//!
//! A [`Frame`] is what live senders and idle fillers produce and what the
//! [`Panel`](crate::panel::Panel) turns into wiring order. It implements the
//! [`embedded-graphics`](https://docs.rs/embedded-graphics) `DrawTarget`, so text and shapes
//! can be drawn straight into it.
//!
//! # Example
//!
//! ```rust
//! use crate_matrix::frame::{Frame, ToRgb888, colors};
//! use embedded_graphics::{
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//!
//! let mut frame = Frame::new(15, 12);
//! Rectangle::new(Point::new(0, 0), Size::new(15, 12))
//!     .into_styled(PrimitiveStyle::with_stroke(colors::RED.to_rgb888(), 1))
//!     .draw(&mut frame)
//!     .unwrap();
//! frame[(7, 6)] = colors::CYAN;
//!
//! assert_eq!(frame[(0, 0)], colors::RED);
//! assert_eq!(frame.to_rgb_bytes().len(), 15 * 12 * 3);
//! ```

use core::{
    convert::Infallible,
    ops::{Index, IndexMut},
};

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use image::{RgbImage, imageops::FilterType};

use crate::{Error, Result};

/// Predefined RGB color constants from the `smart_leds` crate.
#[doc(inline)]
pub use smart_leds::colors;

/// RGB color type stored in frames.
pub use smart_leds::RGB8;

/// Convert colors to [`RGB8`].
pub trait ToRgb8 {
    /// Convert this color to [`RGB8`].
    #[must_use]
    fn to_rgb8(self) -> RGB8;
}

impl ToRgb8 for RGB8 {
    #[inline]
    fn to_rgb8(self) -> RGB8 {
        self
    }
}

impl ToRgb8 for Rgb888 {
    #[inline]
    fn to_rgb8(self) -> RGB8 {
        RGB8::new(self.r(), self.g(), self.b())
    }
}

/// Convert colors to [`Rgb888`] for embedded-graphics drawing.
pub trait ToRgb888 {
    /// Convert this color to [`Rgb888`].
    #[must_use]
    fn to_rgb888(self) -> Rgb888;
}

impl ToRgb888 for RGB8 {
    #[inline]
    fn to_rgb888(self) -> Rgb888 {
        Rgb888::new(self.r, self.g, self.b)
    }
}

impl ToRgb888 for Rgb888 {
    #[inline]
    fn to_rgb888(self) -> Rgb888 {
        self
    }
}

const BLACK: RGB8 = RGB8::new(0, 0, 0);

/// A `width × height` image stored row-major, `(0, 0)` top-left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<RGB8>,
}

impl Frame {
    /// Create a blank (all black) frame.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, BLACK)
    }

    /// Create a frame filled with a single color.
    #[must_use]
    pub fn filled(width: usize, height: usize, color: RGB8) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Build a frame from row-major RGB bytes, as carried by a datagram.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameSize`] if `bytes.len() != width * height * 3`.
    pub fn from_rgb_bytes(width: usize, height: usize, bytes: &[u8]) -> Result<Self> {
        let expected = width * height * 3;
        if bytes.len() != expected {
            return Err(Error::FrameSize {
                width,
                height,
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(3)
            .map(|rgb| RGB8::new(rgb[0], rgb[1], rgb[2]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Row-major RGB bytes.
    #[must_use]
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|pixel| [pixel.r, pixel.g, pixel.b])
            .collect()
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total pixel count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the frame has no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixels in row-major order.
    #[must_use]
    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    /// Reinterpret the same row-major pixels with different dimensions.
    ///
    /// Returns `None` if `width * height` differs from the pixel count.
    #[must_use]
    pub fn reshaped(self, width: usize, height: usize) -> Option<Self> {
        (width * height == self.pixels.len()).then(|| Self {
            width,
            height,
            pixels: self.pixels,
        })
    }

    /// Nearest-neighbour resize.
    #[must_use]
    pub fn resized(&self, width: usize, height: usize) -> Self {
        if width == 0 || height == 0 || self.is_empty() {
            return Self::new(width, height);
        }
        let resized = image::imageops::resize(
            &self.to_rgb_image(),
            width as u32,
            height as u32,
            FilterType::Nearest,
        );
        Self::from(resized)
    }

    /// Copy into an [`RgbImage`].
    #[must_use]
    pub fn to_rgb_image(&self) -> RgbImage {
        let mut image = RgbImage::new(self.width as u32, self.height as u32);
        for (target, pixel) in image.pixels_mut().zip(&self.pixels) {
            *target = image::Rgb([pixel.r, pixel.g, pixel.b]);
        }
        image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let pixels = image
            .pixels()
            .map(|&image::Rgb([r, g, b])| RGB8::new(r, g, b))
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl Index<(usize, usize)> for Frame {
    type Output = RGB8;

    fn index(&self, (x_index, y_index): (usize, usize)) -> &Self::Output {
        assert!(x_index < self.width, "x_index must be within width");
        assert!(y_index < self.height, "y_index must be within height");
        &self.pixels[y_index * self.width + x_index]
    }
}

impl IndexMut<(usize, usize)> for Frame {
    fn index_mut(&mut self, (x_index, y_index): (usize, usize)) -> &mut Self::Output {
        assert!(x_index < self.width, "x_index must be within width");
        assert!(y_index < self.height, "y_index must be within height");
        &mut self.pixels[y_index * self.width + x_index]
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.width as u32, self.height as u32)
    }
}

impl DrawTarget for Frame {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> core::result::Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels {
            let (Ok(x_index), Ok(y_index)) = (usize::try_from(coord.x), usize::try_from(coord.y))
            else {
                continue;
            };
            if x_index < self.width && y_index < self.height {
                self.pixels[y_index * self.width + x_index] = color.to_rgb8();
            }
        }
        Ok(())
    }
}

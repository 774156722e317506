//! Scrolling text.

use core::{fmt, str::FromStr};
use std::sync::Arc;

use embedded_graphics::{
    Drawable,
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{
            FONT_4X6, FONT_5X7, FONT_5X8, FONT_6X9, FONT_6X10, FONT_6X12, FONT_6X13,
            FONT_6X13_BOLD, FONT_7X13, FONT_7X13_BOLD, FONT_7X14, FONT_8X13, FONT_9X15,
            FONT_9X18, FONT_10X20,
        },
    },
    prelude::Point,
    text::{Baseline, Text},
};
use serde::Deserialize;

use crate::{
    frame::{Frame, RGB8, ToRgb888, colors},
    idle::Filler,
};

/// Mono fonts available for idle text, named `<width>x<height>` as in the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum TextFont {
    /// `4x6`
    Font4x6,
    /// `5x7`
    Font5x7,
    /// `5x8`
    Font5x8,
    /// `6x9`
    Font6x9,
    /// `6x10`
    #[default]
    Font6x10,
    /// `6x12`
    Font6x12,
    /// `6x13`
    Font6x13,
    /// `6x13bold`
    Font6x13Bold,
    /// `7x13`
    Font7x13,
    /// `7x13bold`
    Font7x13Bold,
    /// `7x14`
    Font7x14,
    /// `8x13`
    Font8x13,
    /// `9x15`
    Font9x15,
    /// `9x18`
    Font9x18,
    /// `10x20`
    Font10x20,
}

const FONT_NAMES: [(&str, TextFont); 15] = [
    ("4x6", TextFont::Font4x6),
    ("5x7", TextFont::Font5x7),
    ("5x8", TextFont::Font5x8),
    ("6x9", TextFont::Font6x9),
    ("6x10", TextFont::Font6x10),
    ("6x12", TextFont::Font6x12),
    ("6x13", TextFont::Font6x13),
    ("6x13bold", TextFont::Font6x13Bold),
    ("7x13", TextFont::Font7x13),
    ("7x13bold", TextFont::Font7x13Bold),
    ("7x14", TextFont::Font7x14),
    ("8x13", TextFont::Font8x13),
    ("9x15", TextFont::Font9x15),
    ("9x18", TextFont::Font9x18),
    ("10x20", TextFont::Font10x20),
];

impl TextFont {
    /// Return the `MonoFont` for this variant.
    #[must_use]
    pub const fn to_font(self) -> MonoFont<'static> {
        match self {
            Self::Font4x6 => FONT_4X6,
            Self::Font5x7 => FONT_5X7,
            Self::Font5x8 => FONT_5X8,
            Self::Font6x9 => FONT_6X9,
            Self::Font6x10 => FONT_6X10,
            Self::Font6x12 => FONT_6X12,
            Self::Font6x13 => FONT_6X13,
            Self::Font6x13Bold => FONT_6X13_BOLD,
            Self::Font7x13 => FONT_7X13,
            Self::Font7x13Bold => FONT_7X13_BOLD,
            Self::Font7x14 => FONT_7X14,
            Self::Font8x13 => FONT_8X13,
            Self::Font9x15 => FONT_9X15,
            Self::Font9x18 => FONT_9X18,
            Self::Font10x20 => FONT_10X20,
        }
    }

    fn name(self) -> &'static str {
        FONT_NAMES
            .iter()
            .find(|(_, font)| *font == self)
            .map_or("?", |(name, _)| *name)
    }
}

impl fmt::Display for TextFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextFont {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim().to_ascii_lowercase();
        FONT_NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, font)| *font)
            .ok_or_else(|| {
                let known: Vec<&str> = FONT_NAMES.iter().map(|(known, _)| *known).collect();
                format!("unknown font {name:?}, expected one of {}", known.join(", "))
            })
    }
}

impl TryFrom<String> for TextFont {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        name.parse()
    }
}

/// Render `text` once into an image as tall as the panel.
///
/// The image is at least `panel_width` wide so short messages do not repeat. The text is
/// centered vertically; when the padding is odd the extra row goes below. Colors cycle per
/// character and default to white. Text taller than the panel is clipped at the bottom.
#[must_use]
pub fn render_text_image(
    text: &str,
    font: TextFont,
    text_colors: &[RGB8],
    panel_width: usize,
    panel_height: usize,
) -> Frame {
    let font = font.to_font();
    let advance = (font.character_size.width + font.character_spacing) as usize;
    let glyph_height = font.character_size.height as usize;
    let text_width = text.chars().count() * advance;

    let mut image = Frame::new(text_width.max(panel_width).max(1), panel_height);
    let padding = panel_height.saturating_sub(glyph_height);
    let top = (padding / 2) as i32;

    let mut x = 0i32;
    for (index, ch) in text.chars().enumerate() {
        let color = if text_colors.is_empty() {
            colors::WHITE
        } else {
            text_colors[index % text_colors.len()]
        };
        let mut buf = [0u8; 4];
        let style = MonoTextStyle::new(&font, color.to_rgb888());
        let glyph = Text::with_baseline(ch.encode_utf8(&mut buf), Point::new(x, top), style, Baseline::Top);
        // Frame's DrawTarget is infallible and clips.
        let Ok(_) = glyph.draw(&mut image);
        x += advance as i32;
    }
    image
}

/// Scrolls a pre-rendered text image one pixel per frame, wrapping at the image width.
pub struct TextScroller {
    image: Arc<Frame>,
    width: usize,
    height: usize,
    offset: usize,
}

impl TextScroller {
    /// Scroll `image` across a `width × height` panel, starting at its left edge.
    #[must_use]
    pub const fn new(image: Arc<Frame>, width: usize, height: usize) -> Self {
        Self {
            image,
            width,
            height,
            offset: 0,
        }
    }
}

impl Filler for TextScroller {
    fn name(&self) -> &'static str {
        "text"
    }

    fn next_frame(&mut self) -> Frame {
        let mut frame = Frame::new(self.width, self.height);
        let image_width = self.image.width();
        if image_width == 0 {
            return frame;
        }
        let rows = self.height.min(self.image.height());
        for y_index in 0..rows {
            for x_index in 0..self.width {
                frame[(x_index, y_index)] = self.image[((self.offset + x_index) % image_width, y_index)];
            }
        }
        self.offset = (self.offset + 1) % image_width;
        frame
    }
}

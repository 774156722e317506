//! Idle content shown while no live frames arrive.
//!
//! A [`Filler`] is a frame generator. The [`Arbiter`](crate::arbiter::Arbiter) polls it at a
//! fixed cadence, so a filler never touches the panel itself and stopping one is just
//! dropping it. Fillers are created on demand by a [`FillerFactory`]; [`IdleContent`] is
//! the factory built from configuration, with all expensive work (text rendering, image
//! decoding) done once up front.

pub mod animation;
pub mod life;
pub mod text;

use std::{path::PathBuf, sync::Arc};

use serde::Deserialize;
use tracing::info;

pub use animation::AnimationPlayer;
pub use life::LifeFiller;
pub use text::{TextFont, TextScroller};

use crate::{Result, frame::Frame, frame::RGB8, panel::PanelGeometry};

/// Produces one frame per cadence tick while the panel is idle.
pub trait Filler: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The next frame to show.
    fn next_frame(&mut self) -> Frame;
}

/// Creates a fresh [`Filler`] each time the panel goes idle.
pub trait FillerFactory: Send {
    /// Start a new filler, or `None` if there is no idle content.
    fn start_filler(&mut self) -> Option<Box<dyn Filler>>;
}

impl<F> FillerFactory for F
where
    F: FnMut() -> Option<Box<dyn Filler>> + Send,
{
    fn start_filler(&mut self) -> Option<Box<dyn Filler>> {
        self()
    }
}

/// `[idle.content]` section of the configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum IdleContentConfig {
    /// Scroll a message across the panel.
    Text {
        /// Message to scroll.
        message: String,
        /// Mono font, e.g. `"6x10"`.
        #[serde(default)]
        font: TextFont,
        /// Colors cycled per character; empty means white.
        #[serde(default)]
        colors: Vec<[u8; 3]>,
    },
    /// Loop an animated GIF (or show a still image).
    Animation {
        /// Image file.
        path: PathBuf,
    },
    /// Conway's Game of Life.
    Life {
        /// Cadence ticks per generation.
        #[serde(default = "default_generation_frames")]
        generation_frames: u32,
    },
    /// Blank the panel.
    #[default]
    Off,
}

const fn default_generation_frames() -> u32 {
    4
}

#[derive(Clone, Debug)]
enum Content {
    Off,
    Text(Arc<Frame>),
    Animation(Arc<[Frame]>),
    Life { generation_frames: u32 },
}

/// Prepared idle content for one panel size.
#[derive(Clone, Debug)]
pub struct IdleContent {
    content: Content,
    width: usize,
    height: usize,
}

impl IdleContent {
    /// Render text or decode images for `geometry`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`](crate::Error::Image) if an animation cannot be decoded, or
    /// [`Error::Config`](crate::Error::Config) if it has no frames.
    pub fn prepare(config: &IdleContentConfig, geometry: &PanelGeometry) -> Result<Self> {
        let (width, height) = (geometry.width(), geometry.height());
        let content = match config {
            IdleContentConfig::Off => Content::Off,
            IdleContentConfig::Text {
                message,
                font,
                colors,
            } => {
                let colors: Vec<RGB8> = colors.iter().map(|&[r, g, b]| RGB8::new(r, g, b)).collect();
                let image = text::render_text_image(message, *font, &colors, width, height);
                info!(text = %message, image_width = image.width(), "rendered idle text");
                Content::Text(Arc::new(image))
            }
            IdleContentConfig::Animation { path } => {
                let frames = animation::load_animation(path, width, height)?;
                info!(path = %path.display(), frames = frames.len(), "loaded idle animation");
                Content::Animation(frames.into())
            }
            IdleContentConfig::Life { generation_frames } => Content::Life {
                generation_frames: *generation_frames,
            },
        };
        Ok(Self {
            content,
            width,
            height,
        })
    }

    /// Whether any filler will be produced.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        matches!(self.content, Content::Off)
    }
}

impl FillerFactory for IdleContent {
    fn start_filler(&mut self) -> Option<Box<dyn Filler>> {
        match &self.content {
            Content::Off => None,
            Content::Text(image) => Some(Box::new(TextScroller::new(
                Arc::clone(image),
                self.width,
                self.height,
            ))),
            Content::Animation(frames) => Some(Box::new(AnimationPlayer::new(Arc::clone(frames)))),
            Content::Life { generation_frames } => Some(Box::new(LifeFiller::new(
                self.width,
                self.height,
                *generation_frames,
            ))),
        }
    }
}

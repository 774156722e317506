//! Looping GIF animations and still images.

use std::{fs::File, io::BufReader, path::Path, sync::Arc};

use image::{AnimationDecoder, DynamicImage, ImageError, codecs::gif::GifDecoder};

use crate::{Error, Result, frame::Frame, idle::Filler};

/// Decode every frame of `path`, converted to RGB and resized to `width × height`.
///
/// `.gif` files are decoded as animations; anything else is opened as a single still image.
/// Frame delays in the file are ignored: frames advance at the idle cadence.
///
/// # Errors
///
/// Returns [`Error::Image`] if the file cannot be read or decoded, and [`Error::Config`] if
/// it holds no frames.
pub fn load_animation(path: &Path, width: usize, height: usize) -> Result<Vec<Frame>> {
    let is_gif = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("gif"));

    let images: Vec<DynamicImage> = if is_gif {
        let file = File::open(path).map_err(ImageError::IoError)?;
        let decoder = GifDecoder::new(BufReader::new(file))?;
        decoder
            .into_frames()
            .collect_frames()?
            .into_iter()
            .map(|frame| DynamicImage::ImageRgba8(frame.into_buffer()))
            .collect()
    } else {
        vec![image::open(path)?]
    };

    if images.is_empty() {
        return Err(Error::config(format!(
            "{} contains no frames",
            path.display()
        )));
    }

    Ok(images
        .into_iter()
        .map(|image| Frame::from(image.to_rgb8()).resized(width, height))
        .collect())
}

/// Shows the frames of an animation in order, looping forever.
pub struct AnimationPlayer {
    frames: Arc<[Frame]>,
    next: usize,
}

impl AnimationPlayer {
    /// Start at the first frame.
    #[must_use]
    pub const fn new(frames: Arc<[Frame]>) -> Self {
        Self { frames, next: 0 }
    }
}

impl Filler for AnimationPlayer {
    fn name(&self) -> &'static str {
        "animation"
    }

    fn next_frame(&mut self) -> Frame {
        let Some(frame) = self.frames.get(self.next) else {
            return Frame::new(0, 0);
        };
        let frame = frame.clone();
        self.next = (self.next + 1) % self.frames.len();
        frame
    }
}

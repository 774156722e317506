#![allow(missing_docs)]
#![allow(clippy::unwrap_used, reason = "tests fail loudly on unexpected errors")]
//! Host-level tests for frames and color conversion.

use crate_matrix::{
    Error,
    frame::{Frame, RGB8, ToRgb8, ToRgb888, colors},
};
use embedded_graphics::{
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
};

#[test]
fn rgb888_to_rgb8_matches_rgb8() {
    let rgb8_color = RGB8::new(16, 32, 48);
    let rgb888_color = Rgb888::new(16, 32, 48);

    assert_eq!(rgb8_color, rgb888_color.to_rgb8());
}

#[test]
fn rgb8_to_rgb888_matches_rgb888() {
    let rgb8_color = RGB8::new(16, 32, 48);
    let rgb888_color = Rgb888::new(16, 32, 48);

    assert_eq!(rgb888_color, rgb8_color.to_rgb888());
}

#[test]
fn rgb_bytes_are_row_major() {
    let bytes: Vec<u8> = (0..18).collect();
    let frame = Frame::from_rgb_bytes(3, 2, &bytes).unwrap();

    assert_eq!(frame[(0, 0)], RGB8::new(0, 1, 2));
    assert_eq!(frame[(2, 0)], RGB8::new(6, 7, 8));
    assert_eq!(frame[(0, 1)], RGB8::new(9, 10, 11));
    assert_eq!(frame.to_rgb_bytes(), bytes);
}

#[test]
fn rgb_bytes_of_wrong_length_are_rejected() {
    let result = Frame::from_rgb_bytes(3, 2, &[0; 17]);
    assert!(matches!(
        result,
        Err(Error::FrameSize {
            width: 3,
            height: 2,
            expected: 18,
            actual: 17,
        })
    ));
}

#[test]
fn reshape_keeps_pixel_order() {
    let bytes: Vec<u8> = (0..18).collect();
    let frame = Frame::from_rgb_bytes(6, 1, &bytes).unwrap();

    let reshaped = frame.clone().reshaped(2, 3).unwrap();
    assert_eq!(reshaped.width(), 2);
    assert_eq!(reshaped[(1, 2)], RGB8::new(15, 16, 17));
    assert!(frame.reshaped(4, 4).is_none());
}

#[test]
fn nearest_resize_scales_blocks() {
    let mut frame = Frame::new(2, 1);
    frame[(0, 0)] = colors::RED;
    frame[(1, 0)] = colors::BLUE;

    let resized = frame.resized(4, 2);
    assert_eq!((resized.width(), resized.height()), (4, 2));
    assert_eq!(resized[(0, 1)], colors::RED);
    assert_eq!(resized[(1, 0)], colors::RED);
    assert_eq!(resized[(2, 0)], colors::BLUE);
    assert_eq!(resized[(3, 1)], colors::BLUE);
}

#[test]
fn drawing_clips_to_frame() {
    let mut frame = Frame::new(4, 3);
    Rectangle::new(Point::new(-2, -2), Size::new(10, 10))
        .into_styled(PrimitiveStyle::with_fill(colors::LIME.to_rgb888()))
        .draw(&mut frame)
        .unwrap();

    assert!(frame.pixels().iter().all(|&pixel| pixel == colors::LIME));
}

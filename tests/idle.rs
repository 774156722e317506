#![allow(missing_docs)]
#![allow(clippy::unwrap_used, reason = "tests fail loudly on unexpected errors")]
//! Idle content: text rendering and scrolling, animations, Game of Life.

use std::sync::Arc;

use crate_matrix::{
    Error,
    frame::{Frame, RGB8, colors},
    idle::{
        AnimationPlayer, Filler, FillerFactory, IdleContent, IdleContentConfig, LifeFiller,
        TextFont, TextScroller, animation::load_animation, text::render_text_image,
    },
    panel::PanelGeometry,
};
use image::{Rgb, RgbImage, Rgba, RgbaImage, codecs::gif::GifEncoder};

const BLACK: RGB8 = RGB8::new(0, 0, 0);

fn row(frame: &Frame, y_index: usize) -> Vec<RGB8> {
    (0..frame.width()).map(|x_index| frame[(x_index, y_index)]).collect()
}

fn lit(frame: &Frame) -> usize {
    frame.pixels().iter().filter(|&&pixel| pixel != BLACK).count()
}

#[test]
fn font_names_parse() {
    assert_eq!("6x10".parse::<TextFont>(), Ok(TextFont::Font6x10));
    assert_eq!(" 7X13 ".parse::<TextFont>(), Ok(TextFont::Font7x13));
    assert_eq!(TextFont::default(), TextFont::Font6x10);
    assert_eq!(TextFont::Font9x15.to_string(), "9x15");
    assert!("3x3".parse::<TextFont>().is_err());
}

#[test]
fn short_text_is_padded_to_panel_width() {
    let image = render_text_image("Hi", TextFont::Font6x10, &[], 15, 12);

    assert_eq!((image.width(), image.height()), (15, 12));
    assert!(lit(&image) > 0);
    assert!(image.pixels().iter().all(|&pixel| pixel == BLACK || pixel == colors::WHITE));
    // Nothing drawn past the two glyphs.
    assert!((12..15).all(|x_index| (0..12).all(|y_index| image[(x_index, y_index)] == BLACK)));
}

#[test]
fn long_text_sets_image_width() {
    let image = render_text_image("Hello, world", TextFont::Font6x10, &[], 15, 12);
    assert_eq!(image.width(), 12 * 6);
}

#[test]
fn text_is_centered_with_extra_row_below() {
    // 6x10 glyphs: 2 spare rows put 1 above; 3 spare rows still put 1 above; 4 put 2 above.
    let even = render_text_image("H", TextFont::Font6x10, &[], 6, 12);
    let odd = render_text_image("H", TextFont::Font6x10, &[], 6, 13);
    let more = render_text_image("H", TextFont::Font6x10, &[], 6, 14);

    for y_index in 0..12 {
        assert_eq!(row(&odd, y_index), row(&even, y_index));
        assert_eq!(row(&more, y_index + 1), row(&even, y_index));
    }
    assert!(row(&odd, 12).iter().all(|&pixel| pixel == BLACK));
}

#[test]
fn colors_cycle_per_character() {
    let image = render_text_image("HHH", TextFont::Font6x10, &[colors::RED, colors::LIME], 18, 10);
    for y_index in 0..10 {
        for x_index in 0..18 {
            let pixel = image[(x_index, y_index)];
            if pixel == BLACK {
                continue;
            }
            let expected = if (6..12).contains(&x_index) { colors::LIME } else { colors::RED };
            assert_eq!(pixel, expected, "({x_index}, {y_index})");
        }
    }
}

#[test]
fn scroller_shifts_one_pixel_and_wraps() {
    let pixels: Vec<u8> = (0..4).flat_map(|value| [value, 0, 0]).collect();
    let image = Arc::new(Frame::from_rgb_bytes(4, 1, &pixels).unwrap());
    let mut scroller = TextScroller::new(image, 3, 1);

    let reds = |frame: Frame| -> Vec<u8> { frame.pixels().iter().map(|pixel| pixel.r).collect() };
    assert_eq!(reds(scroller.next_frame()), [0, 1, 2]);
    assert_eq!(reds(scroller.next_frame()), [1, 2, 3]);
    assert_eq!(reds(scroller.next_frame()), [2, 3, 0]);
    assert_eq!(reds(scroller.next_frame()), [3, 0, 1]);
    assert_eq!(reds(scroller.next_frame()), [0, 1, 2]);
}

#[test]
fn animation_player_loops() {
    let frames: Arc<[Frame]> = vec![
        Frame::filled(1, 1, colors::RED),
        Frame::filled(1, 1, colors::BLUE),
    ]
    .into();
    let mut player = AnimationPlayer::new(frames);

    let shown: Vec<RGB8> = (0..5).map(|_| player.next_frame()[(0, 0)]).collect();
    assert_eq!(
        shown,
        [colors::RED, colors::BLUE, colors::RED, colors::BLUE, colors::RED]
    );
}

#[test]
fn gif_frames_are_decoded_and_resized() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("idle.gif");
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GifEncoder::new(file);
        let frames = [[255, 0, 0, 255], [0, 255, 0, 255], [0, 0, 255, 255]]
            .into_iter()
            .map(|color| image::Frame::new(RgbaImage::from_pixel(4, 4, Rgba(color))));
        encoder.encode_frames(frames).unwrap();
    }

    let frames = load_animation(&path, 2, 3).unwrap();
    assert_eq!(frames.len(), 3);
    for (frame, channel) in frames.iter().zip(0..) {
        assert_eq!((frame.width(), frame.height()), (2, 3));
        let pixel = frame[(1, 2)];
        let values = [pixel.r, pixel.g, pixel.b];
        for (index, value) in values.into_iter().enumerate() {
            if index == channel {
                assert!(value > 200, "{values:?}");
            } else {
                assert!(value < 50, "{values:?}");
            }
        }
    }
}

#[test]
fn still_image_is_one_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.png");
    RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])).save(&path).unwrap();

    let frames = load_animation(&path, 4, 2).unwrap();
    assert_eq!(frames, [Frame::filled(4, 2, RGB8::new(1, 2, 3))]);
}

#[test]
fn missing_animation_is_an_image_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_animation(&dir.path().join("missing.gif"), 4, 2);
    assert!(matches!(result, Err(Error::Image(_))));
}

#[test]
fn life_seeds_within_bounds() {
    for seed in 0..20 {
        let life = LifeFiller::with_seed(8, 6, 4, seed);
        let alive = life.live_cells();
        assert!((4..=32).contains(&alive), "seed {seed}: {alive} cells");
    }
}

#[test]
fn life_blinker_oscillates() {
    let mut life = LifeFiller::with_seed(5, 5, 1, 0);
    life.set_cells([(1, 2), (2, 2), (3, 2)]);
    life.step();

    assert!(life.is_alive(2, 1) && life.is_alive(2, 2) && life.is_alive(2, 3));
    assert_eq!(life.live_cells(), 3);
}

#[test]
fn life_edges_do_not_wrap() {
    let mut life = LifeFiller::with_seed(5, 5, 1, 0);
    life.set_cells([(0, 1), (0, 2), (0, 3)]);
    life.step();

    assert_eq!(life.live_cells(), 2);
    assert!(life.is_alive(0, 2) && life.is_alive(1, 2));
}

#[test]
fn life_reseeds_after_stasis() {
    let block = [(2, 2), (3, 2), (2, 3), (3, 3)];
    let mut life = LifeFiller::with_seed(6, 6, 1, 7);
    life.set_cells(block);
    for _ in 0..14 {
        life.step();
    }
    assert_eq!(life.live_cells(), 4);
    assert!(block.iter().all(|&(x, y)| life.is_alive(x, y)));

    life.step();
    let same = life.live_cells() == 4 && block.iter().all(|&(x, y)| life.is_alive(x, y));
    assert!(!same, "board was not reseeded");
}

#[test]
fn life_advances_every_generation_frames() {
    let mut life = LifeFiller::with_seed(5, 5, 3, 0);
    life.set_cells([(1, 2), (2, 2), (3, 2)]);

    let horizontal = life.next_frame();
    assert_eq!(life.next_frame(), horizontal);
    assert_eq!(life.next_frame(), horizontal);
    let vertical = life.next_frame();
    assert_ne!(vertical, horizontal);
    assert_ne!(vertical[(2, 1)], BLACK);
}

#[test]
fn life_colors_by_band() {
    // 14 rows over 7 colors: bands of 2 rows.
    let mut life = LifeFiller::with_seed(3, 14, 4, 0);
    life.set_cells([(0, 0), (0, 2), (0, 13)]);
    let frame = life.next_frame();

    assert_eq!(frame[(0, 0)], colors::WHITE);
    assert_eq!(frame[(0, 2)], colors::BLUE);
    assert_eq!(frame[(0, 13)], colors::RED);
}

#[test]
fn idle_content_builds_matching_fillers() {
    let geometry = PanelGeometry::new(3, 3, 5, 4).unwrap();

    let mut text = IdleContent::prepare(
        &IdleContentConfig::Text {
            message: "Hello".to_owned(),
            font: TextFont::Font5x8,
            colors: vec![[255, 0, 0]],
        },
        &geometry,
    )
    .unwrap();
    let mut filler = text.start_filler().unwrap();
    assert_eq!(filler.name(), "text");
    let frame = filler.next_frame();
    assert_eq!((frame.width(), frame.height()), (15, 12));

    let mut life = IdleContent::prepare(&IdleContentConfig::Life { generation_frames: 4 }, &geometry).unwrap();
    assert_eq!(life.start_filler().unwrap().name(), "life");

    let mut off = IdleContent::prepare(&IdleContentConfig::Off, &geometry).unwrap();
    assert!(off.is_off());
    assert!(off.start_filler().is_none());
}

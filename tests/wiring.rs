#![allow(missing_docs)]
#![allow(clippy::unwrap_used, reason = "tests fail loudly on unexpected errors")]
//! Host-level tests for the per-crate wiring transform.

use crate_matrix::{
    frame::{Frame, RGB8},
    panel::{
        Orientation,
        orientation::{ALL_ORIENTATIONS, Parity, transform_block, transform_crate},
    },
};

// Pixel (x, y) is colored (x, y, 7) so the output names its source.
fn labelled(width: usize, height: usize) -> Frame {
    let mut frame = Frame::new(width, height);
    for y_index in 0..height {
        for x_index in 0..width {
            frame[(x_index, y_index)] = RGB8::new(x_index as u8, y_index as u8, 7);
        }
    }
    frame
}

fn order(bytes: &[u8]) -> Vec<(u8, u8)> {
    bytes.chunks_exact(3).map(|rgb| (rgb[0], rgb[1])).collect()
}

#[test]
fn bottom_left_runs_up_the_first_column() {
    let out = transform_block(&labelled(2, 3), Orientation::BottomLeft);
    assert_eq!(order(&out), [(0, 2), (0, 1), (0, 0), (1, 0), (1, 1), (1, 2)]);
}

#[test]
fn bottom_right_runs_up_the_last_column() {
    let out = transform_block(&labelled(2, 3), Orientation::BottomRight);
    assert_eq!(order(&out), [(1, 2), (1, 1), (1, 0), (0, 0), (0, 1), (0, 2)]);
}

#[test]
fn top_left_runs_down_the_first_column() {
    let out = transform_block(&labelled(2, 3), Orientation::TopLeft);
    assert_eq!(order(&out), [(0, 0), (0, 1), (0, 2), (1, 2), (1, 1), (1, 0)]);
}

#[test]
fn top_right_runs_down_the_last_column() {
    let out = transform_block(&labelled(2, 3), Orientation::TopRight);
    assert_eq!(order(&out), [(1, 0), (1, 1), (1, 2), (0, 2), (0, 1), (0, 0)]);
}

#[test]
fn wiring_table_matches_orientations() {
    let table: Vec<(bool, bool, Parity)> = ALL_ORIENTATIONS
        .iter()
        .map(|orientation| {
            let wiring = orientation.wiring();
            (wiring.row_flip, wiring.column_flip, wiring.reversed_columns)
        })
        .collect();
    assert_eq!(
        table,
        [
            (false, false, Parity::Odd),
            (true, false, Parity::Odd),
            (false, false, Parity::Even),
            (true, false, Parity::Even),
        ]
    );
}

#[test]
fn output_length_is_one_crate_for_every_orientation() {
    let frame = labelled(5, 4);
    for orientation in ALL_ORIENTATIONS {
        assert_eq!(transform_block(&frame, orientation).len(), 5 * 4 * 3, "{orientation}");
    }
}

#[test]
fn undoing_the_serpentine_restores_column_major_order() {
    let (width, height) = (5, 4);
    let frame = labelled(width, height);
    for orientation in ALL_ORIENTATIONS {
        let wiring = orientation.wiring();
        let mut lines: Vec<Vec<(u8, u8)>> = order(&transform_block(&frame, orientation))
            .chunks_exact(height)
            .map(<[(u8, u8)]>::to_vec)
            .collect();

        // Inverse: un-reverse the serpentine lines, then undo the row flip.
        for (line_index, line) in lines.iter_mut().enumerate() {
            if wiring.column_flip ^ wiring.reversed_columns.matches(line_index + 1) {
                line.reverse();
            }
        }
        if wiring.row_flip {
            lines.reverse();
        }

        let expected: Vec<Vec<(u8, u8)>> = (0..width as u8)
            .map(|x| (0..height as u8).map(|y| (x, y)).collect())
            .collect();
        assert_eq!(lines, expected, "{orientation}");
    }
}

#[test]
fn transform_reads_only_its_region() {
    let frame = labelled(6, 4);
    let mut out = vec![0xAA];
    transform_crate(&frame, (3, 2), (3, 2), Orientation::TopLeft, &mut out);

    assert_eq!(out.len(), 1 + 3 * 2 * 3);
    assert_eq!(order(&out[1..]), [(3, 2), (3, 3), (4, 3), (4, 2), (5, 2), (5, 3)]);
}

#[test]
#[should_panic(expected = "inside the frame")]
fn transform_panics_outside_the_frame() {
    let frame = labelled(4, 4);
    let mut out = Vec::new();
    transform_crate(&frame, (2, 0), (3, 4), Orientation::BottomLeft, &mut out);
}

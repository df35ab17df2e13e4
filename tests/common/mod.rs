//! Synthetic keyboard frames shared by the integration tests
#![allow(dead_code)]

use piano2midi::calibration::{KeyColor, KeyColors, KeySegments};
use piano2midi::color::{HsvRange, Range};
use piano2midi::keys::{BLACK_KEYS, WHITE_KEYS};
use piano2midi::segments::KeySegment;
use piano2midi::video::Frame;
use ndarray::Array3;

/// Pixels per key slot; each key occupies the first `KEY_WIDTH` of its slot
pub const SLOT: usize = 20;
pub const KEY_WIDTH: usize = 10;
pub const HEIGHT: usize = 4;
pub const WIDTH: usize = (WHITE_KEYS + BLACK_KEYS) * SLOT;
/// Scan line at 50% of a 4 pixel frame is row 2
pub const SCAN_LINE_PCT: u32 = 50;
pub const SCAN_ROW: usize = 2;

pub const BACKGROUND: [u8; 3] = [128, 128, 128];

/// Zone colours, chosen far apart in hue
pub fn zone_rgb(zone: KeyColor) -> [u8; 3] {
    match zone {
        KeyColor::LeftWhite => [255, 0, 0],   // h = 0
        KeyColor::RightWhite => [0, 255, 0],  // h = 60
        KeyColor::LeftBlack => [0, 0, 255],   // h = 120
        KeyColor::RightBlack => [255, 255, 0], // h = 30
    }
}

fn zone_hue(zone: KeyColor) -> u8 {
    match zone {
        KeyColor::LeftWhite => 0,
        KeyColor::RightWhite => 60,
        KeyColor::LeftBlack => 120,
        KeyColor::RightBlack => 30,
    }
}

pub fn test_colors() -> KeyColors {
    let mut colors = KeyColors::default();
    for zone in KeyColor::ALL {
        let hue = zone_hue(zone);
        colors.set(
            zone,
            HsvRange {
                h: Range::new(hue.saturating_sub(5), hue + 5),
                s: Range::new(100, 255),
                v: Range::new(100, 255),
            },
        );
    }
    colors
}

/// White keys fill the left part of the scan line, black keys the right part
pub fn test_segments() -> KeySegments {
    let slot = |i: usize| KeySegment {
        start: i * SLOT,
        end: i * SLOT + KEY_WIDTH - 1,
    };
    KeySegments {
        white: (0..WHITE_KEYS).map(slot).collect(),
        black: (WHITE_KEYS..WHITE_KEYS + BLACK_KEYS).map(slot).collect(),
    }
}

pub fn blank_frame() -> Frame {
    let mut frame = Array3::<u8>::zeros((HEIGHT, WIDTH, 3));
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            for c in 0..3 {
                frame[[y, x, c]] = BACKGROUND[c];
            }
        }
    }
    frame
}

pub fn paint(frame: &mut Frame, x_range: std::ops::Range<usize>, rgb: [u8; 3]) {
    for x in x_range {
        for c in 0..3 {
            frame[[SCAN_ROW, x, c]] = rgb[c];
        }
    }
}

/// First pixel of a key's segment
pub fn key_x(zone: KeyColor, ordinal: usize) -> usize {
    match zone {
        KeyColor::LeftWhite | KeyColor::RightWhite => ordinal * SLOT,
        KeyColor::LeftBlack | KeyColor::RightBlack => (WHITE_KEYS + ordinal) * SLOT,
    }
}

/// Frame with each listed key fully lit in its zone colour
pub fn frame_with(presses: &[(KeyColor, usize)]) -> Frame {
    let mut frame = blank_frame();
    for &(zone, ordinal) in presses {
        let x = key_x(zone, ordinal);
        paint(&mut frame, x..x + KEY_WIDTH, zone_rgb(zone));
    }
    frame
}

//! Persisted calibration data: key segments and zone colour ranges

use crate::color::{mask_row, HsvRange};
use crate::error::{PianoError, Result as PianoErrorResult};
use crate::keys::{BLACK_KEYS, WHITE_KEYS};
use crate::segments::{KeySegment, SegmentDetector};
use crate::video::{extract_scan_line, scan_line_px, Frame};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Colour class of a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    White,
    Black,
}

impl KeyKind {
    /// Number of keys of this colour on an 88-key piano
    pub fn expected_count(self) -> usize {
        match self {
            KeyKind::White => WHITE_KEYS,
            KeyKind::Black => BLACK_KEYS,
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::White => write!(f, "white"),
            KeyKind::Black => write!(f, "black"),
        }
    }
}

impl FromStr for KeyKind {
    type Err = PianoError;

    fn from_str(s: &str) -> PianoErrorResult<Self> {
        match s {
            "white" => Ok(KeyKind::White),
            "black" => Ok(KeyKind::Black),
            other => Err(PianoError::OutOfRange(format!("unknown key kind: {}", other))),
        }
    }
}

/// One of the four hand/colour zones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyColor {
    LeftWhite,
    LeftBlack,
    RightWhite,
    RightBlack,
}

impl KeyColor {
    pub const ALL: [KeyColor; 4] = [
        KeyColor::LeftWhite,
        KeyColor::LeftBlack,
        KeyColor::RightWhite,
        KeyColor::RightBlack,
    ];

    pub fn name(self) -> &'static str {
        match self {
            KeyColor::LeftWhite => "left_white",
            KeyColor::LeftBlack => "left_black",
            KeyColor::RightWhite => "right_white",
            KeyColor::RightBlack => "right_black",
        }
    }
}

impl FromStr for KeyColor {
    type Err = PianoError;

    fn from_str(s: &str) -> PianoErrorResult<Self> {
        match s.replace('-', "_").as_str() {
            "left_white" => Ok(KeyColor::LeftWhite),
            "left_black" => Ok(KeyColor::LeftBlack),
            "right_white" => Ok(KeyColor::RightWhite),
            "right_black" => Ok(KeyColor::RightBlack),
            other => Err(PianoError::OutOfRange(format!("unknown zone: {}", other))),
        }
    }
}

/// Calibrated key extents, left to right, per colour class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySegments {
    pub white: Vec<KeySegment>,
    pub black: Vec<KeySegment>,
}

impl KeySegments {
    pub fn get(&self, kind: KeyKind) -> &[KeySegment] {
        match kind {
            KeyKind::White => &self.white,
            KeyKind::Black => &self.black,
        }
    }

    pub fn set(&mut self, kind: KeyKind, segments: Vec<KeySegment>) {
        match kind {
            KeyKind::White => self.white = segments,
            KeyKind::Black => self.black = segments,
        }
    }

    /// Require exactly 52 white and 36 black well-formed segments
    pub fn validate(&self) -> PianoErrorResult<()> {
        for kind in [KeyKind::White, KeyKind::Black] {
            if let Some((i, segment)) = self
                .get(kind)
                .iter()
                .enumerate()
                .find(|(_, s)| s.start > s.end)
            {
                return Err(PianoError::CalibrationMismatch(format!(
                    "{} key segment {} starts at {} after its end {}",
                    kind, i, segment.start, segment.end
                )));
            }
            let found = self.get(kind).len();
            if found != kind.expected_count() {
                return Err(PianoError::CalibrationMismatch(format!(
                    "expected {} {} key segments, found {}",
                    kind.expected_count(),
                    kind,
                    found
                )));
            }
        }
        Ok(())
    }

    /// Rightmost pixel referenced by any segment
    pub fn max_end(&self) -> Option<usize> {
        self.white.iter().chain(self.black.iter()).map(|s| s.end).max()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PianoErrorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PianoErrorResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Zone colour ranges; any of them may still be uncalibrated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColors {
    pub left_white: Option<HsvRange>,
    pub left_black: Option<HsvRange>,
    pub right_white: Option<HsvRange>,
    pub right_black: Option<HsvRange>,
}

impl KeyColors {
    pub fn get(&self, color: KeyColor) -> Option<&HsvRange> {
        match color {
            KeyColor::LeftWhite => self.left_white.as_ref(),
            KeyColor::LeftBlack => self.left_black.as_ref(),
            KeyColor::RightWhite => self.right_white.as_ref(),
            KeyColor::RightBlack => self.right_black.as_ref(),
        }
    }

    pub fn set(&mut self, color: KeyColor, range: HsvRange) {
        let slot = match color {
            KeyColor::LeftWhite => &mut self.left_white,
            KeyColor::LeftBlack => &mut self.left_black,
            KeyColor::RightWhite => &mut self.right_white,
            KeyColor::RightBlack => &mut self.right_black,
        };
        *slot = Some(range);
    }

    /// All four ranges, or a calibration error naming the first missing zone
    pub fn require_all(&self) -> PianoErrorResult<ZoneRanges> {
        let fetch = |color: KeyColor| -> PianoErrorResult<HsvRange> {
            let range = self.get(color).copied().ok_or_else(|| {
                PianoError::CalibrationMismatch(format!(
                    "no colour range calibrated for {}",
                    color.name()
                ))
            })?;
            range.validate()?;
            Ok(range)
        };
        Ok(ZoneRanges {
            left_white: fetch(KeyColor::LeftWhite)?,
            left_black: fetch(KeyColor::LeftBlack)?,
            right_white: fetch(KeyColor::RightWhite)?,
            right_black: fetch(KeyColor::RightBlack)?,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> PianoErrorResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> PianoErrorResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Fully calibrated colour ranges for the four zones
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRanges {
    pub left_white: HsvRange,
    pub left_black: HsvRange,
    pub right_white: HsvRange,
    pub right_black: HsvRange,
}

impl ZoneRanges {
    pub fn get(&self, color: KeyColor) -> &HsvRange {
        match color {
            KeyColor::LeftWhite => &self.left_white,
            KeyColor::LeftBlack => &self.left_black,
            KeyColor::RightWhite => &self.right_white,
            KeyColor::RightBlack => &self.right_black,
        }
    }
}

/// Detect key segments on the scan line of a single calibration frame
pub fn calibrate_segments(
    frame: &Frame,
    range: &HsvRange,
    scan_line_pct: u32,
    noise_floor_divisor: u32,
) -> PianoErrorResult<Vec<KeySegment>> {
    let row = scan_line_px(frame.shape()[0], scan_line_pct)?;
    let pixels = extract_scan_line(frame, row)?;
    let mask = mask_row(pixels, range);
    let detector = SegmentDetector::new(noise_floor_divisor as usize)?;
    Ok(detector.detect(&mask, frame.shape()[1]))
}

/// Merge freshly detected segments into a segments file, creating it if absent
pub fn store_segments<P: AsRef<Path>>(
    path: P,
    kind: KeyKind,
    segments: Vec<KeySegment>,
) -> PianoErrorResult<KeySegments> {
    let path = path.as_ref();
    let mut stored = if path.exists() {
        KeySegments::load(path)?
    } else {
        log::info!("No segments file at {}, creating one", path.display());
        KeySegments::default()
    };

    if segments.len() != kind.expected_count() {
        log::warn!(
            "Storing {} {} segments, expected {}",
            segments.len(),
            kind,
            kind.expected_count()
        );
    }

    stored.set(kind, segments);
    stored.save(path)?;
    Ok(stored)
}

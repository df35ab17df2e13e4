//! Per-frame key press evaluation against calibrated segments

use crate::calibration::{KeyColor, KeyColors, KeyKind, KeySegments, ZoneRanges};
use crate::color::mask_row;
use crate::error::{PianoError, Result as PianoErrorResult};
use crate::keys::{black_to_key_index, white_to_key_index, Hand, KeyIndex};
use crate::segments::KeySegment;
use crate::state::{detect_changes, PianoChanges, PianoState};
use crate::video::{extract_scan_line, scan_line_px, Frame};

/// Where the scan line sits in each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanLine {
    /// Percentage of the frame height, resolved per frame
    Percent(u32),
    /// Fixed pixel row
    Pixel(usize),
}

/// A calibrated key: where it sits on the scan line and which piano key it is
#[derive(Debug, Clone, Copy)]
struct MappedSegment {
    segment: KeySegment,
    key: KeyIndex,
}

/// Turns frames into pressed-key snapshots and their changes
#[derive(Debug, Clone)]
pub struct FrameKeyPressEvaluator {
    white: Vec<MappedSegment>,
    black: Vec<MappedSegment>,
    ranges: ZoneRanges,
    scan_line: ScanLine,
    min_width: usize,
}

impl FrameKeyPressEvaluator {
    /// Validate calibration up front; nothing is evaluated with a partial keyboard
    pub fn new(
        segments: &KeySegments,
        colors: &KeyColors,
        scan_line: ScanLine,
    ) -> PianoErrorResult<Self> {
        segments.validate()?;
        let ranges = colors.require_all()?;

        let white = map_segments(segments.get(KeyKind::White), white_to_key_index)?;
        let black = map_segments(segments.get(KeyKind::Black), black_to_key_index)?;
        let min_width = segments.max_end().map(|end| end + 1).unwrap_or(0);

        Ok(Self {
            white,
            black,
            ranges,
            scan_line,
            min_width,
        })
    }

    pub fn scan_line(&self) -> ScanLine {
        self.scan_line
    }

    /// Build the snapshot for one frame without diffing it
    pub fn sample(&self, frame: &Frame) -> PianoErrorResult<PianoState> {
        let (height, width, _) = frame.dim();
        if width < self.min_width {
            return Err(PianoError::CalibrationMismatch(format!(
                "segments reach pixel {} but frame is only {} wide",
                self.min_width - 1,
                width
            )));
        }

        let row = match self.scan_line {
            ScanLine::Percent(pct) => scan_line_px(height, pct)?,
            ScanLine::Pixel(px) => px,
        };
        let pixels = extract_scan_line(frame, row)?;
        let mask = |color: KeyColor| mask_row(pixels.iter().copied(), self.ranges.get(color));

        let zones = [
            (Hand::Left, &self.white, mask(KeyColor::LeftWhite)),
            (Hand::Right, &self.white, mask(KeyColor::RightWhite)),
            (Hand::Left, &self.black, mask(KeyColor::LeftBlack)),
            (Hand::Right, &self.black, mask(KeyColor::RightBlack)),
        ];

        // Both hands may claim one key; each pair is tracked on its own
        Ok(zones
            .iter()
            .flat_map(|(hand, keys, mask)| {
                keys.iter()
                    .filter(move |mapped| mapped.segment.is_occupied(mask))
                    .map(move |mapped| (mapped.key, *hand))
            })
            .collect())
    }

    /// Evaluate one frame against the previous snapshot
    pub fn evaluate(
        &self,
        frame: &Frame,
        prev_state: &PianoState,
    ) -> PianoErrorResult<(PianoChanges, PianoState)> {
        let next_state = self.sample(frame)?;
        let changes = detect_changes(&next_state, prev_state);
        Ok((changes, next_state))
    }
}

fn map_segments(
    segments: &[KeySegment],
    to_key: fn(usize) -> PianoErrorResult<KeyIndex>,
) -> PianoErrorResult<Vec<MappedSegment>> {
    segments
        .iter()
        .enumerate()
        .map(|(ordinal, &segment)| {
            Ok(MappedSegment {
                segment,
                key: to_key(ordinal)?,
            })
        })
        .collect()
}

//! Key segment extraction from a single masked scan line

use crate::error::{PianoError, Result as PianoErrorResult};
use serde::{Deserialize, Serialize};

/// Default fraction of the image width below which a run is treated as noise
pub const DEFAULT_NOISE_FLOOR_DIVISOR: usize = 128;

/// Horizontal pixel extent of one key along the scan line (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SegmentBounds")]
pub struct KeySegment {
    pub start: usize,
    pub end: usize,
}

/// Unchecked on-disk form of a segment
#[derive(Deserialize)]
struct SegmentBounds {
    start: usize,
    end: usize,
}

impl TryFrom<SegmentBounds> for KeySegment {
    type Error = PianoError;

    fn try_from(bounds: SegmentBounds) -> PianoErrorResult<Self> {
        KeySegment::new(bounds.start, bounds.end)
    }
}

impl KeySegment {
    pub fn new(start: usize, end: usize) -> PianoErrorResult<Self> {
        if start > end {
            return Err(PianoError::OutOfRange(format!(
                "segment start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Pixel length as measured by the noise filter (`end - start`)
    pub fn span(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True iff any pixel of the segment is set in `mask`
    pub fn is_occupied(&self, mask: &[bool]) -> bool {
        if self.start > self.end || self.start >= mask.len() {
            return false;
        }
        let end = self.end.min(mask.len() - 1);
        mask[self.start..=end].iter().any(|&on| on)
    }
}

/// Scans mask rows for contiguous "on" runs
#[derive(Debug, Clone, Copy)]
pub struct SegmentDetector {
    noise_floor_divisor: usize,
}

impl Default for SegmentDetector {
    fn default() -> Self {
        Self {
            noise_floor_divisor: DEFAULT_NOISE_FLOOR_DIVISOR,
        }
    }
}

impl SegmentDetector {
    pub fn new(noise_floor_divisor: usize) -> PianoErrorResult<Self> {
        if noise_floor_divisor == 0 {
            return Err(PianoError::ConfigValidationFailed(
                "noise floor divisor must be positive".to_string(),
            ));
        }
        Ok(Self {
            noise_floor_divisor,
        })
    }

    /// Runs whose span is at or below this many pixels are discarded
    pub fn noise_floor(&self, width: usize) -> usize {
        width / self.noise_floor_divisor
    }

    /// Extract key segments from one mask row, left to right
    pub fn detect(&self, mask: &[bool], width: usize) -> Vec<KeySegment> {
        let noise_floor = self.noise_floor(width);
        find_runs(mask)
            .into_iter()
            .filter(|segment| segment.span() > noise_floor)
            .collect()
    }

    /// Same as [`SegmentDetector::detect`] for 8-bit masks where any non-zero value is "on"
    pub fn detect_u8(&self, mask: &[u8], width: usize) -> Vec<KeySegment> {
        let mask: Vec<bool> = mask.iter().map(|&value| value != 0).collect();
        self.detect(&mask, width)
    }
}

fn find_runs(mask: &[bool]) -> Vec<KeySegment> {
    let mut segments = Vec::new();
    let mut start = None;

    for (i, &on) in mask.iter().enumerate() {
        match (on, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                segments.push(KeySegment { start: s, end: i - 1 });
                start = None;
            }
            _ => {}
        }
    }

    // A run touching the right edge is closed at the boundary
    if let Some(s) = start {
        segments.push(KeySegment {
            start: s,
            end: mask.len() - 1,
        });
    }

    segments
}

//! HSV colour space conversion and zone masking
//!
//! Values follow the 8-bit OpenCV convention:
//! - H: hue, 0..=179 (degrees halved)
//! - S: saturation, 0..=255 (0 is grey)
//! - V: value, 0..=255 (0 is black)

use crate::error::{PianoError, Result as PianoErrorResult};
use serde::{Deserialize, Serialize};

/// Largest hue value in the halved-degree representation
pub const HUE_MAX: u8 = 179;

/// A single HSV pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Inclusive channel range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: u8,
    pub max: u8,
}

impl Range {
    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: u8) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Hue/saturation/value acceptance box for one keyboard zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub h: Range,
    pub s: Range,
    pub v: Range,
}

impl HsvRange {
    pub fn new(h: Range, s: Range, v: Range) -> PianoErrorResult<Self> {
        let range = Self { h, s, v };
        range.validate()?;
        Ok(range)
    }

    /// Tolerance box around a sampled pixel, as produced by clicking a key
    pub fn around(color: Hsv) -> Self {
        Self {
            h: Range::new(color.h.saturating_sub(10), color.h.saturating_add(10).min(HUE_MAX)),
            s: Range::new(color.s.saturating_sub(40), color.s.saturating_add(40)),
            v: Range::new(color.v.saturating_sub(40), color.v.saturating_add(40)),
        }
    }

    pub fn validate(&self) -> PianoErrorResult<()> {
        if self.h.max > HUE_MAX {
            return Err(PianoError::OutOfRange(format!(
                "hue max {} exceeds {}",
                self.h.max, HUE_MAX
            )));
        }
        for (name, range) in [("h", self.h), ("s", self.s), ("v", self.v)] {
            if range.min > range.max {
                return Err(PianoError::OutOfRange(format!(
                    "{} range min {} is above max {}",
                    name, range.min, range.max
                )));
            }
        }
        Ok(())
    }

    /// True iff all three channels fall inside their ranges
    pub fn contains(&self, color: Hsv) -> bool {
        self.h.contains(color.h) && self.s.contains(color.s) && self.v.contains(color.v)
    }
}

/// Convert an 8-bit RGB pixel to 8-bit HSV
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    let s = if v == 0 {
        0
    } else {
        (255.0 * diff as f32 / v as f32).round() as i32
    };

    let h = if diff == 0 {
        0.0
    } else {
        let degrees = if v == r {
            60.0 * (g - b) as f32 / diff as f32
        } else if v == g {
            120.0 + 60.0 * (b - r) as f32 / diff as f32
        } else {
            240.0 + 60.0 * (r - g) as f32 / diff as f32
        };
        if degrees < 0.0 {
            degrees + 360.0
        } else {
            degrees
        }
    };
    let h = (h / 2.0).round() as i32 % 180;

    Hsv {
        h: h as u8,
        s: s as u8,
        v: v as u8,
    }
}

/// Binary mask over a row of RGB pixels: `true` where the pixel is in range
pub fn mask_row<I>(pixels: I, range: &HsvRange) -> Vec<bool>
where
    I: IntoIterator<Item = [u8; 3]>,
{
    pixels
        .into_iter()
        .map(|rgb| range.contains(rgb_to_hsv(rgb)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_colors() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), Hsv { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv([0, 255, 0]), Hsv { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv([0, 0, 255]), Hsv { h: 120, s: 255, v: 255 });
    }

    #[test]
    fn test_greys_have_no_hue_or_saturation() {
        assert_eq!(rgb_to_hsv([0, 0, 0]), Hsv { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv([128, 128, 128]), Hsv { h: 0, s: 0, v: 128 });
    }

    #[test]
    fn test_range_validation() {
        assert!(HsvRange::new(Range::new(0, 180), Range::new(0, 255), Range::new(0, 255)).is_err());
        assert!(HsvRange::new(Range::new(9, 8), Range::new(0, 255), Range::new(0, 255)).is_err());

        let picked = HsvRange::around(Hsv { h: 175, s: 20, v: 250 });
        assert_eq!(picked.h, Range::new(165, 179));
        assert_eq!(picked.s, Range::new(0, 60));
        assert_eq!(picked.v, Range::new(210, 255));
        assert!(picked.validate().is_ok());
    }

    #[test]
    fn test_hue_wraps_below_180() {
        // Just short of pure red going the long way round
        let hsv = rgb_to_hsv([255, 0, 1]);
        assert!(hsv.h < 180);
    }
}

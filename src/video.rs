//! Frame acquisition and scan line sampling
//!
//! Decoding video containers is left to external tools; frames arrive either
//! as a directory of still images (e.g. `ffmpeg -i in.mp4 frames/%06d.png`)
//! or straight from memory.

use crate::error::{PianoError, Result as PianoErrorResult};
use image::RgbImage;
use ndarray::{Array3, Axis};
use std::path::{Path, PathBuf};

/// One RGB frame, shaped `(height, width, 3)`
pub type Frame = Array3<u8>;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Sort key: stem prefix, then its trailing number, then the full path
fn frame_order_key(path: &Path) -> (String, Option<u64>, PathBuf) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = stem[prefix.len()..].parse().ok();
    (prefix.to_string(), number, path.to_path_buf())
}

/// Ordered supplier of frames with their frame numbers
pub trait FrameSource {
    /// Frames per second of the underlying recording
    fn fps(&self) -> f64;

    /// Number of frames this source will yield, if known up front
    fn frame_count(&self) -> Option<u64>;

    /// Next `(frame_number, frame)` pair in increasing frame order, `None` when exhausted
    fn next_frame(&mut self) -> Option<PianoErrorResult<(u64, Frame)>>;
}

/// Row index of the scan line for a frame of the given height
pub fn scan_line_px(height: usize, scan_line_pct: u32) -> PianoErrorResult<usize> {
    if height == 0 {
        return Err(PianoError::InvalidFrame("frame has zero height".to_string()));
    }
    if scan_line_pct > 100 {
        return Err(PianoError::OutOfRange(format!(
            "scan line percentage {} above 100",
            scan_line_pct
        )));
    }
    let row = height * scan_line_pct as usize / 100;
    Ok(row.min(height - 1))
}

/// Copy the RGB pixels of one row out of a frame
pub fn extract_scan_line(frame: &Frame, row: usize) -> PianoErrorResult<Vec<[u8; 3]>> {
    let (height, _, channels) = frame.dim();
    if channels != 3 {
        return Err(PianoError::InvalidFrame(format!(
            "expected 3 colour channels, found {}",
            channels
        )));
    }
    if row >= height {
        return Err(PianoError::InvalidFrame(format!(
            "scan line {} outside frame height {}",
            row, height
        )));
    }
    Ok(frame
        .index_axis(Axis(0), row)
        .outer_iter()
        .map(|px| [px[0], px[1], px[2]])
        .collect())
}

/// Convert a decoded image into a frame array
pub fn frame_from_image(img: &RgbImage) -> PianoErrorResult<Frame> {
    let (width, height) = img.dimensions();
    Array3::from_shape_vec((height as usize, width as usize, 3), img.as_raw().clone())
        .map_err(|e| PianoError::InvalidFrame(format!("Failed to shape frame: {}", e)))
}

/// Load a single still image as a frame
pub fn load_frame<P: AsRef<Path>>(path: P) -> PianoErrorResult<Frame> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| {
        PianoError::FrameReadFailure(format!("Unable to read {}: {}", path.display(), e))
    })?;
    frame_from_image(&img.to_rgb8())
}

/// Frames stored as numbered still images in one directory
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    fps: f64,
    next_index: usize,
    end_index: usize,
}

impl ImageSequenceSource {
    /// Open a frame directory
    ///
    /// Frames are ordered by the number at the end of the file stem, so
    /// `frame2.png` comes before `frame10.png` with or without zero padding.
    /// Frame numbers are positions in that order.
    pub fn open<P: AsRef<Path>>(dir: P, fps: f64) -> PianoErrorResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(PianoError::FrameReadFailure(format!(
                "Frame directory not found: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort_by_cached_key(|path| frame_order_key(path));

        if paths.is_empty() {
            return Err(PianoError::FrameReadFailure(format!(
                "No frame images in {}",
                dir.display()
            )));
        }

        log::info!("Found {} frames in {}", paths.len(), dir.display());
        let end_index = paths.len();
        Ok(Self {
            paths,
            fps,
            next_index: 0,
            end_index,
        })
    }

    /// Restrict the source to frames `start..=end` (end clamped to the last frame)
    pub fn with_range(mut self, start: Option<u64>, end: Option<u64>) -> PianoErrorResult<Self> {
        let last = self.paths.len() as u64 - 1;
        let start = start.unwrap_or(0);
        let end = end.unwrap_or(last).min(last);
        if start > end {
            return Err(PianoError::OutOfRange(format!(
                "frame range {}..={} is empty (last frame {})",
                start, end, last
            )));
        }
        self.next_index = start as usize;
        self.end_index = end as usize + 1;
        Ok(self)
    }

    pub fn total_frames(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for ImageSequenceSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.end_index.saturating_sub(self.next_index) as u64)
    }

    fn next_frame(&mut self) -> Option<PianoErrorResult<(u64, Frame)>> {
        if self.next_index >= self.end_index {
            return None;
        }
        let frame_number = self.next_index as u64;
        let path = &self.paths[self.next_index];
        self.next_index += 1;
        Some(load_frame(path).map(|frame| (frame_number, frame)))
    }
}

/// Frames already held in memory, numbered from a starting frame
pub struct MemoryFrameSource {
    frames: std::vec::IntoIter<Frame>,
    fps: f64,
    next_number: u64,
    remaining: u64,
}

impl MemoryFrameSource {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self::starting_at(frames, fps, 0)
    }

    pub fn starting_at(frames: Vec<Frame>, fps: f64, first_frame: u64) -> Self {
        let remaining = frames.len() as u64;
        Self {
            frames: frames.into_iter(),
            fps,
            next_number: first_frame,
            remaining,
        }
    }
}

impl FrameSource for MemoryFrameSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn frame_count(&self) -> Option<u64> {
        Some(self.remaining)
    }

    fn next_frame(&mut self) -> Option<PianoErrorResult<(u64, Frame)>> {
        let frame = self.frames.next()?;
        let number = self.next_number;
        self.next_number += 1;
        self.remaining -= 1;
        Some(Ok((number, frame)))
    }
}

/// Stack the scan line of every frame into one image, one row per frame
pub fn generate_timeslice<S: FrameSource>(
    source: &mut S,
    scan_line_pct: u32,
) -> PianoErrorResult<RgbImage> {
    let mut rows: Vec<Vec<[u8; 3]>> = Vec::new();
    let mut width = None;

    while let Some(next) = source.next_frame() {
        let (_, frame) = next?;
        let (height, frame_width, _) = frame.dim();
        match width {
            None => width = Some(frame_width),
            Some(w) if w != frame_width => {
                return Err(PianoError::InvalidFrame(format!(
                    "frame width changed from {} to {}",
                    w, frame_width
                )));
            }
            _ => {}
        }
        let row = scan_line_px(height, scan_line_pct)?;
        rows.push(extract_scan_line(&frame, row)?);
    }

    let width = width.ok_or_else(|| {
        PianoError::FrameReadFailure("No frames available for timeslice".to_string())
    })?;

    let mut img = RgbImage::new(width as u32, rows.len() as u32);
    for (y, row) in rows.iter().enumerate() {
        for (x, px) in row.iter().enumerate() {
            img.put_pixel(x as u32, y as u32, image::Rgb(*px));
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_line_px_clamps_to_last_row() {
        assert_eq!(scan_line_px(720, 100).unwrap(), 719);
        assert_eq!(scan_line_px(720, 50).unwrap(), 360);
        assert_eq!(scan_line_px(720, 0).unwrap(), 0);
        assert!(scan_line_px(720, 101).is_err());
    }

    #[test]
    fn test_frame_order_key_is_numeric() {
        let mut paths: Vec<PathBuf> = ["frame10.png", "frame2.png", "frame1.png", "frame.png"]
            .iter()
            .map(PathBuf::from)
            .collect();
        paths.sort_by_cached_key(|path| frame_order_key(path));
        let names: Vec<_> = paths.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(names, ["frame.png", "frame1.png", "frame2.png", "frame10.png"]);
    }
}

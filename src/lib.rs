//! Piano-to-MIDI Transcription System
//!
//! Reads the key presses of a piano performance video off a single scan line
//! per frame and writes them out as a MIDI note stream. Each hand's keys are
//! lit in their own colour, so four HSV ranges (left/right × white/black)
//! separate the hands; calibrated pixel segments locate the 88 keys.

pub mod analysis;
pub mod calibration;
pub mod color;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod keys;
pub mod midi;
pub mod segments;
pub mod state;
pub mod video;

pub use analysis::TranscriptionSummary;
pub use calibration::{KeyColor, KeyColors, KeyKind, KeySegments};
pub use config::Config;
pub use error::{PianoError, Result as PianoErrorResult};
pub use evaluator::{FrameKeyPressEvaluator, ScanLine};
pub use keys::{Hand, KeyIndex};
pub use midi::MidiSequenceWriter;
pub use state::{detect_changes, PianoChanges, PianoState};
pub use video::{FrameSource, ImageSequenceSource, MemoryFrameSource};

use midi::NoteKind;
use std::path::Path;

/// Main processing pipeline for piano-to-MIDI conversion
pub struct PianoToMidi {
    config: Config,
}

impl PianoToMidi {
    /// Create a new processor with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Transcribe a directory of frame images using calibration files on disk
    pub fn process_directory<P: AsRef<Path>>(
        &self,
        frames_dir: P,
        segments_path: P,
        colors_path: P,
        output_dir: P,
    ) -> PianoErrorResult<TranscriptionSummary> {
        let segments = KeySegments::load(segments_path)?;
        let colors = KeyColors::load(colors_path)?;

        let mut source = ImageSequenceSource::open(frames_dir, self.config.video.fps)?
            .with_range(self.config.video.frame_start, self.config.video.frame_end)?;

        self.process(&mut source, &segments, &colors, output_dir.as_ref())
    }

    /// Fold every frame of `source` through detection and MIDI accumulation
    ///
    /// Configuration and calibration are checked before the first frame is read. If the source
    /// fails mid-stream, everything gathered so far is still written before
    /// the error is returned.
    pub fn process<S: FrameSource>(
        &self,
        source: &mut S,
        segments: &KeySegments,
        colors: &KeyColors,
        output_dir: &Path,
    ) -> PianoErrorResult<TranscriptionSummary> {
        config::validate_config(&self.config)
            .map_err(|e| PianoError::ConfigValidationFailed(e.to_string()))?;

        let scan_line = ScanLine::Percent(self.config.detection.scan_line_pct);
        let evaluator = FrameKeyPressEvaluator::new(segments, colors, scan_line)?;

        log::info!(
            "Detecting key presses at {}% of frame height ({} frames, {} fps)",
            self.config.detection.scan_line_pct,
            source
                .frame_count()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            source.fps()
        );

        let mut writer: Option<MidiSequenceWriter> = None;
        let mut state = PianoState::new();
        let mut frames_processed = 0u64;
        let mut first_frame = None;
        let mut last_frame = None;
        let mut read_failure = None;

        while let Some(next) = source.next_frame() {
            let (frame_number, frame) = match next {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("Stopping after frame read failure: {}", e);
                    read_failure = Some(e);
                    break;
                }
            };

            if writer.is_none() {
                writer = Some(MidiSequenceWriter::starting_at(
                    source.fps(),
                    frame_number,
                    self.config.midi.clone(),
                )?);
                first_frame = Some(frame_number);
            }

            let (changes, next_state) = evaluator.evaluate(&frame, &state)?;
            if let Some(writer) = writer.as_mut() {
                writer.process_change(&changes, frame_number)?;
            }
            state = next_state;
            frames_processed += 1;
            last_frame = Some(frame_number);
        }

        let mut writer = match writer {
            Some(writer) => writer,
            None => MidiSequenceWriter::new(source.fps(), self.config.midi.clone())?,
        };

        // Keys still down when the frames run out end with the last frame
        if let (true, Some(last)) = (self.config.midi.close_held_notes, last_frame) {
            if !state.is_empty() {
                log::debug!("Releasing {} held keys at end of input", state.len());
                let changes = detect_changes(&PianoState::new(), &state);
                writer.process_change(&changes, last + 1)?;
            }
        }

        std::fs::create_dir_all(output_dir)?;
        let midi_path = output_dir.join(&self.config.export.midi_filename);
        writer.save(&midi_path)?;

        let count = |kind: NoteKind| writer.messages().iter().filter(|m| m.kind == kind).count();
        let summary = TranscriptionSummary {
            frames_processed,
            first_frame,
            last_frame,
            notes_on: count(NoteKind::NoteOn),
            notes_off: count(NoteKind::NoteOff),
            duration_ms: writer.total_ms(),
            midi_path,
        };

        if self.config.export.write_analysis {
            analysis::export_analysis(
                writer.messages(),
                self.config.midi.note_offset,
                &summary,
                &output_dir.join(&self.config.export.analysis_filename),
            )?;
        }

        log::info!(
            "Processed {} frames: {} note-ons, {} note-offs",
            summary.frames_processed,
            summary.notes_on,
            summary.notes_off
        );

        match read_failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

/// Validate configuration and calibration inputs before processing
pub fn validate_input<P: AsRef<Path>>(
    frames_dir: P,
    segments_path: P,
    colors_path: P,
    config: &Config,
) -> PianoErrorResult<()> {
    let frames_dir = frames_dir.as_ref();
    if !frames_dir.is_dir() {
        return Err(PianoError::FrameReadFailure(format!(
            "Frame directory does not exist: {}",
            frames_dir.display()
        )));
    }

    config::validate_config(config)
        .map_err(|e| PianoError::ConfigValidationFailed(e.to_string()))?;

    KeySegments::load(segments_path)?.validate()?;
    KeyColors::load(colors_path)?.require_all()?;

    Ok(())
}

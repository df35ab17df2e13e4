//! MIDI sequence accumulation and export

use crate::config::{validate_midi_config, MidiConfig};
use crate::error::{PianoError, Result as PianoErrorResult};
use crate::keys::Hand;
use crate::state::PianoChanges;
use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

// Variable-length quantities carry at most 28 bits
const MAX_DELTA_TICKS: u32 = 0x0FFF_FFFF;

/// Note on or note off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    NoteOn,
    NoteOff,
}

/// One accumulated note message; `time_ms` is relative to the previous message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteMessage {
    pub kind: NoteKind,
    pub note: u8,
    pub velocity: u8,
    pub time_ms: u32,
    pub hand: Hand,
}

/// Stateful accumulator turning per-frame changes into timed note messages
#[derive(Debug, Clone)]
pub struct MidiSequenceWriter {
    fps: f64,
    config: MidiConfig,
    anchor_frame: u64,
    current_frame: u64,
    emitted_ms: u64,
    messages: Vec<NoteMessage>,
}

impl MidiSequenceWriter {
    /// Writer whose time zero is frame 0
    pub fn new(fps: f64, config: MidiConfig) -> PianoErrorResult<Self> {
        Self::starting_at(fps, 0, config)
    }

    /// Writer whose time zero is `first_frame`
    pub fn starting_at(fps: f64, first_frame: u64, config: MidiConfig) -> PianoErrorResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(PianoError::ConfigValidationFailed(format!(
                "fps must be positive, got {}",
                fps
            )));
        }
        validate_midi_config(&config)
            .map_err(|e| PianoError::ConfigValidationFailed(e.to_string()))?;
        Ok(Self {
            fps,
            config,
            anchor_frame: first_frame,
            current_frame: first_frame,
            emitted_ms: 0,
            messages: Vec::new(),
        })
    }

    pub fn messages(&self) -> &[NoteMessage] {
        &self.messages
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Milliseconds from the anchor frame to `frame_number`
    pub fn frame_to_ms(&self, frame_number: u64) -> u64 {
        let frames = frame_number.saturating_sub(self.anchor_frame) as f64;
        (1000.0 * frames / self.fps).round() as u64
    }

    /// Sum of all emitted deltas
    pub fn total_ms(&self) -> u64 {
        self.emitted_ms
    }

    /// Append note-ons for `pressed` then note-offs for `released`
    ///
    /// Only the first message of a call carries the gap since the last emitted
    /// message; the rest are simultaneous. Deltas are taken against absolute
    /// time, so per-call rounding never accumulates.
    pub fn process_change(
        &mut self,
        changes: &PianoChanges,
        frame_number: u64,
    ) -> PianoErrorResult<()> {
        if frame_number < self.current_frame {
            return Err(PianoError::FrameOrderViolation {
                previous: self.current_frame,
                current: frame_number,
            });
        }
        self.current_frame = frame_number;

        if changes.is_empty() {
            return Ok(());
        }

        let now_ms = self.frame_to_ms(frame_number);
        let time_ms = now_ms.saturating_sub(self.emitted_ms);
        let delta = u32::try_from(time_ms).map_err(|_| {
            PianoError::MidiExportError(format!("time delta {}ms does not fit", time_ms))
        })?;
        let mut pending = Some(delta);

        let ons = changes.pressed.iter().map(|p| (NoteKind::NoteOn, p));
        let offs = changes.released.iter().map(|p| (NoteKind::NoteOff, p));
        for (kind, &(key, hand)) in ons.chain(offs) {
            self.messages.push(NoteMessage {
                kind,
                note: key.midi_note(self.config.note_offset)?,
                velocity: self.config.velocity,
                time_ms: pending.take().unwrap_or(0),
                hand,
            });
        }

        self.emitted_ms = self.emitted_ms.max(now_ms);
        log::debug!(
            "frame {}: {} on, {} off at {}ms",
            frame_number,
            changes.pressed.len(),
            changes.released.len(),
            self.emitted_ms
        );
        Ok(())
    }

    /// Encode the accumulated messages as a standard MIDI file
    pub fn to_bytes(&self) -> PianoErrorResult<Vec<u8>> {
        let mut track = Vec::with_capacity(self.messages.len() + 2);

        track.push(TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::from(
                self.config.tempo_us_per_beat,
            ))),
        });

        // Convert through absolute ticks so tick rounding does not drift either
        let mut abs_ms = 0u64;
        let mut last_tick = 0u64;
        for message in &self.messages {
            abs_ms += message.time_ms as u64;
            let tick = self.ms_to_ticks(abs_ms);
            let delta = u32::try_from(tick - last_tick)
                .ok()
                .filter(|&d| d <= MAX_DELTA_TICKS)
                .ok_or_else(|| {
                    PianoError::MidiExportError(format!(
                        "delta of {} ticks exceeds MIDI range",
                        tick - last_tick
                    ))
                })?;
            last_tick = tick;

            let key = u7::from(message.note);
            let vel = u7::from(message.velocity);
            let midi = match message.kind {
                NoteKind::NoteOn => MidiMessage::NoteOn { key, vel },
                NoteKind::NoteOff => MidiMessage::NoteOff { key, vel },
            };
            track.push(TrackEvent {
                delta: u28::from(delta),
                kind: TrackEventKind::Midi {
                    channel: u4::from(0),
                    message: midi,
                },
            });
        }

        track.push(TrackEvent {
            delta: u28::from(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });

        let smf = Smf {
            header: Header {
                format: Format::SingleTrack,
                timing: midly::Timing::Metrical(u15::from(self.config.ticks_per_beat)),
            },
            tracks: vec![track],
        };

        let mut bytes = Vec::new();
        smf.write(&mut bytes)
            .map_err(|e| PianoError::MidiExportError(format!("Failed to write MIDI data: {:?}", e)))?;
        Ok(bytes)
    }

    /// Write the MIDI file; valid after any number of `process_change` calls
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PianoErrorResult<()> {
        let path = path.as_ref();
        if self.messages.is_empty() {
            log::warn!("No note events detected, writing an empty track");
        }
        let bytes = self.to_bytes()?;
        let mut file = File::create(path)?;
        file.write_all(&bytes)?;
        log::info!(
            "Exported {} MIDI events to {}",
            self.messages.len(),
            path.display()
        );
        Ok(())
    }

    fn ms_to_ticks(&self, ms: u64) -> u64 {
        let ticks_per_ms =
            self.config.ticks_per_beat as f64 * 1000.0 / self.config.tempo_us_per_beat as f64;
        (ms as f64 * ticks_per_ms).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_maps_one_tick_per_ms() {
        let writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        assert_eq!(writer.ms_to_ticks(1234), 1234);
    }

    #[test]
    fn test_rejects_non_positive_fps() {
        assert!(MidiSequenceWriter::new(0.0, MidiConfig::default()).is_err());
        assert!(MidiSequenceWriter::new(f64::NAN, MidiConfig::default()).is_err());
    }
}

//! Validation tests for MIDI sequence accumulation and export

use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use piano2midi::config::MidiConfig;
use piano2midi::keys::{Hand, KeyIndex};
use piano2midi::midi::{MidiSequenceWriter, NoteKind};
use piano2midi::{PianoChanges, PianoError};

fn key(index: usize) -> KeyIndex {
    KeyIndex::new(index).unwrap()
}

fn press(keys: &[(usize, Hand)]) -> PianoChanges {
    PianoChanges {
        pressed: keys.iter().map(|&(k, h)| (key(k), h)).collect(),
        released: Default::default(),
    }
}

fn release(keys: &[(usize, Hand)]) -> PianoChanges {
    PianoChanges {
        pressed: Default::default(),
        released: keys.iter().map(|&(k, h)| (key(k), h)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_second_note_at_30_fps() {
        let mut writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        writer.process_change(&press(&[(60, Hand::Left)]), 30).unwrap();
        writer.process_change(&release(&[(60, Hand::Left)]), 60).unwrap();

        let messages = writer.messages();
        assert_eq!(messages.len(), 2);

        assert_eq!(messages[0].kind, NoteKind::NoteOn);
        assert_eq!(messages[0].note, 81);
        assert_eq!(messages[0].velocity, 64);
        assert_eq!(messages[0].time_ms, 1000);

        assert_eq!(messages[1].kind, NoteKind::NoteOff);
        assert_eq!(messages[1].note, 81);
        assert_eq!(messages[1].time_ms, 1000);
    }

    #[test]
    fn test_simultaneous_events_share_one_delta() {
        let mut writer = MidiSequenceWriter::new(25.0, MidiConfig::default()).unwrap();
        writer
            .process_change(&press(&[(48, Hand::Right), (39, Hand::Left)]), 0)
            .unwrap();

        let mut changes = press(&[(50, Hand::Right), (41, Hand::Left)]);
        changes.released = release(&[(48, Hand::Right), (39, Hand::Left)]).released;
        writer.process_change(&changes, 5).unwrap();

        let summary: Vec<(NoteKind, u8, u32)> = writer
            .messages()
            .iter()
            .map(|m| (m.kind, m.note, m.time_ms))
            .collect();
        assert_eq!(
            summary,
            vec![
                (NoteKind::NoteOn, 60, 0),
                (NoteKind::NoteOn, 69, 0),
                // ons before offs, ascending keys, only the first carries the gap
                (NoteKind::NoteOn, 62, 200),
                (NoteKind::NoteOn, 71, 0),
                (NoteKind::NoteOff, 60, 0),
                (NoteKind::NoteOff, 69, 0),
            ]
        );
    }

    #[test]
    fn test_empty_calls_do_not_swallow_gaps() {
        let mut writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        writer.process_change(&press(&[(10, Hand::Left)]), 30).unwrap();
        for frame in 31..60 {
            writer.process_change(&PianoChanges::default(), frame).unwrap();
        }
        writer.process_change(&release(&[(10, Hand::Left)]), 60).unwrap();

        assert_eq!(writer.messages()[1].time_ms, 1000);
        assert_eq!(writer.current_frame(), 60);
    }

    #[test]
    fn test_total_time_does_not_drift() {
        let fps = 29.97;
        let mut writer = MidiSequenceWriter::new(fps, MidiConfig::default()).unwrap();
        let mut down = false;
        for frame in 1..=900u64 {
            let changes = if down {
                release(&[(40, Hand::Right)])
            } else {
                press(&[(40, Hand::Right)])
            };
            down = !down;
            writer.process_change(&changes, frame).unwrap();
        }

        let total: u64 = writer.messages().iter().map(|m| m.time_ms as u64).sum();
        let expected = (1000.0 * 900.0 / fps).round() as u64;
        assert_eq!(total, expected);
        assert_eq!(writer.total_ms(), expected);
    }

    #[test]
    fn test_frames_must_not_go_backwards() {
        let mut writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        writer.process_change(&PianoChanges::default(), 10).unwrap();
        let result = writer.process_change(&press(&[(1, Hand::Left)]), 9);
        assert!(matches!(
            result,
            Err(PianoError::FrameOrderViolation {
                previous: 10,
                current: 9
            })
        ));
    }

    #[test]
    fn test_save_without_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.mid");

        let writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        writer.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);
        assert_eq!(smf.tracks[0].len(), 2);
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Meta(MetaMessage::Tempo(_))
        ));
        assert!(matches!(
            smf.tracks[0][1].kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        ));
    }

    #[test]
    fn test_saved_file_length_matches_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.mid");

        let mut writer = MidiSequenceWriter::new(30.0, MidiConfig::default()).unwrap();
        writer.process_change(&press(&[(39, Hand::Right)]), 15).unwrap();
        writer
            .process_change(&press(&[(43, Hand::Right), (27, Hand::Left)]), 45)
            .unwrap();
        let mut last = release(&[(39, Hand::Right), (43, Hand::Right)]);
        last.released.insert((key(27), Hand::Left));
        writer.process_change(&last, 105).unwrap();
        writer.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert!(matches!(smf.header.timing, Timing::Metrical(t) if t.as_int() == 500));

        let track = &smf.tracks[0];
        let total_ticks: u32 = track.iter().map(|e| e.delta.as_int()).sum();
        // 105 frames at 30 fps, one tick per millisecond
        assert_eq!(total_ticks, 3500);

        let mut ons = Vec::new();
        let mut offs = 0;
        for event in track {
            if let TrackEventKind::Midi { message, .. } = event.kind {
                match message {
                    MidiMessage::NoteOn { key, vel } => {
                        assert_eq!(vel.as_int(), 64);
                        ons.push(key.as_int());
                    }
                    MidiMessage::NoteOff { .. } => offs += 1,
                    _ => {}
                }
            }
        }
        assert_eq!(ons, vec![60, 48, 64]);
        assert_eq!(offs, 3);
    }

    #[test]
    fn test_ticks_scale_with_tempo() {
        let config = MidiConfig {
            ticks_per_beat: 480,
            tempo_us_per_beat: 500_000,
            ..MidiConfig::default()
        };
        let mut writer = MidiSequenceWriter::new(10.0, config).unwrap();
        writer.process_change(&press(&[(0, Hand::Left)]), 5).unwrap();
        writer.process_change(&release(&[(0, Hand::Left)]), 10).unwrap();

        let bytes = writer.to_bytes().unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let deltas: Vec<u32> = smf.tracks[0].iter().map(|e| e.delta.as_int()).collect();
        // 500ms is one beat
        assert_eq!(deltas, vec![0, 480, 480, 0]);
    }

    #[test]
    fn test_out_of_range_midi_settings_rejected() {
        let loud = MidiConfig {
            velocity: 200,
            ..MidiConfig::default()
        };
        assert!(matches!(
            MidiSequenceWriter::new(30.0, loud),
            Err(PianoError::ConfigValidationFailed(_))
        ));

        let shifted = MidiConfig {
            note_offset: 200,
            ..MidiConfig::default()
        };
        assert!(matches!(
            MidiSequenceWriter::new(30.0, shifted),
            Err(PianoError::ConfigValidationFailed(_))
        ));

        // Highest offset that keeps C8 within note 127
        let highest = MidiConfig {
            note_offset: 40,
            ..MidiConfig::default()
        };
        let mut writer = MidiSequenceWriter::new(30.0, highest).unwrap();
        writer.process_change(&press(&[(87, Hand::Right)]), 0).unwrap();
        assert_eq!(writer.messages()[0].note, 127);
    }
}

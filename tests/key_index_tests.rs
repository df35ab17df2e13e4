//! Validation tests for white/black ordinal to key index mapping

use piano2midi::keys::{
    black_to_key_index, white_to_key_index, BlackKeyIndex, KeyIndex, WhiteKeyIndex, BLACK_KEYS,
    TOTAL_KEYS, WHITE_KEYS,
};
use piano2midi::PianoError;
use std::collections::HashSet;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_keys_map_into_range_and_are_injective() {
        let mapped: Vec<u8> = (0..WHITE_KEYS)
            .map(|n| white_to_key_index(n).unwrap().value())
            .collect();

        assert!(mapped.iter().all(|&k| (k as usize) < TOTAL_KEYS));
        let distinct: HashSet<u8> = mapped.iter().copied().collect();
        assert_eq!(distinct.len(), WHITE_KEYS);
        // Left to right ordinals must stay left to right on the keyboard
        assert!(mapped.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_black_keys_map_into_range_and_are_injective() {
        let mapped: Vec<u8> = (0..BLACK_KEYS)
            .map(|n| black_to_key_index(n).unwrap().value())
            .collect();

        assert!(mapped.iter().all(|&k| (k as usize) < TOTAL_KEYS));
        assert!(mapped.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_top_white_key_is_c8() {
        let top = white_to_key_index(51).unwrap();
        assert_eq!(top.value(), 87);
        assert_eq!(top.name(), "C8");
    }

    #[test]
    fn test_first_octave_values() {
        let white: Vec<u8> = (0..7).map(|n| white_to_key_index(n).unwrap().value()).collect();
        assert_eq!(white, vec![0, 2, 3, 5, 7, 8, 10]);

        let black: Vec<u8> = (0..5).map(|n| black_to_key_index(n).unwrap().value()).collect();
        assert_eq!(black, vec![1, 4, 6, 9, 11]);
    }

    #[test]
    fn test_white_and_black_partition_the_keyboard() {
        let white: HashSet<u8> = (0..WHITE_KEYS)
            .map(|n| white_to_key_index(n).unwrap().value())
            .collect();
        let black: HashSet<u8> = (0..BLACK_KEYS)
            .map(|n| black_to_key_index(n).unwrap().value())
            .collect();

        assert!(white.is_disjoint(&black));
        assert_eq!(white.len() + black.len(), TOTAL_KEYS);
    }

    #[test]
    fn test_ordinals_outside_domain_are_rejected() {
        assert!(matches!(white_to_key_index(52), Err(PianoError::OutOfRange(_))));
        assert!(matches!(black_to_key_index(36), Err(PianoError::OutOfRange(_))));
        assert!(WhiteKeyIndex::new(52).is_err());
        assert!(BlackKeyIndex::new(36).is_err());
        assert!(matches!(KeyIndex::new(88), Err(PianoError::OutOfRange(_))));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(KeyIndex::new(0).unwrap().name(), "A0");
        assert_eq!(KeyIndex::new(1).unwrap().name(), "A#0");
        assert_eq!(KeyIndex::new(3).unwrap().name(), "C1");
        // Middle C is MIDI note 60
        let middle_c = KeyIndex::new(39).unwrap();
        assert_eq!(middle_c.name(), "C4");
        assert_eq!(middle_c.midi_note(21).unwrap(), 60);
    }

    #[test]
    fn test_midi_note_stays_seven_bit() {
        let top = KeyIndex::new(87).unwrap();
        assert_eq!(top.midi_note(21).unwrap(), 108);
        assert_eq!(top.midi_note(40).unwrap(), 127);
        assert!(matches!(top.midi_note(41), Err(PianoError::OutOfRange(_))));
        assert!(matches!(top.midi_note(200), Err(PianoError::OutOfRange(_))));
    }
}

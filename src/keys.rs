//! Keyboard geometry: absolute key indices and the white/black ordinal mappings
//!
//! An 88-key piano runs from A0 (index 0) to C8 (index 87). Calibration only
//! ever sees keys by their position within their own colour class, so the
//! detection pipeline needs both ordinal domains mapped onto the absolute one.

use crate::error::{PianoError, Result as PianoErrorResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of keys on the keyboard
pub const TOTAL_KEYS: usize = 88;
/// Number of white keys (A0 .. C8)
pub const WHITE_KEYS: usize = 52;
/// Number of black keys (A#0 .. A#7)
pub const BLACK_KEYS: usize = 36;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

// Semitone offsets within one A-rooted octave (A, B, C, D, E, F, G)
const WHITE_OFFSETS: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
// A#, C#, D#, F#, G#
const BLACK_OFFSETS: [u8; 5] = [1, 4, 6, 9, 11];

/// Which hand a key press is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Left => write!(f, "left"),
            Hand::Right => write!(f, "right"),
        }
    }
}

/// Absolute piano key, A0 = 0 .. C8 = 87
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct KeyIndex(u8);

impl KeyIndex {
    /// Create a key index, rejecting anything outside `[0, 88)`
    pub fn new(value: usize) -> PianoErrorResult<Self> {
        if value >= TOTAL_KEYS {
            return Err(PianoError::OutOfRange(format!(
                "key index {} not in [0, {})",
                value, TOTAL_KEYS
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// MIDI note number for this key, given the note of key 0 (21 for A0)
    pub fn midi_note(self, note_offset: u8) -> PianoErrorResult<u8> {
        self.0
            .checked_add(note_offset)
            .filter(|&note| note <= 127)
            .ok_or_else(|| {
                PianoError::OutOfRange(format!(
                    "key {} with note offset {} is beyond MIDI note 127",
                    self.0, note_offset
                ))
            })
    }

    /// Scientific pitch name, e.g. `A0`, `C4`, `C8`
    pub fn name(self) -> String {
        let shifted = self.0 as usize + 9;
        format!("{}{}", NOTE_NAMES[shifted % 12], shifted / 12)
    }

    /// Iterate over every key on the keyboard in ascending order
    pub fn all() -> impl Iterator<Item = KeyIndex> {
        (0..TOTAL_KEYS as u8).map(KeyIndex)
    }
}

impl TryFrom<u8> for KeyIndex {
    type Error = PianoError;

    fn try_from(value: u8) -> PianoErrorResult<Self> {
        KeyIndex::new(value as usize)
    }
}

impl From<KeyIndex> for u8 {
    fn from(key: KeyIndex) -> Self {
        key.0
    }
}

impl fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Ordinal of a white key, counted left to right from A0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WhiteKeyIndex(u8);

impl WhiteKeyIndex {
    pub fn new(value: usize) -> PianoErrorResult<Self> {
        if value >= WHITE_KEYS {
            return Err(PianoError::OutOfRange(format!(
                "white key ordinal {} not in [0, {})",
                value, WHITE_KEYS
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn to_key_index(self) -> KeyIndex {
        let n = self.0 as usize;
        // The last octave holds only C8, which the regular pattern lands on as well.
        if n == WHITE_KEYS - 1 {
            return KeyIndex((TOTAL_KEYS - 1) as u8);
        }
        let octave = n / 7;
        KeyIndex((octave * 12) as u8 + WHITE_OFFSETS[n % 7])
    }
}

/// Ordinal of a black key, counted left to right from A#0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlackKeyIndex(u8);

impl BlackKeyIndex {
    pub fn new(value: usize) -> PianoErrorResult<Self> {
        if value >= BLACK_KEYS {
            return Err(PianoError::OutOfRange(format!(
                "black key ordinal {} not in [0, {})",
                value, BLACK_KEYS
            )));
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn to_key_index(self) -> KeyIndex {
        let n = self.0 as usize;
        let octave = n / 5;
        KeyIndex((octave * 12) as u8 + BLACK_OFFSETS[n % 5])
    }
}

/// Map a white key ordinal in `[0, 52)` to its absolute key index
pub fn white_to_key_index(n: usize) -> PianoErrorResult<KeyIndex> {
    Ok(WhiteKeyIndex::new(n)?.to_key_index())
}

/// Map a black key ordinal in `[0, 36)` to its absolute key index
pub fn black_to_key_index(n: usize) -> PianoErrorResult<KeyIndex> {
    Ok(BlackKeyIndex::new(n)?.to_key_index())
}

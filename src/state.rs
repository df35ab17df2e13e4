//! Pressed-key snapshots and frame-to-frame change detection
//!
//! A snapshot is a set of `(key, hand)` pairs. Keeping the hand inside the
//! set element means a key changing hands shows up as a release by one hand
//! plus a press by the other, never as an in-place edit.

use crate::keys::{Hand, KeyIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One pressed key together with the hand holding it
pub type KeyPress = (KeyIndex, Hand);

/// Immutable snapshot of the keys held down in one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PianoState {
    keys: BTreeSet<KeyPress>,
}

impl PianoState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new snapshot in which `(index, hand)` is present iff `is_pressed`
    pub fn set_key(&self, index: KeyIndex, hand: Hand, is_pressed: bool) -> PianoState {
        let mut keys = self.keys.clone();
        if is_pressed {
            keys.insert((index, hand));
        } else {
            keys.remove(&(index, hand));
        }
        PianoState { keys }
    }

    pub fn is_pressed(&self, index: KeyIndex, hand: Hand) -> bool {
        self.keys.contains(&(index, hand))
    }

    /// True if either hand holds the key
    pub fn is_key_down(&self, index: KeyIndex) -> bool {
        Hand::ALL.iter().any(|&hand| self.is_pressed(index, hand))
    }

    /// Pressed pairs in ascending key order
    pub fn keys(&self) -> impl Iterator<Item = &KeyPress> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<KeyPress> for PianoState {
    fn from_iter<T: IntoIterator<Item = KeyPress>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

/// Presses and releases between two consecutive snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PianoChanges {
    pub pressed: BTreeSet<KeyPress>,
    pub released: BTreeSet<KeyPress>,
}

impl PianoChanges {
    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pressed.len() + self.released.len()
    }
}

/// Symmetric difference of two snapshots: what `next` adds and what it drops
pub fn detect_changes(next: &PianoState, prev: &PianoState) -> PianoChanges {
    PianoChanges {
        pressed: next.keys.difference(&prev.keys).copied().collect(),
        released: prev.keys.difference(&next.keys).copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_key_leaves_previous_snapshot_untouched() {
        let key = KeyIndex::new(40).unwrap();
        let empty = PianoState::new();
        let pressed = empty.set_key(key, Hand::Right, true);
        assert!(empty.is_empty());
        assert!(pressed.is_pressed(key, Hand::Right));
        assert!(!pressed.is_pressed(key, Hand::Left));
        assert!(pressed.is_key_down(key));
    }
}

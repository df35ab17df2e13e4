//! Transcription summary and JSON analysis export

use crate::keys::{Hand, KeyIndex};
use crate::midi::{NoteKind, NoteMessage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Outcome of one transcription run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionSummary {
    pub frames_processed: u64,
    pub first_frame: Option<u64>,
    pub last_frame: Option<u64>,
    pub notes_on: usize,
    pub notes_off: usize,
    pub duration_ms: u64,
    pub midi_path: PathBuf,
}

/// A sounded note reconstructed from its on/off pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSpan {
    /// MIDI note number
    pub key: u8,
    pub name: String,
    pub hand: Hand,
    pub start_ms: u64,
    /// `None` when the note was never released
    pub end_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct AnalysisResults<'a> {
    version: String,
    summary: &'a TranscriptionSummary,
    notes: Vec<NoteSpan>,
}

/// Pair note-ons with their note-offs, per key and hand
pub fn note_spans(messages: &[NoteMessage], note_offset: u8) -> Vec<NoteSpan> {
    let mut open: HashMap<(u8, Hand), usize> = HashMap::new();
    let mut spans: Vec<NoteSpan> = Vec::new();
    let mut now_ms = 0u64;

    for message in messages {
        now_ms += message.time_ms as u64;
        let slot = (message.note, message.hand);
        match message.kind {
            NoteKind::NoteOn => {
                let name = message
                    .note
                    .checked_sub(note_offset)
                    .and_then(|i| KeyIndex::new(i as usize).ok())
                    .map(KeyIndex::name)
                    .unwrap_or_else(|| format!("note{}", message.note));
                open.insert(slot, spans.len());
                spans.push(NoteSpan {
                    key: message.note,
                    name,
                    hand: message.hand,
                    start_ms: now_ms,
                    end_ms: None,
                });
            }
            NoteKind::NoteOff => {
                if let Some(idx) = open.remove(&slot) {
                    spans[idx].end_ms = Some(now_ms);
                }
            }
        }
    }

    spans
}

/// Write the summary and note list as pretty JSON
pub fn export_analysis(
    messages: &[NoteMessage],
    note_offset: u8,
    summary: &TranscriptionSummary,
    path: &Path,
) -> crate::PianoErrorResult<()> {
    let analysis = AnalysisResults {
        version: env!("CARGO_PKG_VERSION").to_string(),
        summary,
        notes: note_spans(messages, note_offset),
    };

    let json = serde_json::to_string_pretty(&analysis)?;
    std::fs::write(path, json)?;

    log::info!("Exported analysis results to {}", path.display());
    Ok(())
}

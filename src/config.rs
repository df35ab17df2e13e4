//! Configuration system for the piano-to-MIDI converter

use crate::keys::TOTAL_KEYS;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub detection: DetectionConfig,
    pub video: VideoConfig,
    pub midi: MidiConfig,
    pub export: ExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            detection: DetectionConfig::default(),
            video: VideoConfig::default(),
            midi: MidiConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Scan line sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Vertical position of the scan line, in percent of frame height
    pub scan_line_pct: u32,
    /// Segments spanning `width / noise_floor_divisor` pixels or less are noise
    pub noise_floor_divisor: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            scan_line_pct: 80,
            noise_floor_divisor: 128,
        }
    }
}

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub fps: f64,
    pub frame_start: Option<u64>,
    pub frame_end: Option<u64>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            frame_start: None,
            frame_end: None,
        }
    }
}

/// MIDI encoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    pub velocity: u8,
    /// MIDI note of key index 0 (A0)
    pub note_offset: u8,
    pub ticks_per_beat: u16,
    pub tempo_us_per_beat: u32,
    /// Emit note-offs for keys still down when the frames run out
    pub close_held_notes: bool,
}

impl Default for MidiConfig {
    fn default() -> Self {
        // 500 ticks per 500ms beat: one tick per millisecond
        Self {
            velocity: 64,
            note_offset: 21,
            ticks_per_beat: 500,
            tempo_us_per_beat: 500_000,
            close_held_notes: true,
        }
    }
}

/// Output file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub midi_filename: String,
    pub write_analysis: bool,
    pub analysis_filename: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            midi_filename: "transcription.mid".to_string(),
            write_analysis: true,
            analysis_filename: "analysis.json".to_string(),
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if !(config.video.fps.is_finite() && config.video.fps > 0.0) {
        anyhow::bail!("fps must be a positive number, got {}", config.video.fps);
    }

    if config.detection.scan_line_pct > 100 {
        anyhow::bail!(
            "scan_line_pct must be within 0..=100, got {}",
            config.detection.scan_line_pct
        );
    }

    if config.detection.noise_floor_divisor == 0 {
        anyhow::bail!("noise_floor_divisor must be positive");
    }

    validate_midi_config(&config.midi)?;

    if let (Some(start), Some(end)) = (config.video.frame_start, config.video.frame_end) {
        if start >= end {
            anyhow::bail!("frame_start ({}) must be < frame_end ({})", start, end);
        }
    }

    Ok(())
}

/// Check that every MIDI setting fits its field in the written file
pub fn validate_midi_config(midi: &MidiConfig) -> anyhow::Result<()> {
    if midi.velocity > 127 {
        anyhow::bail!("velocity must be <= 127, got {}", midi.velocity);
    }

    // Highest key must still be a valid 7-bit note
    if midi.note_offset as usize + TOTAL_KEYS - 1 > 127 {
        anyhow::bail!(
            "note_offset {} pushes the top key past MIDI note 127",
            midi.note_offset
        );
    }

    if midi.ticks_per_beat == 0 || midi.ticks_per_beat > 0x7FFF {
        anyhow::bail!("ticks_per_beat must be within 1..=32767");
    }

    if midi.tempo_us_per_beat == 0 || midi.tempo_us_per_beat > 0xFF_FFFF {
        anyhow::bail!("tempo_us_per_beat must be within 1..=16777215");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

use clap::{Parser, Subcommand};
use piano2midi::calibration::{calibrate_segments, store_segments};
use piano2midi::color::{rgb_to_hsv, HsvRange};
use piano2midi::video::{generate_timeslice, load_frame};
use piano2midi::{validate_input, Config, ImageSequenceSource, KeyColor, KeyColors, KeyKind, PianoToMidi};
use std::path::PathBuf;

/// Piano-to-MIDI Transcription System
#[derive(Parser)]
#[command(name = "piano2midi")]
#[command(about = "Convert key presses in piano performance videos to MIDI")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transcribe a directory of video frames to MIDI
    Convert {
        /// Directory of frame images, ordered by file name
        #[arg(long)]
        frames: PathBuf,

        /// Key segments calibration file
        #[arg(long)]
        segments: PathBuf,

        /// Key colours calibration file
        #[arg(long)]
        colors: PathBuf,

        /// Output directory for results
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Custom configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frames per second of the source video
        #[arg(long)]
        fps: Option<f64>,

        /// Scan line position in percent of frame height
        #[arg(long)]
        scan_line_pct: Option<u32>,

        /// First frame to process
        #[arg(long)]
        frame_start: Option<u64>,

        /// Last frame to process
        #[arg(long)]
        frame_end: Option<u64>,
    },
    /// Detect key segments on one calibration frame and store them
    CalibrateSegments {
        /// Calibration frame image
        #[arg(long)]
        frame: PathBuf,

        /// Key colours calibration file
        #[arg(long)]
        colors: PathBuf,

        /// Zone whose colour range masks the keys (e.g. left-white)
        #[arg(long)]
        zone: String,

        /// Store as white or black key segments
        #[arg(long)]
        key_color: String,

        /// Key segments file to update
        #[arg(long)]
        segments: PathBuf,

        /// Scan line position in percent of frame height
        #[arg(long, default_value_t = 80)]
        scan_line_pct: u32,

        /// Noise floor divisor of the frame width
        #[arg(long, default_value_t = 128)]
        noise_floor_divisor: u32,
    },
    /// Sample a pixel and store a colour range around it for a zone
    PickColor {
        /// Calibration frame image
        #[arg(long)]
        frame: PathBuf,

        #[arg(long)]
        x: usize,

        #[arg(long)]
        y: usize,

        /// Zone to calibrate (e.g. right-black)
        #[arg(long)]
        zone: String,

        /// Key colours calibration file to update
        #[arg(long)]
        colors: PathBuf,
    },
    /// Stack the scan line of every frame into one image
    Timeslice {
        /// Directory of frame images
        #[arg(long)]
        frames: PathBuf,

        /// Scan line position in percent of frame height
        #[arg(long, default_value_t = 80)]
        scan_line_pct: u32,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Validate configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
    /// Show default configuration
    ShowConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose && cli.quiet {
        anyhow::bail!("Cannot specify both --verbose and --quiet");
    }
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Convert {
            frames,
            segments,
            colors,
            output,
            config,
            fps,
            scan_line_pct,
            frame_start,
            frame_end,
        } => {
            // Load configuration
            let mut config = if let Some(config_path) = config {
                piano2midi::config::load_config(config_path)?
            } else {
                Config::default()
            };

            if let Some(fps) = fps {
                config.video.fps = fps;
            }
            if let Some(pct) = scan_line_pct {
                config.detection.scan_line_pct = pct;
            }
            if frame_start.is_some() {
                config.video.frame_start = frame_start;
            }
            if frame_end.is_some() {
                config.video.frame_end = frame_end;
            }

            validate_input(&frames, &segments, &colors, &config)?;

            let processor = PianoToMidi::new(config);

            if !cli.quiet {
                println!("Processing {}...", frames.display());
            }

            let summary = processor.process_directory(&frames, &segments, &colors, &output)?;

            if !cli.quiet {
                println!(
                    "{} frames, {} notes, {:.1}s -> {}",
                    summary.frames_processed,
                    summary.notes_on,
                    summary.duration_ms as f64 / 1000.0,
                    summary.midi_path.display()
                );
            }
        }
        Commands::CalibrateSegments {
            frame,
            colors,
            zone,
            key_color,
            segments,
            scan_line_pct,
            noise_floor_divisor,
        } => {
            let zone: KeyColor = zone.parse()?;
            let kind: KeyKind = key_color.parse()?;
            let colors = KeyColors::load(colors)?;
            let range = colors
                .get(zone)
                .ok_or_else(|| anyhow::anyhow!("No colour range stored for {}", zone.name()))?;

            let frame = load_frame(&frame)?;
            let detected = calibrate_segments(&frame, range, scan_line_pct, noise_floor_divisor)?;
            println!("Detected {} {} key segments", detected.len(), kind);
            store_segments(&segments, kind, detected)?;
            println!("Segments stored in {}", segments.display());
        }
        Commands::PickColor {
            frame,
            x,
            y,
            zone,
            colors,
        } => {
            let zone: KeyColor = zone.parse()?;
            let frame = load_frame(&frame)?;
            let (height, width, _) = frame.dim();
            if x >= width || y >= height {
                anyhow::bail!("Pixel ({}, {}) outside {}x{} frame", x, y, width, height);
            }

            let hsv = rgb_to_hsv([frame[[y, x, 0]], frame[[y, x, 1]], frame[[y, x, 2]]]);
            println!("Clicked color HSV: ({}, {}, {})", hsv.h, hsv.s, hsv.v);

            let mut stored = if colors.exists() {
                KeyColors::load(&colors)?
            } else {
                KeyColors::default()
            };
            stored.set(zone, HsvRange::around(hsv));
            stored.save(&colors)?;
            println!("Colour range stored for {}", zone.name());
        }
        Commands::Timeslice {
            frames,
            scan_line_pct,
            output,
        } => {
            let mut source = ImageSequenceSource::open(&frames, Config::default().video.fps)?;
            let img = generate_timeslice(&mut source, scan_line_pct)?;
            img.save(&output)?;
            println!("Timeslice image saved to {}", output.display());
        }
        Commands::ValidateConfig { config } => {
            let config = piano2midi::config::load_config(config)?;
            println!("Configuration is valid");
            if let Ok(json) = serde_json::to_string_pretty(&config) {
                println!("{}", json);
            }
        }
        Commands::ShowConfig => {
            let config = Config::default();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
    }

    Ok(())
}

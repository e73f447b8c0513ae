use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use camterm_core::display::{Gamma, GridLayout, DEFAULT_MARGIN};
use camterm_core::flush::{FrameBudget, DEFAULT_WARM_UP_FRAMES};
use camterm_core::format::Size;

pub const DEFAULT_INPUT_FORMAT: &str = if cfg!(target_os = "macos") {
    "avfoundation"
} else {
    "v4l2"
};

#[derive(Parser, Debug)]
#[command(name = "camterm", about = "Stream a camera or video file into the terminal")]
pub struct Cli {
    /// Camera device: an index or a device name for the capture backend
    #[arg(default_value = "0")]
    pub device: String,

    /// Extra capture options, e.g. "video_size=640x480,framerate=30"
    pub arguments: Option<String>,

    /// Play a video file instead of a camera stream
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Capture backend passed to ffmpeg as the input format
    #[arg(long, default_value = DEFAULT_INPUT_FORMAT)]
    pub input_format: String,

    /// Frame rate cap for the source
    #[arg(long, default_value_t = 20)]
    pub max_rate: u32,

    /// Per-frame drawing budget in milliseconds (0 = unlimited)
    #[arg(long, default_value_t = 33)]
    pub frame_time_limit_ms: u64,

    /// Leading frames drawn in full regardless of the budget
    #[arg(long, default_value_t = DEFAULT_WARM_UP_FRAMES)]
    pub warm_up_frames: u32,

    /// Largest cell grid to use, as COLSxROWS
    #[arg(long, value_parser = parse_size)]
    pub max_size: Option<Size>,

    /// Cells kept free on the right and bottom edges
    #[arg(long, default_value_t = DEFAULT_MARGIN)]
    pub margin: u32,

    /// Use the character-ramp renderer (for terminals without true color)
    #[arg(long)]
    pub ramp: bool,

    /// Ramp renderer without colors
    #[arg(long, requires = "ramp")]
    pub mono: bool,

    /// Ramp renderer gamma as R,G,B,INTENSITY, e.g. 1.1,1.0,1.0,10.0
    #[arg(long, requires = "ramp", value_parser = parse_gamma)]
    pub gamma: Option<Gamma>,

    /// Render a synthetic test pattern instead of opening ffmpeg
    #[arg(long, conflicts_with = "file")]
    pub test_pattern: bool,

    /// Consecutive failed reads before giving up
    #[arg(long, default_value_t = 30)]
    pub max_failures: u32,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Camera { input_format: String, device: String },
    File(PathBuf),
    TestPattern,
}

impl Cli {
    pub fn source(&self) -> SourceSpec {
        if self.test_pattern {
            SourceSpec::TestPattern
        } else if let Some(path) = &self.file {
            SourceSpec::File(path.clone())
        } else {
            SourceSpec::Camera {
                input_format: self.input_format.clone(),
                device: self.device.clone(),
            }
        }
    }

    pub fn budget(&self) -> FrameBudget {
        FrameBudget {
            frame_time_limit: match self.frame_time_limit_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            warm_up_frames: self.warm_up_frames,
        }
    }

    pub fn layout(&self, terminal: Size) -> GridLayout {
        GridLayout {
            terminal,
            margin: self.margin,
            max_size: self.max_size,
        }
    }

    pub fn input_options(&self) -> anyhow::Result<Vec<(String, String)>> {
        match &self.arguments {
            Some(s) => parse_arguments(s).context("invalid capture options"),
            None => Ok(Vec::new()),
        }
    }
}

/// `key1=value1,key2=value2` into ordered pairs.
pub fn parse_arguments(s: &str) -> anyhow::Result<Vec<(String, String)>> {
    s.trim()
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (key, value) = part
                .split_once('=')
                .with_context(|| format!("expected key=value, got {part:?}"))?;
            let key = key.trim();
            if key.is_empty() {
                anyhow::bail!("empty key in {part:?}");
            }
            Ok((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected COLSxROWS, got {s:?}"))?;
    let width = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    Ok(Size::new(width, height))
}

fn parse_gamma(s: &str) -> Result<Gamma, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|e| format!("bad gamma {v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values[..] {
        [red, green, blue, intensity] if values.iter().all(|g| *g > 0.0) => Ok(Gamma {
            red,
            green,
            blue,
            intensity,
        }),
        [_, _, _, _] => Err("gamma values must be positive".to_string()),
        _ => Err(format!("expected 4 comma-separated values, got {}", values.len())),
    }
}

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::color::{BarPalette, RgbColor};
use crate::error::{Error, Result};
use crate::visualizer::{FreqRange, DEFAULT_WINDOW_LEN};

pub const SENSITIVITY_RANGE: (f32, f32) = (0.1, 10.0);
pub const SMOOTHING_RANGE: (f32, f32) = (0.0, 0.95);
pub const DECAY_RANGE: (f32, f32) = (0.0, 1.0);

/// Bar count bounds regardless of display width
pub const MIN_BARS: usize = 16;
pub const MAX_BARS: usize = 320;

const MIN_WINDOW_LEN: usize = 64;
const MAX_WINDOW_LEN: usize = 16384;

/// Bar layout drawn by the frontend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    #[default]
    Bars,     // Bars grow up from the bottom edge
    Mirrored, // Bars spread left and right from the center
    Radial,   // Bars radiate out of a circle
}

impl BarMode {
    pub fn name(&self) -> &'static str {
        match self {
            BarMode::Bars => "bars",
            BarMode::Mirrored => "mirrored",
            BarMode::Radial => "radial",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BarMode::Bars => BarMode::Mirrored,
            BarMode::Mirrored => BarMode::Radial,
            BarMode::Radial => BarMode::Bars,
        }
    }
}

/// How each bar column is filled in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BarShape {
    #[default]
    Block, // Solid column
    Dots,  // Every other row, from the bottom
    Line,  // Only the top cell of the bar
}

impl BarShape {
    pub fn name(&self) -> &'static str {
        match self {
            BarShape::Block => "block",
            BarShape::Dots => "dots",
            BarShape::Line => "line",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            BarShape::Block => BarShape::Dots,
            BarShape::Dots => BarShape::Line,
            BarShape::Line => BarShape::Block,
        }
    }
}

/// Where audio comes from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Stdin, // Interleaved f32le PCM on stdin
    File,  // Interleaved f32le PCM from a file or FIFO
    Pulse, // PulseAudio/PipeWire monitor (needs the `pulse` feature)
}

impl Default for InputKind {
    fn default() -> Self {
        if cfg!(feature = "pulse") {
            InputKind::Pulse
        } else {
            InputKind::Stdin
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub visualizer: VisualizerConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub input: InputKind,
    /// PCM file or FIFO for `input = "file"`
    pub path: Option<PathBuf>,
    /// Sink whose monitor is captured (pulse only, None = default sink)
    pub device: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
    /// FFT window length, a power of two
    pub window_len: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input: InputKind::default(),
            path: None,
            device: None,
            sample_rate: 48000,
            channels: 2,
            window_len: DEFAULT_WINDOW_LEN,
        }
    }
}

impl AudioConfig {
    /// Ring buffer size: two seconds of mono audio.
    pub fn ring_capacity(&self) -> usize {
        self.sample_rate as usize * 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidSampleRate);
        }
        if !(1..=2).contains(&self.channels) {
            return Err(Error::InvalidChannels(self.channels));
        }
        if !self.window_len.is_power_of_two()
            || !(MIN_WINDOW_LEN..=MAX_WINDOW_LEN).contains(&self.window_len)
        {
            return Err(Error::InvalidWindowLength(self.window_len));
        }
        if self.window_len > self.ring_capacity() {
            return Err(Error::WindowExceedsRing {
                window_len: self.window_len,
                capacity: self.ring_capacity(),
            });
        }
        Ok(())
    }
}

/// Tuning read by the render tick. Swapped as a whole between ticks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisualizerConfig {
    /// Input gain before the response curve (0.1-10)
    pub sensitivity: f32,
    /// EMA history weight (0-0.95, higher = slower)
    pub smoothing: f32,
    /// Peak fall speed (0-1)
    pub decay: f32,
    pub freq_range: FreqRange,
    /// Display-side height multiplier
    pub magnitude: f32,
    pub bar_width: u16,
    pub gap: u16,
    pub mode: BarMode,
    pub shape: BarShape,
    pub color: RgbColor,
    pub color2: RgbColor,
    pub use_gradient: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 1.25,
            smoothing: 0.55,
            decay: 0.12,
            freq_range: FreqRange::Standard,
            magnitude: 1.0,
            bar_width: 2,
            gap: 1,
            mode: BarMode::Bars,
            shape: BarShape::Block,
            color: RgbColor::WHITE,
            color2: RgbColor::MAGENTA,
            use_gradient: false,
        }
    }
}

fn clamp_or(value: f32, (lo, hi): (f32, f32), fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

impl VisualizerConfig {
    /// Copy with every field forced into its valid range.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        Self {
            sensitivity: clamp_or(self.sensitivity, SENSITIVITY_RANGE, defaults.sensitivity),
            smoothing: clamp_or(self.smoothing, SMOOTHING_RANGE, defaults.smoothing),
            decay: clamp_or(self.decay, DECAY_RANGE, defaults.decay),
            magnitude: if self.magnitude >= 0.1 {
                self.magnitude
            } else {
                defaults.magnitude
            },
            bar_width: self.bar_width.max(1),
            ..*self
        }
    }

    /// Number of bars that fit `width` display units, within [16, 320].
    pub fn bar_count(&self, width: u32) -> usize {
        let slot = (u32::from(self.bar_width) + u32::from(self.gap)).max(1);
        ((width / slot) as usize).clamp(MIN_BARS, MAX_BARS)
    }

    pub fn palette(&self) -> BarPalette {
        BarPalette {
            color: self.color,
            color2: self.color2,
            use_gradient: self.use_gradient,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub fps: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

impl DisplayConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default XDG config path (~/.config/kickviz/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kickviz").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists.
    /// Returns None if the file is missing or fails to parse (with a warning).
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return None;
        }

        match Self::load(&path) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("{}; using defaults", e);
                None
            }
        }
    }

    /// Write the commented template to the default path and return it.
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path().ok_or(Error::NoConfigDir)?;
        let write_err = |source| Error::ConfigWrite {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(&path, Self::generate_config_template()).map_err(write_err)?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r##"# Kickviz Configuration

[audio]
# Input: "stdin", "file" or "pulse" (pulse needs a build with --features pulse)
# input = "stdin"
# PCM file or FIFO for input = "file" (interleaved 32-bit float, little endian)
# path = "/tmp/kickviz.fifo"
# Sink to monitor for input = "pulse" (omit for the default sink)
# device = "alsa_output.pci-0000_00_1f.3.analog-stereo"
# Sample rate in Hz; the ring buffer keeps two seconds of audio
sample_rate = 48000
# Interleaved channels in the input (1 or 2)
channels = 2
# FFT window length, a power of two between 64 and 16384
window_len = 2048

[visualizer]
# Input gain (0.1-10.0)
sensitivity = 1.25
# Smoothing factor (0.0-0.95, higher = smoother)
smoothing = 0.55
# Peak cap fall speed (0.0-1.0)
decay = 0.12
# Frequency range: "bass", "standard", "wide", "full"
freq_range = "standard"
# Height multiplier for drawing
magnitude = 1.0
# Bar width and gap in characters
bar_width = 2
gap = 1
# Layout: "bars", "mirrored", "radial"
mode = "bars"
# Bar fill for bars/mirrored: "block", "dots", "line"
shape = "block"
# Bar color, and gradient end color when use_gradient = true
color = "#FFFFFF"
color2 = "#FF00FF"
use_gradient = false

[display]
# Target frames per second
fps = 60
"##
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_matches_defaults() {
        let parsed = Config::parse(&Config::generate_config_template()).unwrap();
        assert_eq!(parsed.visualizer, VisualizerConfig::default());
        assert_eq!(parsed.audio.sample_rate, 48000);
        assert_eq!(parsed.audio.channels, 2);
        assert_eq!(parsed.audio.window_len, 2048);
        assert_eq!(parsed.display.fps, 60);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::parse(
            r##"
[visualizer]
freq_range = "bass"
shape = "line"
color = "#00FF00"
"##,
        )
        .unwrap();
        assert_eq!(parsed.visualizer.freq_range, FreqRange::Bass);
        assert_eq!(parsed.visualizer.shape, BarShape::Line);
        assert_eq!(parsed.visualizer.mode, BarMode::Bars);
        assert_eq!(parsed.visualizer.color, RgbColor::new(0, 255, 0));
        assert_eq!(parsed.visualizer.sensitivity, 1.25);
        assert_eq!(parsed.audio.window_len, 2048);
    }

    #[test]
    fn test_bad_config_rejected() {
        assert!(matches!(
            Config::parse("[visualizer]\ncolor = \"red\""),
            Err(Error::ConfigParse(_))
        ));
        assert!(Config::parse("[visualizer]\nmode = \"spiral\"").is_err());
    }

    #[test]
    fn test_missing_file_error() {
        let err = Config::load(Path::new("/nonexistent/kickviz.toml")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
        assert!(err.to_string().contains("/nonexistent/kickviz.toml"));
    }

    #[test]
    fn test_sanitize_clamps() {
        let config = VisualizerConfig {
            sensitivity: -1.0,
            smoothing: 2.0,
            decay: -0.5,
            magnitude: 0.0,
            bar_width: 0,
            ..Default::default()
        }
        .sanitized();

        assert_eq!(config.sensitivity, 0.1);
        assert_eq!(config.smoothing, 0.95);
        assert_eq!(config.decay, 0.0);
        assert_eq!(config.magnitude, 1.0);
        assert_eq!(config.bar_width, 1);

        let high = VisualizerConfig {
            sensitivity: 50.0,
            decay: 3.0,
            magnitude: 12.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(high.sensitivity, 10.0);
        assert_eq!(high.decay, 1.0);
        assert_eq!(high.magnitude, 12.0);
    }

    #[test]
    fn test_sanitize_replaces_nan() {
        let config = VisualizerConfig {
            sensitivity: f32::NAN,
            smoothing: f32::NAN,
            decay: f32::NAN,
            magnitude: f32::NAN,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(config, VisualizerConfig::default());
    }

    #[test]
    fn test_bar_count() {
        let config = VisualizerConfig {
            bar_width: 10,
            gap: 3,
            ..Default::default()
        };
        assert_eq!(config.bar_count(1920), 147);
        assert_eq!(config.bar_count(100), MIN_BARS);
        assert_eq!(config.bar_count(100_000), MAX_BARS);

        let degenerate = VisualizerConfig {
            bar_width: 0,
            gap: 0,
            ..Default::default()
        };
        assert_eq!(degenerate.bar_count(200), 200);
    }

    #[test]
    fn test_audio_validation() {
        assert!(AudioConfig::default().validate().is_ok());

        let bad_window = AudioConfig {
            window_len: 1000,
            ..Default::default()
        };
        assert!(matches!(bad_window.validate(), Err(Error::InvalidWindowLength(1000))));

        let too_small = AudioConfig {
            window_len: 32,
            ..Default::default()
        };
        assert!(too_small.validate().is_err());

        let channels = AudioConfig {
            channels: 6,
            ..Default::default()
        };
        assert!(matches!(channels.validate(), Err(Error::InvalidChannels(6))));

        let tiny_ring = AudioConfig {
            sample_rate: 1000,
            window_len: 4096,
            ..Default::default()
        };
        assert!(matches!(
            tiny_ring.validate(),
            Err(Error::WindowExceedsRing { capacity: 2000, .. })
        ));

        let zero_rate = AudioConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(zero_rate.validate(), Err(Error::InvalidSampleRate)));
    }

    #[test]
    fn test_frame_interval() {
        assert_eq!(DisplayConfig { fps: 50 }.frame_interval(), Duration::from_millis(20));
        assert_eq!(DisplayConfig { fps: 0 }.frame_interval(), Duration::from_secs(1));
    }
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

mod display;

use kickviz::config::{BarMode, BarShape, Config, InputKind, VisualizerConfig};
use kickviz::visualizer::FreqRange;

#[derive(Parser, Debug, Clone)]
#[command(name = "kickviz")]
#[command(author, version, about = "Real-time audio spectrum bars with peak hold")]
pub struct Args {
    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,

    /// Audio input: stdin, file or pulse
    #[arg(short, long)]
    input: Option<InputKind>,

    /// PCM file or FIFO for --input file
    #[arg(long)]
    path: Option<PathBuf>,

    /// Sink to monitor for --input pulse
    #[arg(short, long)]
    device: Option<String>,

    /// Input sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Interleaved channels in the input (1 or 2)
    #[arg(long)]
    channels: Option<u16>,

    /// FFT window length (power of two)
    #[arg(long)]
    window_len: Option<usize>,

    /// Input gain (clamped to 0.1-10)
    #[arg(short, long, allow_negative_numbers = true)]
    sensitivity: Option<f32>,

    /// Smoothing factor (clamped to 0-0.95)
    #[arg(long, allow_negative_numbers = true)]
    smoothing: Option<f32>,

    /// Peak decay rate (clamped to 0-1)
    #[arg(long, allow_negative_numbers = true)]
    decay: Option<f32>,

    /// Frequency range: bass, standard, wide, full
    #[arg(short, long)]
    freq_range: Option<FreqRange>,

    /// Layout: bars, mirrored, radial
    #[arg(short, long)]
    mode: Option<BarMode>,

    /// Bar fill: block, dots, line
    #[arg(long)]
    shape: Option<BarShape>,

    /// Bar width in characters
    #[arg(long)]
    bar_width: Option<u16>,

    /// Gap between bars in characters
    #[arg(long)]
    gap: Option<u16>,

    /// Target frames per second
    #[arg(long)]
    fps: Option<u32>,
}

impl Args {
    /// Merge CLI arguments into config (CLI takes priority)
    fn apply(&self, config: &mut Config) {
        if let Some(input) = self.input {
            config.audio.input = input;
        }
        if let Some(ref path) = self.path {
            config.audio.path = Some(path.clone());
        }
        if let Some(ref device) = self.device {
            config.audio.device = Some(device.clone());
        }
        if let Some(rate) = self.sample_rate {
            config.audio.sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.audio.channels = channels;
        }
        if let Some(len) = self.window_len {
            config.audio.window_len = len;
        }
        if let Some(fps) = self.fps {
            config.display.fps = fps;
        }
        self.apply_visualizer(&mut config.visualizer);
    }

    fn apply_visualizer(&self, config: &mut VisualizerConfig) {
        if let Some(sensitivity) = self.sensitivity {
            config.sensitivity = sensitivity;
        }
        if let Some(smoothing) = self.smoothing {
            config.smoothing = smoothing;
        }
        if let Some(decay) = self.decay {
            config.decay = decay;
        }
        if let Some(range) = self.freq_range {
            config.freq_range = range;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(shape) = self.shape {
            config.shape = shape;
        }
        if let Some(width) = self.bar_width {
            config.bar_width = width;
        }
        if let Some(gap) = self.gap {
            config.gap = gap;
        }
    }
}

/// Where runtime reloads read visualizer settings from
pub struct ConfigSource {
    path: Option<PathBuf>,
    args: Args,
}

impl ConfigSource {
    /// Re-read the config file (defaults if it is gone) and reapply CLI overrides.
    pub fn reload(&self) -> Result<VisualizerConfig> {
        let mut config = match &self.path {
            Some(path) if path.exists() => Config::load(path)?.visualizer,
            _ => VisualizerConfig::default(),
        };
        self.args.apply_visualizer(&mut config);
        Ok(config.sanitized())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kickviz=info".parse()?),
        )
        .init();

    let args = Args::parse();

    if args.init_config {
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // Load or create config
    let (mut config, path) = match &args.config {
        Some(path) => (
            Config::load(path).with_context(|| format!("Loading {}", path.display()))?,
            Some(path.clone()),
        ),
        None => (
            Config::load_from_default_path().unwrap_or_default(),
            Config::default_path(),
        ),
    };
    args.apply(&mut config);
    config.visualizer = config.visualizer.sanitized();

    info!(
        "Starting kickviz: {:?} input, {}Hz, {} channel(s), window {}",
        config.audio.input, config.audio.sample_rate, config.audio.channels, config.audio.window_len
    );

    let source = ConfigSource { path, args };
    display::terminal::run(config, source).await
}

//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or feeding the visualizer.
///
/// The per-tick DSP path never fails; these only come from the edges
/// (config files, input streams, audio backends).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config file {}: {}", .path.display(), .source)]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {}: {}", .path.display(), .source)]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Window length must be a power of two between 64 and 16384, got {0}")]
    InvalidWindowLength(usize),

    #[error("Window length {window_len} exceeds ring capacity {capacity}")]
    WindowExceedsRing { window_len: usize, capacity: usize },

    #[error("Unsupported channel count: {0} (expected 1 or 2)")]
    InvalidChannels(u16),

    #[error("Sample rate must be positive")]
    InvalidSampleRate,

    #[error("Input '{0}' requires a path")]
    MissingInputPath(&'static str),

    #[error("Audio input error: {0}")]
    Input(#[from] std::io::Error),

    #[error("Audio backend error: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

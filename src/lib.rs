//! Kickviz - real-time audio spectrum bars
//!
//! Audio arrives on its own thread and lands in a locked ring buffer. Once per
//! rendered frame the latest window is Hann-windowed, transformed, warped onto
//! a logarithmic set of bars, and run through EMA smoothing with peak-hold.
//!
//! ```text
//! audio thread ──write──▶ AudioRingBuffer ◀──read_latest── Visualizer::tick
//!                                                          │
//!                         window → FFT → map_bars → SmoothingFilter → BarFrame
//! ```

pub mod audio;
pub mod color;
pub mod config;
pub mod dsp;
pub mod error;
pub mod visualizer;

pub use error::{Error, Result};

mod analyzer;
mod mapper;
mod smoothing;

pub use analyzer::{analyze, SpectrumAnalyzer, DEFAULT_WINDOW_LEN};
pub use mapper::{bar_position, intensity, log_warp, map_bars, map_bars_into, target_bin, FreqRange};
pub use smoothing::{BarFrame, SmoothingFilter, PEAK_DECAY_STEP};

use std::sync::Arc;
use tracing::debug;

use crate::audio::AudioRingBuffer;
use crate::config::VisualizerConfig;

/// One visualizer instance: the shared ring handle plus everything the render
/// tick owns on its own (analysis buffers, raw bars, smoothing state).
pub struct Visualizer {
    ring: Arc<AudioRingBuffer>,
    analyzer: SpectrumAnalyzer,
    raw: Vec<f32>,
    filter: SmoothingFilter,
}

impl Visualizer {
    pub fn new(ring: Arc<AudioRingBuffer>, window_len: usize) -> Self {
        Self {
            ring,
            analyzer: SpectrumAnalyzer::new(window_len),
            raw: Vec::new(),
            filter: SmoothingFilter::default(),
        }
    }

    /// Handle for the audio side to write into.
    pub fn ring(&self) -> &Arc<AudioRingBuffer> {
        &self.ring
    }

    /// Run one render tick for `bars` bars with the given config snapshot.
    ///
    /// The snapshot is sanitized first, so out-of-range values are clamped
    /// rather than propagated. A new bar count resets smoothing and peaks.
    pub fn tick(&mut self, config: &VisualizerConfig, bars: usize) -> BarFrame<'_> {
        let config = config.sanitized();

        if self.filter.bars() != bars {
            debug!("Bar count changed: {} -> {}", self.filter.bars(), bars);
        }

        let spectrum = self.analyzer.tick(&self.ring);
        map_bars_into(spectrum, bars, config.freq_range, config.sensitivity, &mut self.raw);
        self.filter.update(&self.raw, config.smoothing, config.decay);
        self.filter.frame()
    }

    /// Raw (pre-smoothing) intensities from the last tick.
    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    pub fn frame(&self) -> BarFrame<'_> {
        self.filter.frame()
    }
}

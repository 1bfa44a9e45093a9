use rustfft::num_complex::Complex;

use crate::audio::AudioRingBuffer;
use crate::dsp::{apply_hann, real_magnitude_spectrum_into};

/// Default analysis window: ~43ms at 48kHz, ~23Hz per bin
pub const DEFAULT_WINDOW_LEN: usize = 2048;

/// Snapshot -> Hann window -> magnitude spectrum, once per render tick.
///
/// Buffers are kept between ticks so steady-state analysis does not allocate.
pub struct SpectrumAnalyzer {
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    spectrum: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// `window_len` must be a power of two.
    pub fn new(window_len: usize) -> Self {
        debug_assert!(window_len.is_power_of_two(), "FFT window must be a power of two");
        Self {
            window: vec![0.0; window_len],
            scratch: Vec::with_capacity(window_len),
            spectrum: Vec::with_capacity(window_len / 2),
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Analyze the latest `window_len` samples in `ring`.
    pub fn tick(&mut self, ring: &AudioRingBuffer) -> &[f32] {
        ring.read_latest_into(&mut self.window);
        apply_hann(&mut self.window);
        real_magnitude_spectrum_into(&self.window, &mut self.scratch, &mut self.spectrum);
        &self.spectrum
    }
}

/// One-shot analysis without keeping buffers around.
pub fn analyze(ring: &AudioRingBuffer, window_len: usize) -> Vec<f32> {
    SpectrumAnalyzer::new(window_len).tick(ring).to_vec()
}

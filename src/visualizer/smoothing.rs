/// Peak fall per tick at `decay = 1.0`
pub const PEAK_DECAY_STEP: f32 = 0.02;

/// Per-bar output handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct BarFrame<'a> {
    /// EMA-smoothed bar intensities
    pub smoothed: &'a [f32],
    /// Peak-hold markers, never below `smoothed`
    pub peak: &'a [f32],
}

impl BarFrame<'_> {
    pub fn len(&self) -> usize {
        self.smoothed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.smoothed.is_empty()
    }
}

/// Exponential smoothing plus peak-hold with linear decay, one slot per bar.
#[derive(Debug, Clone, Default)]
pub struct SmoothingFilter {
    smoothed: Vec<f32>,
    peak: Vec<f32>,
}

impl SmoothingFilter {
    pub fn new(bars: usize) -> Self {
        Self {
            smoothed: vec![0.0; bars],
            peak: vec![0.0; bars],
        }
    }

    pub fn bars(&self) -> usize {
        self.smoothed.len()
    }

    /// Zero all state at a new bar count. Returns true if the count changed.
    pub fn resize(&mut self, bars: usize) -> bool {
        if bars == self.bars() {
            return false;
        }
        self.smoothed.clear();
        self.smoothed.resize(bars, 0.0);
        self.peak.clear();
        self.peak.resize(bars, 0.0);
        true
    }

    /// Fold one tick of raw intensities into the state.
    ///
    /// A `raw` of a different length than the current state resets it first.
    pub fn update(&mut self, raw: &[f32], smoothing: f32, decay: f32) {
        self.resize(raw.len());

        let fall = decay * PEAK_DECAY_STEP;
        for ((smoothed, peak), &value) in self
            .smoothed
            .iter_mut()
            .zip(self.peak.iter_mut())
            .zip(raw)
        {
            *smoothed = *smoothed * smoothing + value * (1.0 - smoothing);
            *peak = (*peak - fall).max(*smoothed);
        }
    }

    pub fn frame(&self) -> BarFrame<'_> {
        BarFrame {
            smoothed: &self.smoothed,
            peak: &self.peak,
        }
    }
}

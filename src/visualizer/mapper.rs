use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Curvature of the bar-to-frequency warp; larger values push more bars
/// toward the low end.
pub const LOG_SCALE: f32 = 6.5;

/// Calibration applied to raw FFT magnitudes before the response curve
const MAGNITUDE_SCALE: f32 = 0.015;
const RESPONSE_EXPONENT: f32 = 0.85;

/// How much of the spectrum (0..Nyquist) the bars span.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FreqRange {
    Bass,
    #[default]
    Standard,
    Wide,
    Full,
}

impl FreqRange {
    /// Fraction of the magnitude spectrum used as the top bar's ceiling.
    pub fn ceiling_fraction(&self) -> f32 {
        match self {
            FreqRange::Bass => 0.035,
            FreqRange::Standard => 0.20,
            FreqRange::Wide => 0.50,
            FreqRange::Full => 1.00,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FreqRange::Bass => "bass",
            FreqRange::Standard => "standard",
            FreqRange::Wide => "wide",
            FreqRange::Full => "full",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FreqRange::Bass => FreqRange::Standard,
            FreqRange::Standard => FreqRange::Wide,
            FreqRange::Wide => FreqRange::Full,
            FreqRange::Full => FreqRange::Bass,
        }
    }
}

/// Normalized position of bar `i` across `bars` (0 for a single bar).
#[inline]
pub fn bar_position(i: usize, bars: usize) -> f32 {
    if bars <= 1 {
        0.0
    } else {
        i as f32 / (bars - 1) as f32
    }
}

/// Exponential warp of `t` in [0, 1] onto [0, 1].
#[inline]
pub fn log_warp(t: f32) -> f32 {
    ((LOG_SCALE * t).exp() - 1.0) / (LOG_SCALE.exp() - 1.0)
}

/// Spectrum bin sampled by a bar at position `t`. Never DC.
///
/// `spectrum_len` must be at least 2.
pub fn target_bin(spectrum_len: usize, t: f32, freq_range: FreqRange) -> usize {
    let max_index = (spectrum_len as f32 * freq_range.ceiling_fraction()) as i64;
    let idx = 1 + (log_warp(t) * (max_index - 2) as f32).round() as i64;
    idx.clamp(1, spectrum_len as i64 - 1) as usize
}

/// Perceptual intensity in [0, 1] for one magnitude.
#[inline]
pub fn intensity(magnitude: f32, sensitivity: f32) -> f32 {
    let v = (magnitude * MAGNITUDE_SCALE * sensitivity).powf(RESPONSE_EXPONENT);
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

/// Map a magnitude spectrum onto `bars` raw (unsmoothed) intensities.
pub fn map_bars(spectrum: &[f32], bars: usize, freq_range: FreqRange, sensitivity: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(bars);
    map_bars_into(spectrum, bars, freq_range, sensitivity, &mut out);
    out
}

/// Same as [`map_bars`], writing into `out` (resized to `bars`).
pub fn map_bars_into(
    spectrum: &[f32],
    bars: usize,
    freq_range: FreqRange,
    sensitivity: f32,
    out: &mut Vec<f32>,
) {
    out.clear();

    // Nothing but DC to look at
    if spectrum.len() < 2 {
        out.resize(bars, 0.0);
        return;
    }

    out.extend((0..bars).map(|i| {
        let idx = target_bin(spectrum.len(), bar_position(i, bars), freq_range);
        intensity(spectrum[idx], sensitivity)
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_position_degenerate_counts() {
        assert_eq!(bar_position(0, 0), 0.0);
        assert_eq!(bar_position(0, 1), 0.0);
        assert_eq!(bar_position(3, 4), 1.0);
        assert!((bar_position(1, 3) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_log_warp_endpoints_and_bias() {
        assert!(log_warp(0.0).abs() < 1e-6);
        assert!((log_warp(1.0) - 1.0).abs() < 1e-5);
        // Half the bars cover only a few percent of the range
        assert!(log_warp(0.5) < 0.05);
    }

    #[test]
    fn test_target_bin_bounds() {
        for range in [FreqRange::Bass, FreqRange::Standard, FreqRange::Wide, FreqRange::Full] {
            assert_eq!(target_bin(1024, 0.0, range), 1);
            let top = target_bin(1024, 1.0, range);
            assert!(top >= 1 && top < 1024);
        }

        // 1024 * 0.2 = 204 -> 1 + 202
        assert_eq!(target_bin(1024, 1.0, FreqRange::Standard), 203);
        // Full would land on 1023 exactly
        assert_eq!(target_bin(1024, 1.0, FreqRange::Full), 1023);
    }

    #[test]
    fn test_target_bin_tiny_spectrum() {
        // max_index - 2 goes negative; still clamped into [1, len - 1]
        assert_eq!(target_bin(2, 1.0, FreqRange::Bass), 1);
        assert_eq!(target_bin(4, 1.0, FreqRange::Full), 3);
        assert_eq!(target_bin(4, 0.7, FreqRange::Full), 1);
    }

    #[test]
    fn test_intensity_curve() {
        assert_eq!(intensity(0.0, 1.0), 0.0);
        assert_eq!(intensity(1000.0, 1.0), 1.0);

        let expected = (10.0f32 * 0.015 * 2.0).powf(0.85);
        assert!((intensity(10.0, 2.0) - expected).abs() < 1e-6);

        // Nonsense input never escapes [0, 1]
        assert_eq!(intensity(1.0, -1.0), 0.0);
        assert_eq!(intensity(f32::NAN, 1.0), 0.0);
    }

    #[test]
    fn test_map_bars_picks_bins() {
        let mut spectrum = vec![0.0f32; 1024];
        spectrum[203] = 100.0;
        spectrum[0] = 1.0e6;

        let bars = map_bars(&spectrum, 32, FreqRange::Standard, 1.0);
        assert_eq!(bars.len(), 32);
        assert_eq!(bars[31], 1.0);
        // DC never reaches a bar
        assert!(bars[..31].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_map_bars_short_spectrum() {
        assert_eq!(map_bars(&[], 8, FreqRange::Full, 1.0), vec![0.0; 8]);
        assert_eq!(map_bars(&[5.0], 3, FreqRange::Full, 1.0), vec![0.0; 3]);
        assert!(map_bars(&[1.0; 16], 0, FreqRange::Full, 1.0).is_empty());
    }

    #[test]
    fn test_freq_range_cycle() {
        let mut range = FreqRange::Bass;
        for _ in 0..4 {
            range = range.next();
        }
        assert_eq!(range, FreqRange::Bass);
        assert_eq!(FreqRange::default(), FreqRange::Standard);
    }
}

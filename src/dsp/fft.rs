//! Radix-2 FFT over `Complex<f32>` buffers.
//!
//! The analysis window length is always a power of two, so a plain iterative
//! Cooley-Tukey transform is enough here. Twiddles are advanced by complex
//! multiplication within a stage instead of calling `sin`/`cos` per butterfly.

use rustfft::num_complex::Complex;
use std::f32::consts::PI;

/// In-place forward FFT.
///
/// `data.len()` must be a power of two. Other lengths are not detected and
/// produce meaningless output.
pub fn fft_inplace(data: &mut [Complex<f32>]) {
    let n = data.len();
    if n < 2 {
        return;
    }

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f32;
        let w_len = Complex::new(angle.cos(), angle.sin());
        let half = len / 2;

        for start in (0..n).step_by(len) {
            let mut w = Complex::new(1.0f32, 0.0);
            for k in 0..half {
                let u = data[start + k];
                let v = data[start + k + half] * w;
                data[start + k] = u + v;
                data[start + k + half] = u - v;
                w *= w_len;
            }
        }

        len <<= 1;
    }
}

/// Magnitude spectrum of a real signal for bins `[0, N/2)`.
///
/// DC is included, the Nyquist bin is not.
pub fn real_magnitude_spectrum(samples: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() / 2);
    real_magnitude_spectrum_into(samples, &mut Vec::new(), &mut out);
    out
}

/// Same as [`real_magnitude_spectrum`], reusing caller-owned buffers.
pub fn real_magnitude_spectrum_into(
    samples: &[f32],
    scratch: &mut Vec<Complex<f32>>,
    out: &mut Vec<f32>,
) {
    scratch.clear();
    scratch.extend(samples.iter().map(|&s| Complex::new(s, 0.0)));

    fft_inplace(scratch);

    let nyquist = samples.len() / 2;
    out.clear();
    out.extend(scratch[..nyquist].iter().map(|c| c.norm()));
}

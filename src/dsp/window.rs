use std::f32::consts::PI;

/// Hann coefficient for sample `n` of an `len`-sample window.
///
/// Windows shorter than two samples pass everything through (1.0).
#[inline]
pub fn hann_coefficient(n: usize, len: usize) -> f32 {
    if len < 2 {
        return 1.0;
    }
    0.5 - 0.5 * (2.0 * PI * n as f32 / (len - 1) as f32).cos()
}

/// Apply a Hann window to `samples` in place.
///
/// Windows shorter than two samples are left untouched.
pub fn apply_hann(samples: &mut [f32]) {
    let len = samples.len();
    if len < 2 {
        return;
    }

    for (n, sample) in samples.iter_mut().enumerate() {
        *sample *= hann_coefficient(n, len);
    }
}

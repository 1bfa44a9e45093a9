mod fft;
mod window;

pub use fft::{fft_inplace, real_magnitude_spectrum, real_magnitude_spectrum_into};
pub use window::{apply_hann, hann_coefficient};

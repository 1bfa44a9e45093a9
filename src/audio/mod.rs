#[cfg(feature = "pulse")]
mod capture;
mod retry;
mod ring;
mod stream;

#[cfg(feature = "pulse")]
pub use capture::AudioCapture;
pub use retry::{ReadFailures, MAX_READ_FAILURES};
pub use ring::AudioRingBuffer;
pub use stream::PcmStream;

use std::sync::Arc;

use crate::config::{AudioConfig, InputKind};
use crate::error::{Error, Result};

/// Feed one planar audio callback into the ring.
///
/// Two channels are averaged, a single channel passes through. Muted
/// deliveries, deliveries without a first channel, and zero frames are
/// ignored. `frames` is bounded by the shortest channel slice given.
pub fn deliver(
    ring: &AudioRingBuffer,
    frames: usize,
    left: Option<&[f32]>,
    right: Option<&[f32]>,
    muted: bool,
) {
    let Some(left) = left else {
        return;
    };
    if muted || frames == 0 {
        return;
    }

    let frames = frames.min(left.len());
    match right {
        Some(right) => {
            let frames = frames.min(right.len());
            ring.write_iter(
                left[..frames]
                    .iter()
                    .zip(&right[..frames])
                    .map(|(l, r)| 0.5 * (l + r)),
            );
        }
        None => ring.write(&left[..frames]),
    }
}

/// Downmix interleaved samples (`channels` of 1 or 2) straight into the ring.
///
/// A trailing partial frame is dropped.
pub fn write_interleaved(ring: &AudioRingBuffer, samples: &[f32], channels: u16) {
    match channels {
        2 => ring.write_iter(
            samples
                .chunks_exact(2)
                .map(|frame| 0.5 * (frame[0] + frame[1])),
        ),
        _ => ring.write(samples),
    }
}

/// Running audio input; delivery stops when this is dropped.
pub enum AudioInput {
    Stream(PcmStream),
    #[cfg(feature = "pulse")]
    Pulse(AudioCapture),
}

/// Create the ring buffer and start the configured input feeding it.
pub fn create_audio_pipeline(config: &AudioConfig) -> Result<(AudioInput, Arc<AudioRingBuffer>)> {
    config.validate()?;
    let ring = Arc::new(AudioRingBuffer::for_sample_rate(config.sample_rate));

    let input = match config.input {
        InputKind::Stdin => AudioInput::Stream(PcmStream::stdin(config.channels, ring.clone())?),
        InputKind::File => {
            let path = config.path.as_ref().ok_or(Error::MissingInputPath("file"))?;
            AudioInput::Stream(PcmStream::open(path, config.channels, ring.clone())?)
        }
        #[cfg(feature = "pulse")]
        InputKind::Pulse => AudioInput::Pulse(AudioCapture::new(
            config.sample_rate,
            config.device.clone(),
            ring.clone(),
        )?),
        #[cfg(not(feature = "pulse"))]
        InputKind::Pulse => {
            return Err(Error::Backend(
                "PulseAudio input requires building with the `pulse` feature".to_string(),
            ))
        }
    };

    Ok((input, ring))
}

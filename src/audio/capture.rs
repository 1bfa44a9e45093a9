use libpulse_binding as pulse;
use libpulse_simple_binding as psimple;
use pulse::sample::{Format, Spec};
use pulse::stream::Direction;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::{write_interleaved, AudioRingBuffer, ReadFailures};
use crate::error::{Error, Result};

/// Stereo frames per PulseAudio read
const READ_FRAMES: usize = 1024;

/// PulseAudio/PipeWire monitor capture feeding the ring buffer.
pub struct AudioCapture {
    // Keep the thread handle to ensure it stays alive
    _capture_thread: thread::JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl AudioCapture {
    /// Start capturing from `device` (a sink name, `.monitor` is appended) or
    /// from the default sink's monitor.
    pub fn new(sample_rate: u32, device: Option<String>, ring: Arc<AudioRingBuffer>) -> Result<Self> {
        let source = match device {
            Some(sink_name) => {
                let monitor = format!("{}.monitor", sink_name);
                info!("Using explicit sink monitor: {}", monitor);
                Some(monitor)
            }
            None => Self::find_monitor_source(),
        };

        let spec = Spec {
            format: Format::F32le,
            channels: 2,
            rate: sample_rate,
        };

        if !spec.is_valid() {
            return Err(Error::Backend("Invalid PulseAudio sample spec".to_string()));
        }

        let pulse = psimple::Simple::new(
            None,              // Use default server
            "kickviz",         // Application name
            Direction::Record, // Recording stream
            source.as_deref(), // Device name (None = default)
            "audio-visualizer",
            &spec,
            None, // Default channel map
            None, // Default buffering attributes
        )
        .map_err(|e| Error::Backend(format!("Failed to connect to PulseAudio: {:?}", e)))?;

        info!(
            "Connected to PulseAudio at {}Hz, source: {}",
            sample_rate,
            source.as_deref().unwrap_or("default")
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();

        let capture_thread = thread::spawn(move || {
            Self::capture_loop(pulse, ring, stop_flag_clone);
        });

        Ok(Self {
            _capture_thread: capture_thread,
            stop_flag,
        })
    }

    fn capture_loop(pulse: psimple::Simple, ring: Arc<AudioRingBuffer>, stop_flag: Arc<AtomicBool>) {
        let mut buffer = vec![0.0f32; READ_FRAMES * 2];
        let mut failures = ReadFailures::default();

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                debug!("Stop flag set, ending capture loop");
                break;
            }

            let byte_slice = unsafe {
                std::slice::from_raw_parts_mut(
                    buffer.as_mut_ptr() as *mut u8,
                    buffer.len() * std::mem::size_of::<f32>(),
                )
            };

            if let Err(e) = pulse.read(byte_slice) {
                if !failures.record() {
                    warn!(
                        "PulseAudio read failed {} times in a row, stopping capture: {:?}",
                        failures.count(),
                        e
                    );
                    break;
                }
                warn!("PulseAudio read error: {:?}", e);
                thread::sleep(failures.backoff());
                continue;
            }
            failures.reset();

            write_interleaved(&ring, &buffer, 2);
        }
    }

    /// Monitor source of the default sink, so we capture whatever is playing.
    fn find_monitor_source() -> Option<String> {
        if let Ok(output) = std::process::Command::new("pactl")
            .args(["get-default-sink"])
            .output()
        {
            if output.status.success() {
                let sink_name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !sink_name.is_empty() {
                    let monitor = format!("{}.monitor", sink_name);
                    info!("Using default sink monitor: {}", monitor);
                    return Some(monitor);
                }
            }
        }

        warn!("Could not determine default sink, using PulseAudio default source");
        None
    }
}

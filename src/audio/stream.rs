use std::fs::File;
use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

use super::{write_interleaved, AudioRingBuffer, ReadFailures};
use crate::error::{Error, Result};

/// Frames pulled per read (~21ms at 48kHz)
const CHUNK_FRAMES: usize = 1024;

/// Raw PCM input: interleaved little-endian `f32` from stdin, a file or a FIFO.
///
/// e.g. `parec --format=float32le --channels=2 | kickviz --input stdin`
pub struct PcmStream {
    reader_thread: thread::JoinHandle<()>,
    stop_flag: Arc<AtomicBool>,
}

impl Drop for PcmStream {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

impl PcmStream {
    /// Read PCM piped into stdin. Refused when stdin is the terminal, since
    /// the key handler reads from the same descriptor.
    pub fn stdin(channels: u16, ring: Arc<AudioRingBuffer>) -> Result<Self> {
        let stdin = io::stdin();
        refuse_terminal(stdin.is_terminal())?;
        info!("Reading {}-channel f32le PCM from stdin", channels);
        Ok(Self::from_reader("stdin", stdin, channels, ring))
    }

    pub fn open(path: &Path, channels: u16, ring: Arc<AudioRingBuffer>) -> Result<Self> {
        let file = File::open(path)?;
        info!("Reading {}-channel f32le PCM from {}", channels, path.display());
        Ok(Self::from_reader("file", file, channels, ring))
    }

    /// Spawn a reader thread over any byte source.
    pub fn from_reader<R>(name: &'static str, reader: R, channels: u16, ring: Arc<AudioRingBuffer>) -> Self
    where
        R: Read + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_clone = stop_flag.clone();
        let channels = channels.clamp(1, 2);

        let reader_thread = thread::spawn(move || {
            Self::read_loop(name, reader, channels, ring, stop_flag_clone);
        });

        Self {
            reader_thread,
            stop_flag,
        }
    }

    /// True once the source hit EOF or failed.
    pub fn is_finished(&self) -> bool {
        self.reader_thread.is_finished()
    }

    fn read_loop<R: Read>(
        name: &'static str,
        mut reader: R,
        channels: u16,
        ring: Arc<AudioRingBuffer>,
        stop_flag: Arc<AtomicBool>,
    ) {
        let frame_bytes = channels as usize * std::mem::size_of::<f32>();
        let mut bytes = vec![0u8; CHUNK_FRAMES * frame_bytes];
        let mut samples = Vec::with_capacity(CHUNK_FRAMES * channels as usize);
        let mut filled = 0;
        let mut failures = ReadFailures::default();

        loop {
            if stop_flag.load(Ordering::Relaxed) {
                debug!("Stop flag set, ending {} reader", name);
                break;
            }

            let read = match reader.read(&mut bytes[filled..]) {
                Ok(0) => {
                    info!("End of {} input, audio delivery stopped", name);
                    break;
                }
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if !failures.record() {
                        warn!("PCM read on {} failed {} times in a row: {}", name, failures.count(), e);
                        break;
                    }
                    warn!("PCM read error on {}: {}", name, e);
                    thread::sleep(failures.backoff());
                    continue;
                }
            };
            failures.reset();
            filled += read;

            // Only whole frames go to the ring; the remainder waits for the next read
            let usable = filled - filled % frame_bytes;
            if usable == 0 {
                continue;
            }

            samples.clear();
            samples.extend(
                bytes[..usable]
                    .chunks_exact(4)
                    .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            );
            write_interleaved(&ring, &samples, channels);

            bytes.copy_within(usable..filled, 0);
            filled -= usable;
        }
    }
}

fn refuse_terminal(is_terminal: bool) -> Result<()> {
    if is_terminal {
        return Err(Error::Backend(
            "stdin is a terminal; pipe PCM in or use --input file".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn encode(samples: &[f32]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn wait_for(stream: &PcmStream) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !stream.is_finished() {
            assert!(Instant::now() < deadline, "reader thread did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Hands out data in awkward 3-byte pieces to exercise partial frames.
    struct Trickle(Cursor<Vec<u8>>);

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(3);
            self.0.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_stereo_stream_downmixed() {
        let ring = Arc::new(AudioRingBuffer::new(16));
        let data = encode(&[1.0, 0.0, 0.5, 0.5, -1.0, -0.5]);
        let stream = PcmStream::from_reader("test", Cursor::new(data), 2, ring.clone());
        wait_for(&stream);
        assert_eq!(ring.read_latest(3), vec![0.5, 0.5, -0.75]);
    }

    #[test]
    fn test_partial_reads_reassembled() {
        let ring = Arc::new(AudioRingBuffer::new(16));
        let data = encode(&[0.25, -0.5, 0.75]);
        let stream = PcmStream::from_reader("test", Trickle(Cursor::new(data)), 1, ring.clone());
        wait_for(&stream);
        assert_eq!(ring.read_latest(3), vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn test_truncated_trailing_frame_dropped() {
        let ring = Arc::new(AudioRingBuffer::new(4));
        let mut data = encode(&[0.5]);
        data.extend_from_slice(&[0, 0]);
        let stream = PcmStream::from_reader("test", Cursor::new(data), 1, ring.clone());
        wait_for(&stream);
        assert_eq!(ring.read_latest(2), vec![0.0, 0.5]);
    }

    #[test]
    fn test_terminal_stdin_refused() {
        let err = refuse_terminal(true).unwrap_err();
        assert!(matches!(err, Error::Backend(_)));
        assert!(err.to_string().contains("--input file"));

        let null = File::open("/dev/null").unwrap();
        assert!(refuse_terminal(null.is_terminal()).is_ok());
    }

    /// Fails a fixed number of times before handing over its data.
    struct Flaky {
        failures_left: usize,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(io::Error::other("device hiccup"));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_transient_errors_retried() {
        let ring = Arc::new(AudioRingBuffer::new(8));
        let reader = Flaky {
            failures_left: 3,
            inner: Cursor::new(encode(&[0.5, -0.25])),
        };
        let stream = PcmStream::from_reader("test", reader, 1, ring.clone());
        wait_for(&stream);
        assert_eq!(ring.read_latest(2), vec![0.5, -0.25]);
    }

    #[test]
    fn test_persistent_errors_stop_reader() {
        let ring = Arc::new(AudioRingBuffer::new(8));
        let reader = Flaky {
            failures_left: usize::MAX,
            inner: Cursor::new(Vec::new()),
        };
        let stream = PcmStream::from_reader("test", reader, 1, ring.clone());
        wait_for(&stream);
        assert_eq!(ring.read_latest(2), vec![0.0, 0.0]);
    }
}

use parking_lot::Mutex;

/// Fixed-capacity circular buffer of mono samples.
///
/// Written from the audio delivery thread, read from the render tick. Both
/// sides take the same lock for the duration of a single call, so a reader
/// never sees half of a write.
pub struct AudioRingBuffer {
    capacity: usize,
    state: Mutex<RingState>,
}

struct RingState {
    samples: Vec<f32>,
    /// Index of the next slot to write, always `< capacity`
    write_pos: usize,
}

impl AudioRingBuffer {
    /// Create a zero-filled buffer holding `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(RingState {
                samples: vec![0.0; capacity],
                write_pos: 0,
            }),
        }
    }

    /// Two seconds of history at `sample_rate`.
    pub fn for_sample_rate(sample_rate: u32) -> Self {
        Self::new(sample_rate as usize * 2)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append samples, overwriting the oldest data once full.
    pub fn write(&self, samples: &[f32]) {
        self.write_iter(samples.iter().copied());
    }

    /// Append samples from an iterator of known length.
    ///
    /// Used by the downmix paths so the mono signal is produced straight into
    /// the ring without an intermediate allocation.
    pub fn write_iter<I>(&self, samples: I)
    where
        I: IntoIterator<Item = f32>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = samples.into_iter();
        let len = iter.len();
        if len == 0 {
            return;
        }

        // Anything older than one full lap would be overwritten anyway
        let skip = len.saturating_sub(self.capacity);

        let mut state = self.state.lock();
        let mut pos = (state.write_pos + skip) % self.capacity;
        for sample in iter.skip(skip) {
            state.samples[pos] = sample;
            pos += 1;
            if pos == self.capacity {
                pos = 0;
            }
        }
        state.write_pos = pos;
    }

    /// The `n` most recent samples, oldest first.
    pub fn read_latest(&self, n: usize) -> Vec<f32> {
        let mut out = vec![0.0; n];
        self.read_latest_into(&mut out);
        out
    }

    /// Fill `out` with the `out.len()` most recent samples, oldest first.
    ///
    /// Slots that were never written read as zero. If `out` is longer than the
    /// ring, the excess leading part is zero-filled.
    pub fn read_latest_into(&self, out: &mut [f32]) {
        let available = out.len().min(self.capacity);
        let (older, recent) = out.split_at_mut(out.len() - available);
        older.fill(0.0);

        let state = self.state.lock();
        let start = (state.write_pos + self.capacity - available) % self.capacity;
        let first = (self.capacity - start).min(available);
        recent[..first].copy_from_slice(&state.samples[start..start + first]);
        recent[first..].copy_from_slice(&state.samples[..available - first]);
    }
}

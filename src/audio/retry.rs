use std::time::Duration;

/// Consecutive read failures an input thread tolerates before giving up
pub const MAX_READ_FAILURES: u32 = 20;

const RETRY_STEP: Duration = Duration::from_millis(10);
const MAX_BACKOFF_STEPS: u32 = 10;

/// Consecutive read failures on an input thread, with a growing back-off.
#[derive(Debug, Default)]
pub struct ReadFailures {
    consecutive: u32,
}

impl ReadFailures {
    /// A successful read clears the streak.
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Count one failure. Returns false once the input should stop retrying.
    pub fn record(&mut self) -> bool {
        self.consecutive = self.consecutive.saturating_add(1);
        self.consecutive < MAX_READ_FAILURES
    }

    pub fn count(&self) -> u32 {
        self.consecutive
    }

    /// Pause before the next attempt (10ms per failure, capped at 100ms).
    pub fn backoff(&self) -> Duration {
        RETRY_STEP * self.consecutive.min(MAX_BACKOFF_STEPS)
    }
}

use backon::BackoffBuilder;
use std::time::Duration;

/// Linear backoff: the wait after the n-th failure is `n * unit`.
#[derive(Debug, Clone, Copy)]
pub struct LinearBuilder {
    unit: Duration,
    max_times: usize,
}

impl LinearBuilder {
    pub fn new(unit: Duration) -> Self {
        Self { unit, max_times: 4 }
    }

    /// Number of delays handed out, i.e. retries after the first attempt.
    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = max_times;
        self
    }
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            unit: self.unit,
            max_times: self.max_times,
            attempts: 0,
        }
    }
}

#[derive(Debug)]
pub struct LinearBackoff {
    unit: Duration,
    max_times: usize,
    attempts: usize,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_times {
            return None;
        }
        self.attempts += 1;
        Some(linear_delay(self.unit, self.attempts))
    }
}

fn linear_delay(unit: Duration, attempt: usize) -> Duration {
    unit.saturating_mul(u32::try_from(attempt).unwrap_or(u32::MAX))
}

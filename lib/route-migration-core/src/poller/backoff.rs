use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

/// How the delay between two polling rounds grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackoffStrategy {
    /// Round `n` is followed by `n × base` delay.
    #[default]
    Linear,
    /// The delay doubles after each round, starting at `base`.
    Exponential,
}

impl std::str::FromStr for BackoffStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(format!(
                "unknown backoff strategy '{other}', expected 'linear' or 'exponential'"
            )),
        }
    }
}

impl BackoffStrategy {
    /// Delays to wait between rounds, at most `max_times` of them.
    pub(crate) fn delays(
        self,
        base: Duration,
        max_times: usize,
    ) -> Box<dyn Iterator<Item = Duration> + Send + Sync> {
        match self {
            Self::Linear => Box::new(LinearBuilder::new(base).with_max_times(max_times).build()),
            Self::Exponential => Box::new(
                ExponentialBuilder::default()
                    .with_min_delay(base)
                    .with_factor(2.0)
                    .with_max_times(max_times)
                    .build(),
            ),
        }
    }
}

/// Backoff whose delay grows by `base` on each attempt.
#[derive(Debug, Clone, Copy)]
pub struct LinearBuilder {
    base: Duration,
    max_times: usize,
}

impl LinearBuilder {
    /// Creates a builder starting at `base`, without attempt limit.
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            max_times: usize::MAX,
        }
    }

    /// Limits the number of delays produced.
    #[must_use]
    pub fn with_max_times(mut self, max_times: usize) -> Self {
        self.max_times = max_times;
        self
    }
}

impl BackoffBuilder for LinearBuilder {
    type Backoff = LinearBackoff;

    fn build(self) -> Self::Backoff {
        LinearBackoff {
            base: self.base,
            max_times: self.max_times,
            attempt: 0,
        }
    }
}

/// Iterator produced by [`LinearBuilder`].
#[derive(Debug)]
pub struct LinearBackoff {
    base: Duration,
    max_times: usize,
    attempt: usize,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        if self.attempt >= self.max_times {
            return None;
        }
        self.attempt += 1;
        let factor = u32::try_from(self.attempt).unwrap_or(u32::MAX);
        Some(self.base.saturating_mul(factor))
    }
}

use rand::random_range;
use std::time::Duration;

/// Supplies the pause inserted between two synthesized trajectory points.
pub trait JitterSource: Send + Sync {
    fn next_delay(&self) -> Duration;
}

/// Uniform random pause in `[min_us, max_us)` microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformJitter {
    min_us: u64,
    max_us: u64,
}

impl UniformJitter {
    pub const DEFAULT_MIN_US: u64 = 200;
    pub const DEFAULT_MAX_US: u64 = 300;

    /// Bounds are swapped if given in reverse.
    pub fn new(min_us: u64, max_us: u64) -> Self {
        let (min_us, max_us) = if min_us <= max_us {
            (min_us, max_us)
        } else {
            (max_us, min_us)
        };
        Self { min_us, max_us }
    }
}

impl Default for UniformJitter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_US, Self::DEFAULT_MAX_US)
    }
}

impl JitterSource for UniformJitter {
    fn next_delay(&self) -> Duration {
        let us = if self.min_us == self.max_us {
            self.min_us
        } else {
            random_range(self.min_us..self.max_us)
        };
        Duration::from_micros(us)
    }
}

/// No pause at all. Cancellation is still observed between points.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn next_delay(&self) -> Duration {
        Duration::ZERO
    }
}

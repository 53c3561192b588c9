use std::time::Instant;

/// A trait for time sources that return a monotonic timestamp in
/// milliseconds.
///
/// The dispatch loop only ever looks at the difference between two readings,
/// so the origin is irrelevant. Plug in a mocked source in tests to drive the
/// deadline deterministically.
///
/// # Example
///
/// ```
/// use balancer::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source measuring elapsed time since its construction.
///
/// Backed by [`Instant`], so it never goes backward when the system clock is
/// adjusted.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

use core::num::NonZeroUsize;

/// Default queue-length period at which a new request arrives.
pub const DEFAULT_ARRIVAL_PERIOD: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(period) => period,
    None => unreachable!(),
};

/// Decides when a new request joins the pending queue.
///
/// A request arrives whenever the queue length is a multiple of the period.
/// Arrivals are tied to queue depth, not to elapsed time, so the trickle is
/// deterministic for a given sequence of queue lengths. A length of zero is a
/// multiple of every period, so an emptied queue is reseeded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrivalPolicy {
    period: NonZeroUsize,
}

impl ArrivalPolicy {
    pub const fn new(period: NonZeroUsize) -> Self {
        Self { period }
    }

    pub const fn period(&self) -> NonZeroUsize {
        self.period
    }

    /// # Example
    /// ```
    /// use balancer::ArrivalPolicy;
    ///
    /// let policy = ArrivalPolicy::default();
    /// assert!(policy.should_arrive(0));
    /// assert!(!policy.should_arrive(4));
    /// assert!(policy.should_arrive(10));
    /// ```
    pub const fn should_arrive(&self, queue_len: usize) -> bool {
        queue_len % self.period.get() == 0
    }
}

impl Default for ArrivalPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ARRIVAL_PERIOD)
    }
}

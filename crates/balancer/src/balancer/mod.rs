//! The dispatch loop.
//!
//! A [`Balancer`] owns every piece of mutable state: the pending queue, the
//! worker pool and the log. Each iteration takes the front request, runs it
//! through the [`AdmissionFilter`], hands admitted requests to the front worker,
//! then lets the [`ArrivalPolicy`] and [`PoolScaler`] react to the new queue
//! depth. Nothing runs outside of [`Balancer::step`], so ordering is fully
//! determined by the queue and pool order.
//!
//! [`AdmissionFilter`]: crate::AdmissionFilter
//! [`ArrivalPolicy`]: crate::ArrivalPolicy
//! [`PoolScaler`]: crate::PoolScaler

mod config;
mod summary;
#[cfg(test)]
mod tests;

pub use config::*;
pub use summary::*;

use crate::{
    Admission, AdmissionFilter, ArrivalPolicy, LogEntry, PoolScaler, Request, RequestSource,
    ScalingDecision, SleepProvider, TimeSource, WorkerPool,
};
use core::time::Duration;
use std::collections::VecDeque;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Single-threaded load balancer over a pool of simulated workers.
pub struct Balancer<S> {
    pending: VecDeque<Request>,
    pool: WorkerPool,
    log: Vec<LogEntry>,
    filter: AdmissionFilter,
    arrivals: ArrivalPolicy,
    scaler: PoolScaler,
    idle_tick: Duration,
    source: S,
    summary: RunSummary,
}

impl<S> Balancer<S>
where
    S: RequestSource,
{
    /// Creates a balancer with `workers` workers (identities `0..workers`)
    /// and `workers * 100` requests drawn from `source`.
    ///
    /// # Example
    /// ```
    /// use balancer::{Balancer, BalancerConfig, RandomRequests};
    ///
    /// let balancer = Balancer::new(2, BalancerConfig::default(), RandomRequests::seeded(1));
    /// assert_eq!(balancer.pool().len(), 2);
    /// assert_eq!(balancer.pending_len(), 200);
    /// ```
    pub fn new(workers: usize, config: BalancerConfig, mut source: S) -> Self {
        let initial = workers.saturating_mul(REQUESTS_PER_WORKER);
        let pending: VecDeque<Request> = (0..initial).map(|_| source.next_request()).collect();
        Self::with_state(WorkerPool::with_workers(workers), pending, config, source)
    }

    /// Creates a balancer from an explicit pool and pending queue.
    pub fn with_state(
        pool: WorkerPool,
        pending: impl IntoIterator<Item = Request>,
        config: BalancerConfig,
        source: S,
    ) -> Self {
        Self {
            pending: pending.into_iter().collect(),
            pool,
            log: Vec::new(),
            filter: AdmissionFilter::new(config.blocked),
            arrivals: config.arrivals,
            scaler: config.scaler,
            idle_tick: config.idle_tick,
            source,
            summary: RunSummary::default(),
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending requests, front first.
    pub fn pending(&self) -> impl Iterator<Item = &Request> + '_ {
        self.pending.iter()
    }

    pub const fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Entries logged so far, in generation order.
    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Takes every entry logged so far, leaving the log empty.
    pub fn drain_log(&mut self) -> Vec<LogEntry> {
        core::mem::take(&mut self.log)
    }

    /// Counters accumulated so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            pool_size: self.pool.len(),
            pending: self.pending.len(),
            ..self.summary
        }
    }

    /// Runs one iteration of the dispatch loop.
    ///
    /// Returns [`Step::Idle`] without touching any state when the queue or the
    /// pool is empty, or when the front worker is busy. Otherwise the front
    /// request is consumed, and the arrival policy and scaler run once.
    ///
    /// Blocked and malformed requests are logged and dropped without engaging
    /// or rotating a worker.
    pub fn step(&mut self) -> Step {
        let step = self.dispatch_front();
        self.summary.record(&step);
        if !step.is_idle() {
            self.arrive();
            self.rescale();
        }
        step
    }

    fn dispatch_front(&mut self) -> Step {
        if self.pending.is_empty() || !self.pool.front_available() {
            return Step::Idle;
        }
        let Some(request) = self.pending.pop_front() else {
            return Step::Idle;
        };

        match self.filter.classify(&request) {
            Ok(Admission::Admitted) => match self.pool.dispatch(request) {
                Ok(completion) => {
                    self.log.push(LogEntry::Completed(completion.clone()));
                    Step::Completed(completion)
                }
                Err(request) => {
                    self.pending.push_front(request);
                    Step::Idle
                }
            },
            Ok(Admission::Blocked) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(source = request.source(), "blocked request dismissed");
                self.log.push(LogEntry::Blocked {
                    source: request.into_source(),
                });
                Step::Blocked
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "malformed request dismissed");
                self.log.push(LogEntry::Rejected {
                    source: request.into_source(),
                });
                Step::Rejected
            }
        }
    }

    fn arrive(&mut self) {
        if self.arrivals.should_arrive(self.pending.len()) {
            self.pending.push_back(self.source.next_request());
            self.summary.arrivals += 1;
        }
    }

    fn rescale(&mut self) {
        match self.scaler.evaluate(self.pending.len(), self.pool.len()) {
            Ok(ScalingDecision::Hold) => {}
            Ok(ScalingDecision::Grow { count }) => {
                self.pool.grow(count);
                self.summary.workers_added += count as u64;
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    added = count,
                    pool = self.pool.len(),
                    pending = self.pending.len(),
                    "pool grown"
                );
            }
            Ok(ScalingDecision::Shrink { count }) => {
                let removed = self.pool.shrink(count);
                self.summary.workers_removed += removed as u64;
                #[cfg(feature = "tracing")]
                tracing::debug!(
                    removed,
                    pool = self.pool.len(),
                    pending = self.pending.len(),
                    "pool shrunk"
                );
            }
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_e, "scaling skipped");
            }
        }
    }

    /// Drives the loop until `time_limit` has elapsed on `clock`.
    ///
    /// The deadline is checked once per iteration, after the step. Whenever an
    /// iteration is idle, `idle` is called with the configured idle tick
    /// instead of spinning.
    ///
    /// # Example
    /// ```
    /// use balancer::{Balancer, BalancerConfig, MonotonicClock, RandomRequests};
    /// use std::time::Duration;
    ///
    /// let mut balancer = Balancer::new(2, BalancerConfig::default(), RandomRequests::seeded(3));
    /// let summary = balancer.run(
    ///     &MonotonicClock::default(),
    ///     Duration::from_millis(20),
    ///     std::thread::sleep,
    /// );
    /// assert!(summary.entries() > 0);
    /// assert_eq!(balancer.log().len() as u64, summary.entries());
    /// ```
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, clock, idle)))]
    pub fn run<T>(
        &mut self,
        clock: &T,
        time_limit: Duration,
        mut idle: impl FnMut(Duration),
    ) -> RunSummary
    where
        T: TimeSource,
    {
        let limit = millis(time_limit);
        let start = clock.current_millis();
        loop {
            if self.step().is_idle() {
                idle(self.idle_tick);
            }
            if clock.current_millis().saturating_sub(start) >= limit {
                break;
            }
        }
        self.summary()
    }

    /// Async counterpart of [`Self::run`], idling through `P`.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self, clock)))]
    pub async fn run_async<P, T>(&mut self, clock: &T, time_limit: Duration) -> RunSummary
    where
        P: SleepProvider,
        T: TimeSource,
    {
        let limit = millis(time_limit);
        let start = clock.current_millis();
        loop {
            if self.step().is_idle() {
                P::sleep_for(self.idle_tick).await;
            }
            if clock.current_millis().saturating_sub(start) >= limit {
                break;
            }
        }
        self.summary()
    }
}

fn millis(dur: Duration) -> u64 {
    u64::try_from(dur.as_millis()).unwrap_or(u64::MAX)
}

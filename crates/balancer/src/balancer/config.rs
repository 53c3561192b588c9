use crate::{ArrivalPolicy, BlockedPrefix, PoolScaler};
use core::time::Duration;

/// Requests queued per initial worker.
pub const REQUESTS_PER_WORKER: usize = 100;

/// Default pause handed to the idle callback when nothing can be dispatched.
pub const DEFAULT_IDLE_TICK: Duration = Duration::from_millis(1);

/// Policy knobs of a [`Balancer`].
///
/// The defaults reproduce the classic setup: `200.145.x.x` blocked, an arrival
/// every fifth queue slot, a pool that never scales below one worker, and a
/// one millisecond idle tick.
///
/// [`Balancer`]: crate::Balancer
#[derive(Clone, Copy, Debug)]
pub struct BalancerConfig {
    pub blocked: BlockedPrefix,
    pub arrivals: ArrivalPolicy,
    pub scaler: PoolScaler,
    pub idle_tick: Duration,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            blocked: BlockedPrefix::default(),
            arrivals: ArrivalPolicy::default(),
            scaler: PoolScaler::default(),
            idle_tick: DEFAULT_IDLE_TICK,
        }
    }
}

//! Ratio-driven pool sizing.
//!
//! The scaler looks at how many requests are waiting per worker and asks the
//! pool to grow when it is overwhelmed or to shrink when traffic falls off.

use crate::{Error, Result};

/// Above this ratio the pool grows.
pub const GROW_ABOVE: usize = 90;

/// Below this ratio the pool shrinks.
pub const SHRINK_BELOW: usize = 40;

/// Growth adds `ratio / GROW_DIVISOR` workers.
pub const GROW_DIVISOR: usize = 10;

/// Shrinking removes `ratio / SHRINK_DIVISOR` workers.
pub const SHRINK_DIVISOR: usize = 8;

/// Decision made by the [`PoolScaler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingDecision {
    /// Leave the pool as it is.
    Hold,
    /// Append `count` new workers to the back of the pool.
    Grow { count: usize },
    /// Remove `count` workers from the front of the pool.
    Shrink { count: usize },
}

/// Grows or shrinks the worker pool from the pending-to-worker ratio.
///
/// With `ratio = pending / pool_size` (integer division):
///
/// - `ratio > 90`: grow by `ratio / 10`
/// - `ratio < 40`: shrink by `ratio / 8`, never below `min_workers`
/// - otherwise: hold
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolScaler {
    min_workers: usize,
}

impl Default for PoolScaler {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PoolScaler {
    pub const fn new(min_workers: usize) -> Self {
        Self { min_workers }
    }

    pub const fn min_workers(&self) -> usize {
        self.min_workers
    }

    /// Evaluates the current load.
    ///
    /// # Example
    /// ```
    /// use balancer::{PoolScaler, ScalingDecision};
    ///
    /// let scaler = PoolScaler::default();
    /// assert_eq!(scaler.evaluate(1_000, 10).unwrap(), ScalingDecision::Grow { count: 10 });
    /// assert_eq!(scaler.evaluate(500, 10).unwrap(), ScalingDecision::Hold);
    /// assert_eq!(scaler.evaluate(160, 10).unwrap(), ScalingDecision::Shrink { count: 2 });
    /// assert!(scaler.evaluate(160, 0).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if `pool_size` is zero; there is no
    /// ratio to act on and the caller should leave the pool untouched.
    pub fn evaluate(&self, pending: usize, pool_size: usize) -> Result<ScalingDecision> {
        let ratio = pending
            .checked_div(pool_size)
            .ok_or(Error::PoolExhausted)?;

        let decision = if ratio > GROW_ABOVE {
            ScalingDecision::Grow {
                count: ratio / GROW_DIVISOR,
            }
        } else if ratio < SHRINK_BELOW {
            let spare = pool_size.saturating_sub(self.min_workers);
            match (ratio / SHRINK_DIVISOR).min(spare) {
                0 => ScalingDecision::Hold,
                count => ScalingDecision::Shrink { count },
            }
        } else {
            ScalingDecision::Hold
        };

        Ok(decision)
    }
}

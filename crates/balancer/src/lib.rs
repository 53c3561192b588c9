//! A single-threaded load balancer simulation.
//!
//! Synthetic [`Request`]s wait in a FIFO queue and are dispatched, one per
//! iteration, to the front [`Worker`] of a round-robin [`WorkerPool`]. Requests
//! from a blocked network range are dismissed by the [`AdmissionFilter`], new
//! requests trickle in through the [`ArrivalPolicy`], and the [`PoolScaler`]
//! grows or shrinks the pool from the ratio of pending requests to workers.
//!
//! The [`Balancer`] ties these together and runs until a wall-clock deadline
//! measured on a pluggable [`TimeSource`]. Request generation ([`RequestSource`])
//! and log persistence ([`LogSink`]) are injected, so a run can be made fully
//! deterministic.
//!
//! ```
//! use balancer::{Balancer, BalancerConfig, LogSink, MonotonicClock, RandomRequests, WriterSink};
//! use std::time::Duration;
//!
//! let mut balancer = Balancer::new(2, BalancerConfig::default(), RandomRequests::seeded(9));
//! balancer.run(&MonotonicClock::default(), Duration::from_millis(10), std::thread::sleep);
//!
//! let mut sink = WriterSink::new(Vec::new());
//! sink.write_entries(&balancer.drain_log()).unwrap();
//! assert!(!sink.into_inner().is_empty());
//! ```

mod admission;
mod arrival;
mod balancer;
mod error;
mod log;
mod pool;
mod rand;
mod request;
mod runtime;
mod scaler;
mod time;
mod worker;

pub use crate::admission::*;
pub use crate::arrival::*;
pub use crate::balancer::*;
pub use crate::error::*;
pub use crate::log::*;
pub use crate::pool::*;
pub use crate::rand::*;
pub use crate::request::*;
pub use crate::runtime::*;
pub use crate::scaler::*;
pub use crate::time::*;
pub use crate::worker::*;

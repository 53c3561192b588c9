use core::{future::Future, time::Duration};

/// A trait that abstracts over how to sleep for a given [`Duration`] in async
/// contexts.
///
/// This allows the dispatch loop to idle without tying it to one runtime.
pub trait SleepProvider {
    fn sleep_for(dur: Duration) -> impl Future<Output = ()> + Send;
}

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for use in async applications built on Tokio.
#[cfg(feature = "async-tokio")]
pub struct TokioSleep;

#[cfg(feature = "async-tokio")]
impl SleepProvider for TokioSleep {
    async fn sleep_for(dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// Idle ticks return to the scheduler immediately instead of waiting on a
/// timer. The loop reacts to the deadline sooner but polls much harder while
/// the queue or pool is empty.
#[cfg(feature = "async-tokio")]
pub struct TokioYield;

#[cfg(feature = "async-tokio")]
impl SleepProvider for TokioYield {
    async fn sleep_for(_dur: Duration) {
        tokio::task::yield_now().await;
    }
}

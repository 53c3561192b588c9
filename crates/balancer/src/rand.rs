use crate::{MAX_WORK, MIN_WORK, Request};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A factory for new requests.
///
/// The dispatch loop never constructs requests itself; it asks its source for
/// one whenever the initial queue is filled or the arrival policy fires. Plug
/// in a seeded source for reproducible runs or a scripted one in tests.
pub trait RequestSource {
    /// Produces the next request.
    fn next_request(&mut self) -> Request;
}

impl<F> RequestSource for F
where
    F: FnMut() -> Request,
{
    fn next_request(&mut self) -> Request {
        self()
    }
}

/// A [`RequestSource`] drawing uniformly random addresses and work amounts.
///
/// Each octet is uniform in `0..=255` and the work is uniform in
/// `MIN_WORK..=MAX_WORK`.
#[derive(Debug, Clone)]
pub struct RandomRequests<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomRequests<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomRequests<StdRng> {
    /// A reproducible source.
    ///
    /// # Example
    /// ```
    /// use balancer::{RandomRequests, RequestSource};
    ///
    /// let mut a = RandomRequests::seeded(7);
    /// let mut b = RandomRequests::seeded(7);
    /// assert_eq!(a.next_request(), b.next_request());
    /// ```
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// A source seeded from the thread-local RNG.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_rng(&mut rand::rng()))
    }
}

impl<R: Rng> RequestSource for RandomRequests<R> {
    fn next_request(&mut self) -> Request {
        let [a, b, c, d]: [u8; 4] = self.rng.random();
        let work = self.rng.random_range(MIN_WORK..=MAX_WORK);
        Request::new(format!("{a}.{b}.{c}.{d}"), work)
    }
}

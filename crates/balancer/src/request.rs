use core::fmt;

/// Smallest amount of work a generated request carries.
pub const MIN_WORK: u32 = 1;

/// Largest amount of work a generated request carries.
pub const MAX_WORK: u32 = 50;

/// A synthetic request waiting in the pending queue.
///
/// The source address is kept as text: requests may come from any
/// [`RequestSource`], and a malformed address is only detected when the
/// [`AdmissionFilter`] classifies it.
///
/// [`RequestSource`]: crate::RequestSource
/// [`AdmissionFilter`]: crate::AdmissionFilter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    source: String,
    remaining_work: u32,
}

impl Request {
    /// Creates a request from a source address and an amount of work.
    ///
    /// # Example
    /// ```
    /// use balancer::Request;
    ///
    /// let request = Request::new("10.0.0.1", 12);
    /// assert_eq!(request.source(), "10.0.0.1");
    /// assert_eq!(request.remaining_work(), 12);
    /// ```
    pub fn new(source: impl Into<String>, remaining_work: u32) -> Self {
        Self {
            source: source.into(),
            remaining_work,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn remaining_work(&self) -> u32 {
        self.remaining_work
    }

    /// Performs one unit of work. Returns `false` once nothing is left.
    pub(crate) fn work_cycle(&mut self) -> bool {
        match self.remaining_work.checked_sub(1) {
            Some(left) => {
                self.remaining_work = left;
                true
            }
            None => false,
        }
    }

    pub(crate) fn into_source(self) -> String {
        self.source
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} units)", self.source, self.remaining_work)
    }
}

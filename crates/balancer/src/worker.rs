use crate::Request;
use core::fmt;

/// Identity of a worker. Assigned once and never reused.
pub type WorkerId = u64;

/// A simulated server.
///
/// Workers live inside a [`WorkerPool`] and are only ever engaged by the
/// dispatch loop, one request at a time.
///
/// [`WorkerPool`]: crate::WorkerPool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    id: WorkerId,
    available: bool,
}

impl Worker {
    pub const fn new(id: WorkerId) -> Self {
        Self {
            id,
            available: true,
        }
    }

    pub const fn id(&self) -> WorkerId {
        self.id
    }

    pub const fn is_available(&self) -> bool {
        self.available
    }

    /// Processes a request to completion.
    ///
    /// The worker is marked unavailable for the duration of the call and the
    /// request's work is drained one cycle at a time. The returned
    /// [`Completion`] reports the number of cycles it took, which always equals
    /// the request's initial remaining work.
    ///
    /// # Example
    /// ```
    /// use balancer::{Request, Worker};
    ///
    /// let mut worker = Worker::new(3);
    /// let completion = worker.process(Request::new("10.1.2.3", 7));
    ///
    /// assert_eq!(completion.worker(), 3);
    /// assert_eq!(completion.cycles(), 7);
    /// assert!(worker.is_available());
    /// ```
    pub fn process(&mut self, mut request: Request) -> Completion {
        self.available = false;

        let mut cycles = 0;
        while request.work_cycle() {
            cycles += 1;
        }

        self.available = true;

        Completion {
            worker: self.id,
            source: request.into_source(),
            cycles,
        }
    }
}

/// Record of a request a worker finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    worker: WorkerId,
    source: String,
    cycles: u32,
}

impl Completion {
    pub const fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub const fn cycles(&self) -> u32 {
        self.cycles
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completed request (ID: {}): {} in {} cycles",
            self.worker, self.source, self.cycles
        )
    }
}

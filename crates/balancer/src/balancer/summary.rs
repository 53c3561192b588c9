use crate::Completion;

/// Outcome of a single dispatch-loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing could be dispatched: the queue or pool is empty, or the front
    /// worker is busy.
    Idle,
    /// A worker finished the front request.
    Completed(Completion),
    /// The front request came from the blocked range and was dismissed.
    Blocked,
    /// The front request had a malformed address and was dismissed.
    Rejected,
}

impl Step {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Counters collected while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub iterations: u64,
    pub idle_ticks: u64,
    pub completed: u64,
    pub blocked: u64,
    pub rejected: u64,
    pub arrivals: u64,
    pub workers_added: u64,
    pub workers_removed: u64,
    pub pool_size: usize,
    pub pending: usize,
}

impl RunSummary {
    pub(crate) fn record(&mut self, step: &Step) {
        self.iterations += 1;
        match step {
            Step::Idle => self.idle_ticks += 1,
            Step::Completed(_) => self.completed += 1,
            Step::Blocked => self.blocked += 1,
            Step::Rejected => self.rejected += 1,
        }
    }

    /// Number of log entries the run produced.
    pub const fn entries(&self) -> u64 {
        self.completed + self.blocked + self.rejected
    }
}

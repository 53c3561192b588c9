use crate::{Completion, Request, Worker, WorkerId};
use std::collections::VecDeque;

/// FIFO pool of workers with round-robin reuse.
///
/// Only the worker at the front of the pool is ever engaged. Once it has
/// processed a request it moves to the back, so consecutive dispatches cycle
/// through the pool in order.
///
/// Identities come from a monotonic counter owned by the pool rather than from
/// the pool's current size, so no two workers ever share an identity, even
/// after the pool has shrunk and grown again.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: VecDeque<Worker>,
    next_id: WorkerId,
}

impl WorkerPool {
    /// Creates a pool of `count` workers with identities `0..count`.
    ///
    /// # Example
    /// ```
    /// use balancer::WorkerPool;
    ///
    /// let pool = WorkerPool::with_workers(3);
    /// assert_eq!(pool.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    /// ```
    pub fn with_workers(count: usize) -> Self {
        let mut pool = Self {
            workers: VecDeque::with_capacity(count),
            next_id: 0,
        };
        pool.grow(count);
        pool
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Identities in pool order, front first.
    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.workers.iter().map(Worker::id)
    }

    /// Whether the front worker exists and is idle.
    pub fn front_available(&self) -> bool {
        self.workers.front().is_some_and(Worker::is_available)
    }

    /// Hands `request` to the front worker and rotates it to the back.
    ///
    /// # Errors
    ///
    /// Gives the request back if the pool is empty or the front worker is
    /// busy; nothing is mutated in that case.
    pub fn dispatch(&mut self, request: Request) -> Result<Completion, Request> {
        if !self.front_available() {
            return Err(request);
        }
        let Some(mut worker) = self.workers.pop_front() else {
            return Err(request);
        };
        let completion = worker.process(request);
        self.workers.push_back(worker);
        Ok(completion)
    }

    /// Appends `count` fresh workers to the back of the pool.
    pub fn grow(&mut self, count: usize) {
        self.workers.reserve(count);
        for _ in 0..count {
            let id = self.next_id;
            self.next_id += 1;
            self.workers.push_back(Worker::new(id));
        }
    }

    /// Removes up to `count` workers from the front of the pool, regardless
    /// of their availability. Returns how many were removed.
    pub fn shrink(&mut self, count: usize) -> usize {
        let count = count.min(self.workers.len());
        self.workers.drain(..count);
        count
    }
}

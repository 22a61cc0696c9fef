//! Owned worker pool
//!
//! Background jobs (the picking poller and script-style interactions) run on
//! a pool that the application creates and hands to the components that need
//! it. There is no process-wide instance.

use crossbeam::channel::{unbounded, Receiver, Sender};
use std::fmt;
use std::thread;
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker pool errors
#[derive(Error, Debug)]
pub enum WorkerPoolError {
    /// The pool has been shut down and no longer accepts jobs
    #[error("worker pool is shut down")]
    ShutDown,

    /// A worker thread could not be spawned
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Fixed-size thread pool fed through a crossbeam channel
///
/// Dropping the pool closes the job channel and joins every worker, so any
/// long-running job must be told to stop before the pool goes away.
pub struct WorkerPool {
    workers: Vec<Worker>,
    sender: Option<Sender<Job>>,
}

impl WorkerPool {
    /// Create a pool with `size` named worker threads (at least one)
    pub fn new(size: usize) -> Result<Self, WorkerPoolError> {
        let size = size.max(1);
        let (sender, receiver) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            workers.push(Worker::spawn(id, receiver.clone())?);
        }
        log::debug!("worker pool started with {} threads", size);

        Ok(Self {
            workers,
            sender: Some(sender),
        })
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queue a job for execution on the next idle worker
    pub fn execute<F>(&self, f: F) -> Result<(), WorkerPoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(WorkerPoolError::ShutDown)?;
        sender.send(Box::new(f)).map_err(|_| WorkerPoolError::ShutDown)
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.workers.len())
            .field("accepting", &self.sender.is_some())
            .finish()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel ends each worker's recv loop
        self.sender.take();
        for worker in &mut self.workers {
            if let Some(handle) = worker.thread.take() {
                if handle.join().is_err() {
                    log::error!("worker {} panicked", worker.id);
                }
            }
        }
    }
}

struct Worker {
    id: usize,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, receiver: Receiver<Job>) -> Result<Self, WorkerPoolError> {
        let thread = thread::Builder::new()
            .name(format!("viewer-worker-{id}"))
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job();
                }
                log::trace!("worker {} exiting", id);
            })?;

        Ok(Self {
            id,
            thread: Some(thread),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_jobs_run_before_drop_returns() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(3).unwrap();
            assert_eq!(pool.size(), 3);
            for _ in 0..16 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_zero_size_is_clamped() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.size(), 1);
    }
}

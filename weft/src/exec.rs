//! Serialized task execution and cooperative shutdown signalling.
//!
//! [`SerialExecutor`] is the single-concurrency queue behind the admission
//! coordinator: jobs run on one worker thread, strictly in submission
//! order, never overlapping. A panic inside a job is caught and logged so
//! the worker stays alive for subsequent submissions. The worker thread is
//! detached and cannot keep the hosting process from exiting.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::error;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Single-worker FIFO executor.
pub struct SerialExecutor {
    tx: Sender<Job>,
}

impl SerialExecutor {
    /// Spawn the worker thread and return the submission handle.
    #[must_use]
    pub fn new(name: &str) -> Self {
        let (tx, rx): (Sender<Job>, Receiver<Job>) = unbounded();
        let worker = name.to_string();
        thread::spawn(move || {
            for job in rx {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    error!("{worker}: task panicked, worker continues");
                }
            }
        });
        Self { tx }
    }

    /// Enqueue a job; the returned handle resolves once the job finished
    /// (normally or by panic) or the executor shut down before running it.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> TaskHandle {
        let (done_tx, done_rx) = bounded(1);
        let wrapped: Job = Box::new(move || {
            job();
            let _ = done_tx.send(());
        });
        // A send failure means the queue already closed; dropping the job
        // drops done_tx and the handle resolves immediately.
        let _ = self.tx.send(wrapped);
        TaskHandle { done_rx }
    }
}

/// Completion handle for one submitted job.
pub struct TaskHandle {
    done_rx: Receiver<()>,
}

impl TaskHandle {
    /// Block until the job finished. Panicked jobs resolve too: the sender
    /// side is dropped during unwinding.
    pub fn wait(&self) {
        let _ = self.done_rx.recv();
    }
}

/// Explicit cancellation signal shared between a loop and its owner.
#[derive(Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_signalled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

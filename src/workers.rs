//! Bounded worker pools for the chunk pipeline.
//!
//! Workers never see the chunk store: a job carries serialized buffer
//! copies in, the outcome carries an updated buffer (or mesh) out, and the
//! coordinator reinstates it. A panicking task is reported as a failed
//! outcome rather than poisoning anything.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;
use voxelforge_world::ChunkPos;

use crate::EngineError;

/// Completion message for one task.
#[derive(Debug)]
pub struct TaskOutcome<R> {
    pub coord: ChunkPos,
    pub result: Result<R, EngineError>,
}

/// Fixed-size pool of worker threads consuming jobs of one stage.
pub struct WorkerPool<J, R> {
    job_tx: Option<Sender<J>>,
    outcome_rx: Receiver<TaskOutcome<R>>,
    handles: Vec<JoinHandle<()>>,
}

impl<J: Send + 'static, R: Send + 'static> WorkerPool<J, R> {
    /// Spawn `workers` threads running `run` over submitted jobs.
    ///
    /// `key` extracts the chunk coordinate reported with every outcome,
    /// including panics (the job itself is consumed by then).
    pub fn new<K, F>(name: &str, workers: usize, key: K, run: F) -> Self
    where
        K: Fn(&J) -> ChunkPos + Send + Sync + 'static,
        F: Fn(J) -> Result<R, EngineError> + Send + Sync + 'static,
    {
        let (job_tx, job_rx) = unbounded::<J>();
        let (outcome_tx, outcome_rx) = unbounded::<TaskOutcome<R>>();
        let key = Arc::new(key);
        let run = Arc::new(run);

        let mut handles = Vec::with_capacity(workers.max(1));
        for index in 0..workers.max(1) {
            let job_rx = job_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let key = Arc::clone(&key);
            let run = Arc::clone(&run);
            let handle = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || {
                    while let Ok(job) = job_rx.recv() {
                        let coord = key(&job);
                        let result = match catch_unwind(AssertUnwindSafe(|| run(job))) {
                            Ok(result) => result,
                            Err(panic) => Err(EngineError::WorkerTaskFailed(panic_message(panic))),
                        };
                        if outcome_tx.send(TaskOutcome { coord, result }).is_err() {
                            break; // coordinator is gone
                        }
                    }
                    debug!("worker thread exiting");
                })
                .expect("failed to spawn worker thread");
            handles.push(handle);
        }

        Self {
            job_tx: Some(job_tx),
            outcome_rx,
            handles,
        }
    }

    /// Queue a job for the pool.
    pub fn submit(&self, job: J) {
        if let Some(tx) = &self.job_tx {
            // Send only fails when every worker is gone; the coordinator
            // notices via missing outcomes.
            let _ = tx.send(job);
        }
    }

    /// Fetch one finished outcome without blocking.
    pub fn try_recv(&self) -> Option<TaskOutcome<R>> {
        self.outcome_rx.try_recv().ok()
    }
}

impl<J, R> Drop for WorkerPool<J, R> {
    fn drop(&mut self) {
        // Closing the job channel lets the workers drain and exit.
        self.job_tx.take();
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}

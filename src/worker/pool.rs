//! Worker pool management.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::info;

use crate::crypto::{KeyError, OnionAddress};
use crate::error::SearchError;
use crate::matcher::Matcher;

use super::cpu::{CpuWorker, WorkerStats};

/// A confirmed onion name and its key.
#[derive(Debug, Clone)]
pub struct OnionResult {
    /// The characters the matcher accepted
    pub matched: String,
    /// Number of matched characters
    pub matched_len: usize,
    /// The name derived from the final key
    pub onion: OnionAddress,
    /// PKCS#1 PEM encoded private key
    pub private_key: String,
    /// The public exponent of the final key
    pub exponent: u32,
    /// The ID of the worker that found this result
    pub worker_id: usize,
}

/// What the pool has to report to the main thread.
#[derive(Debug)]
pub enum PoolEvent {
    /// A worker confirmed a match
    Found(OnionResult),
    /// Nothing happened before the timeout
    Idle,
    /// Every worker has exited
    Finished,
}

/// Runs a fixed set of search threads against one stop flag.
pub struct WorkerPool {
    /// Number of workers
    num_workers: usize,
    /// Worker thread handles (Option to allow taking during join)
    handles: Option<Vec<JoinHandle<Result<(), KeyError>>>>,
    /// Channel receiver for results
    result_rx: Receiver<OnionResult>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
    /// Start time
    start_time: Instant,
}

impl WorkerPool {
    /// Starts `num_workers` workers searching with `matcher`.
    pub fn new(num_workers: usize, matcher: Matcher, continuous: bool) -> Result<Self, SearchError> {
        let (result_tx, result_rx) = unbounded();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(WorkerStats::new(num_workers));

        let handles = match Self::spawn_workers(
            num_workers,
            &matcher,
            continuous,
            result_tx,
            &stop_flag,
            &stats,
        ) {
            Ok(handles) => handles,
            Err(err) => {
                stop_flag.store(true, Ordering::Release);
                return Err(err);
            }
        };

        Ok(Self {
            num_workers,
            handles: Some(handles),
            result_rx,
            stop_flag,
            stats,
            start_time: Instant::now(),
        })
    }

    /// Spawns worker threads. The initial sender is dropped on return, so
    /// the channel disconnects once every worker has exited.
    fn spawn_workers(
        num_workers: usize,
        matcher: &Matcher,
        continuous: bool,
        result_tx: Sender<OnionResult>,
        stop_flag: &Arc<AtomicBool>,
        stats: &Arc<WorkerStats>,
    ) -> Result<Vec<JoinHandle<Result<(), KeyError>>>, SearchError> {
        (0..num_workers)
            .map(|id| {
                let worker = CpuWorker::new(
                    id,
                    matcher.clone(),
                    continuous,
                    result_tx.clone(),
                    stop_flag.clone(),
                    stats.clone(),
                );
                let stop_flag = stop_flag.clone();

                let handle = thread::Builder::new()
                    .name(format!("onion-worker-{}", id))
                    .spawn(move || {
                        let outcome = worker.run();
                        if outcome.is_err() {
                            // Fatal for the whole search.
                            stop_flag.store(true, Ordering::Release);
                        }
                        outcome
                    })
                    .map_err(SearchError::Spawn)?;

                info!("Thread #{} started.", id + 1);
                Ok(handle)
            })
            .collect()
    }

    /// Waits for the next event, or until `timeout` expires if one is given.
    pub fn next_event(&self, timeout: Option<Duration>) -> PoolEvent {
        let received = match timeout {
            Some(timeout) => self.result_rx.recv_timeout(timeout),
            None => self
                .result_rx
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(result) => PoolEvent::Found(result),
            Err(RecvTimeoutError::Timeout) => PoolEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => PoolEvent::Finished,
        }
    }

    /// Signals all workers to stop.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
    }

    /// Stops and joins all workers, returning the first worker failure.
    pub fn join(mut self) -> Result<(), SearchError> {
        self.stop();
        let mut first_error = None;
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let outcome = match handle.join() {
                    Ok(outcome) => outcome.map_err(SearchError::Key),
                    Err(_) => Err(SearchError::WorkerPanicked),
                };
                if let Err(err) = outcome {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Returns the number of workers.
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the total trials across all workers.
    pub fn total_trials(&self) -> u64 {
        self.stats.total_trials()
    }

    /// Returns the trials performed by worker `id`.
    pub fn worker_trials(&self, id: usize) -> u64 {
        self.stats.worker_trials(id)
    }

    /// Returns the total confirmed matches.
    pub fn total_matches(&self) -> u64 {
        self.stats.total_matches()
    }

    /// Returns the elapsed time since the pool was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a clone of the stop flag for external use (e.g., signal handlers).
    pub fn stop_flag_clone(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// Returns true if the pool has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
        // Wait for workers to finish if they haven't been joined
        if let Some(handles) = self.handles.take() {
            for handle in handles {
                let _ = handle.join();
            }
        }
    }
}

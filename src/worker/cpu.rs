//! CPU worker: the per-thread search loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use rsa::BigUint;
use tracing::{info, warn};

use crate::crypto::base32::{self, RAW_LEN};
use crate::crypto::keypair::{exponents, WIDE_EXPONENT};
use crate::crypto::{
    assign_exponent, derive_onion, private_key_pem, KeyCandidate, KeyError, OnionAddress,
    Rejection,
};
use crate::matcher::Matcher;

use super::OnionResult;

/// How long a worker sleeps after catching a corrupted result.
pub const CORRUPTION_PAUSE: Duration = Duration::from_secs(30);

/// Trials counted locally before being published to the shared counter.
const FLUSH_INTERVAL: u64 = 4096;

/// Per-worker trial counters plus a shared match counter.
///
/// Counters are only read for progress reports, never for control decisions.
#[derive(Debug)]
pub struct WorkerStats {
    trials: Box<[AtomicU64]>,
    matches: AtomicU64,
}

impl WorkerStats {
    /// Creates counters for `workers` workers.
    pub fn new(workers: usize) -> Self {
        Self {
            trials: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            matches: AtomicU64::new(0),
        }
    }

    /// Adds `n` trials to worker `id`.
    #[inline]
    pub fn record_trials(&self, id: usize, n: u64) {
        if let Some(counter) = self.trials.get(id) {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Returns the trials performed by worker `id`.
    pub fn worker_trials(&self, id: usize) -> u64 {
        self.trials
            .get(id)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Returns the sum over all workers.
    pub fn total_trials(&self) -> u64 {
        self.trials.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    /// Returns the number of confirmed matches.
    pub fn total_matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }
}

/// Why a matched candidate was not reported.
#[derive(Debug, thiserror::Error)]
pub enum MatchFailure {
    #[error("key check failed: {0}")]
    Rejected(#[from] Rejection),

    #[error("found {found}, but finalized to {actual}")]
    Mismatch {
        found: OnionAddress,
        actual: OnionAddress,
    },

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Turns a fast-path match into a reportable result.
///
/// The key is rebuilt around exponent `e` and validated, then its name is
/// derived again from scratch. The two names must agree on the first
/// `matched_len` characters.
pub fn confirm_match(
    candidate: &KeyCandidate,
    e: u32,
    found: &OnionAddress,
    matched_len: usize,
    worker_id: usize,
) -> Result<OnionResult, MatchFailure> {
    let key = assign_exponent(candidate.key(), &BigUint::from(e))?;
    let actual = derive_onion(&key)?;

    if !found.agrees_with(&actual, matched_len) {
        return Err(MatchFailure::Mismatch {
            found: *found,
            actual,
        });
    }

    Ok(OnionResult {
        matched: found.prefix(matched_len).to_owned(),
        matched_len,
        onion: actual,
        private_key: private_key_pem(&key)?,
        exponent: e,
        worker_id,
    })
}

/// How the search over one key ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A result was sent
    Found,
    /// The fast and full derivations disagreed; the key was dropped
    Corrupted,
    /// Every exponent was tried without a confirmed match
    Exhausted,
    /// A match past [`WIDE_EXPONENT`] could not be confirmed; the key was dropped
    WideExponent,
    /// The stop flag was raised
    Stopped,
}

/// A worker that generates keys and searches their exponent space.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    /// The search strategy
    matcher: Matcher,
    /// Keep going after a result
    continuous: bool,
    /// Channel to send results
    result_tx: Sender<OnionResult>,
    /// Shared stop flag
    stop_flag: Arc<AtomicBool>,
    /// Shared statistics
    stats: Arc<WorkerStats>,
    /// Pause after a corrupted result
    corruption_pause: Duration,
}

impl CpuWorker {
    /// Creates a new CPU worker.
    pub fn new(
        id: usize,
        matcher: Matcher,
        continuous: bool,
        result_tx: Sender<OnionResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            id,
            matcher,
            continuous,
            result_tx,
            stop_flag,
            stats,
            corruption_pause: CORRUPTION_PAUSE,
        }
    }

    /// Overrides the pause taken after a corrupted result.
    pub fn with_corruption_pause(mut self, pause: Duration) -> Self {
        self.corruption_pause = pause;
        self
    }

    /// Runs the worker loop until the stop flag is raised.
    ///
    /// Key generation and encoding failures end the loop with an error.
    pub fn run(&self) -> Result<(), KeyError> {
        while !self.is_stopped() {
            let candidate = KeyCandidate::generate()?;
            self.search_key(&candidate)?;
        }
        Ok(())
    }

    /// Tries every exponent of one key.
    pub fn search_key(&self, candidate: &KeyCandidate) -> Result<KeyOutcome, KeyError> {
        self.search_exponents(candidate, exponents())
    }

    /// Tries the given exponents of one key, in order.
    pub fn search_exponents<I>(&self, candidate: &KeyCandidate, exponents: I) -> Result<KeyOutcome, KeyError>
    where
        I: IntoIterator<Item = u32>,
    {
        let mut pending = 0u64;

        for e in exponents {
            if self.is_stopped() {
                self.stats.record_trials(self.id, pending);
                return Ok(KeyOutcome::Stopped);
            }

            let digest = candidate.trial(e);
            pending += 1;
            if pending == FLUSH_INTERVAL {
                self.stats.record_trials(self.id, pending);
                pending = 0;
            }

            let mut raw = [0u8; RAW_LEN];
            raw.copy_from_slice(&digest[..RAW_LEN]);
            let onion = OnionAddress::from_encoded(base32::encode(&raw));

            let Some(matched_len) = self.matcher.evaluate(&raw, &onion) else {
                continue;
            };

            match confirm_match(candidate, e, &onion, matched_len, self.id) {
                Ok(result) => {
                    self.stats.record_trials(self.id, pending);
                    self.stats.matches.fetch_add(1, Ordering::Relaxed);
                    if !self.continuous {
                        self.stop_flag.store(true, Ordering::Release);
                    }
                    // The receiver is gone only during shutdown.
                    let _ = self.result_tx.send(result);
                    return Ok(KeyOutcome::Found);
                }
                Err(MatchFailure::Rejected(reason)) => {
                    info!("WARNING: Key check failed for e = {}: {}", e, reason);
                }
                Err(MatchFailure::Mismatch { .. }) if e >= WIDE_EXPONENT => {
                    self.stats.record_trials(self.id, pending);
                    info!(
                        "Exponent {} needs a 5-byte encoding, fast hashes no longer apply.",
                        e
                    );
                    info!("Generating new RSA key.");
                    return Ok(KeyOutcome::WideExponent);
                }
                Err(MatchFailure::Mismatch { found, actual }) => {
                    self.stats.record_trials(self.id, pending);
                    warn!("WARNING! Error detected! CPU/RAM overheating?");
                    warn!(
                        "Found {}, but finalized to {}.",
                        found.prefix(matched_len),
                        actual
                    );
                    warn!(
                        "Suspending this thread for {} seconds.",
                        self.corruption_pause.as_secs()
                    );
                    thread::sleep(self.corruption_pause);
                    info!("Generating new RSA key.");
                    return Ok(KeyOutcome::Corrupted);
                }
                Err(MatchFailure::Key(err)) => return Err(err),
            }
        }

        self.stats.record_trials(self.id, pending);
        Ok(KeyOutcome::Exhausted)
    }

    #[inline]
    fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }
}

//! Worker pool for parallel onion name search.
//!
//! This module provides:
//! - Per-thread key generation and exponent search
//! - A shared stop flag and per-worker trial counters
//! - Progress sampling

mod cpu;
mod pool;
pub mod telemetry;

pub use cpu::{confirm_match, CpuWorker, KeyOutcome, MatchFailure, WorkerStats, CORRUPTION_PAUSE};
pub use pool::{OnionResult, PoolEvent, WorkerPool};
pub use telemetry::{Sample, Telemetry};

//! # onion_vanity
//!
//! Vanity .onion name generator.
//!
//! ## Architecture
//!
//! - `crypto`: Base32 codec, RSA key candidates, incremental digests, key validation
//! - `matcher`: Prefix, regex and word-list matching strategies
//! - `worker`: Parallel search threads, stop signalling and progress sampling
//! - `config`: Command line and runtime configuration
//! - `report`: Result output
//! - `combine`: Word combination generator for building word lists

pub mod combine;
pub mod config;
pub mod crypto;
pub mod error;
pub mod matcher;
pub mod report;
pub mod worker;

pub use config::{Cli, SearchConfig, SearchMode};
pub use crypto::{KeyCandidate, OnionAddress};
pub use error::SearchError;
pub use matcher::{Matcher, WordIndex};
pub use report::ResultReporter;
pub use worker::{OnionResult, PoolEvent, WorkerPool};

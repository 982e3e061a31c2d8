//! Matching of candidate onion names.
//!
//! Supports three strategies, selected once at startup:
//! - Prefix: fixed leading characters
//! - Regex: a regular expression over the whole name
//! - Words: any word from a word list as a prefix

pub mod index;
mod pattern;

use std::sync::Arc;

use crate::config::{SearchConfig, SearchMode};
use crate::crypto::base32::RAW_LEN;
use crate::crypto::OnionAddress;

pub use index::{IndexError, WordIndex, WordIndexBuilder};
pub use pattern::{PrefixMatcher, RegexMatcher, WordMatcher};

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to compile regex expression: {0}")]
    Regex(#[from] regex::Error),
}

/// The active search strategy.
#[derive(Debug, Clone)]
pub enum Matcher {
    Prefix(PrefixMatcher),
    Regex(RegexMatcher),
    Words(WordMatcher),
}

impl Matcher {
    /// Builds the matcher for `config`, loading the word list if needed.
    pub fn from_config(config: &SearchConfig) -> Result<Self, MatcherError> {
        Ok(match &config.mode {
            SearchMode::Prefix(prefix) => Matcher::Prefix(PrefixMatcher::new(prefix.as_str())),
            SearchMode::Regex(pattern) => Matcher::Regex(RegexMatcher::new(pattern)?),
            SearchMode::Words(path) => {
                let index = WordIndex::load(path, config.min_len, config.max_len, config.digits)?;
                Matcher::Words(WordMatcher::new(
                    Arc::new(index),
                    config.min_len,
                    config.max_len,
                    config.digits,
                ))
            }
        })
    }

    /// Evaluates a candidate, given both its raw digest bytes and its name.
    ///
    /// Returns the number of leading characters that matched; the fast and
    /// full derivations of the key must agree on at least that many.
    #[inline]
    pub fn evaluate(&self, raw: &[u8; RAW_LEN], onion: &OnionAddress) -> Option<usize> {
        match self {
            Matcher::Prefix(m) => m.evaluate(onion),
            Matcher::Regex(m) => m.evaluate(onion),
            Matcher::Words(m) => m.evaluate(raw, onion),
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Prefix(m) => write!(f, "prefix '{}'", m.prefix()),
            Matcher::Regex(m) => write!(f, "regex '{}'", m.as_str()),
            Matcher::Words(m) => write!(f, "word list ({} words)", m.index().len()),
        }
    }
}

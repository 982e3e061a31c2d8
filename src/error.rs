//! Fatal search errors.

use crate::crypto::KeyError;
use crate::matcher::MatcherError;

/// Errors that end the search. Per-candidate failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error("Failed to start thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("A worker thread panicked")]
    WorkerPanicked,

    #[error("Failed to set interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to write result: {0}")]
    Output(#[source] std::io::Error),
}

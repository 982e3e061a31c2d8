//! Result output.

use std::io::{self, Write};

use tracing::info;

use crate::worker::OnionResult;

/// Separator written before every result.
pub const SEPARATOR: &str = "----------------------------------------------------------------";

/// Writes confirmed results to the program's output stream.
///
/// A single-result search writes the first result only; results already in
/// flight when the workers stop are logged and dropped.
pub struct ResultReporter<W: Write> {
    out: W,
    continuous: bool,
    reported: u64,
}

impl<W: Write> ResultReporter<W> {
    pub fn new(out: W, continuous: bool) -> Self {
        Self {
            out,
            continuous,
            reported: 0,
        }
    }

    /// Writes `result` and flushes. Returns false if it was dropped.
    pub fn report(&mut self, result: &OnionResult) -> io::Result<bool> {
        if !self.continuous && self.reported > 0 {
            info!(
                "Ignoring extra result {}.onion from thread #{}.",
                result.onion,
                result.worker_id + 1
            );
            return Ok(false);
        }

        info!(
            "Found a key for {} ({}) - {}.onion",
            result.matched, result.matched_len, result.onion
        );
        writeln!(self.out, "{}", SEPARATOR)?;
        writeln!(self.out, "{}.onion", result.onion)?;
        writeln!(self.out, "{}", result.private_key)?;
        self.out.flush()?;

        self.reported += 1;
        Ok(true)
    }

    /// Returns the number of results written.
    pub fn reported(&self) -> u64 {
        self.reported
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

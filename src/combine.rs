//! Word combinations for building word lists.
//!
//! Concatenates words from up to three lists (first + second + third) and
//! keeps the combinations whose total length falls within the output range.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::LengthRange;
use crate::matcher::index::tokenize;

#[derive(Debug, thiserror::Error)]
pub enum CombineError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not find any valid words in {}!", path.display())]
    Empty { path: PathBuf },

    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),
}

/// One input list with its own length limits.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// Collects every base32 token of `reader` within `range`.
    pub fn from_reader<R: Read>(reader: R, range: LengthRange) -> io::Result<Self> {
        let mut words = Vec::new();
        tokenize(reader, true, |word| {
            if range.contains(word.len()) {
                // Tokens are ASCII by construction.
                words.push(String::from_utf8_lossy(word).into_owned());
            }
        })?;
        Ok(Self { words })
    }

    /// Loads the list at `path`; an empty list is an error.
    pub fn load(path: &Path, range: LengthRange) -> Result<Self, CombineError> {
        let file = File::open(path).map_err(|source| CombineError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let list = Self::from_reader(file, range).map_err(|source| CombineError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if list.words.is_empty() {
            return Err(CombineError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(list)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Writes every combination within `output`, one per line.
///
/// `progress` is called before each word of the first list with the index
/// of that word, the list length and the combinations written so far.
pub fn combine<W, F>(
    lists: &[WordList],
    output: LengthRange,
    out: &mut W,
    mut progress: F,
) -> io::Result<u64>
where
    W: Write,
    F: FnMut(usize, usize, u64),
{
    let mut written = 0u64;
    let Some(first) = lists.first() else {
        return Ok(0);
    };
    let empty = WordList { words: Vec::new() };
    let second = lists.get(1).unwrap_or(&empty);
    let third = lists.get(2).unwrap_or(&empty);

    for (i, w1) in first.words.iter().enumerate() {
        progress(i, first.len(), written);

        if output.contains(w1.len()) {
            writeln!(out, "{}", w1)?;
            written += 1;
        }

        for w2 in &second.words {
            let len12 = w1.len() + w2.len();
            if output.contains(len12) {
                writeln!(out, "{}{}", w1, w2)?;
                written += 1;
            }

            for w3 in &third.words {
                if output.contains(len12 + w3.len()) {
                    writeln!(out, "{}{}{}", w1, w2, w3)?;
                    written += 1;
                }
            }
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(text: &str, min: usize, max: usize) -> WordList {
        WordList::from_reader(text.as_bytes(), LengthRange::new(min, max)).unwrap()
    }

    fn run(lists: &[WordList], min: usize, max: usize) -> Vec<String> {
        let mut out = Vec::new();
        let n = combine(lists, LengthRange::new(min, max), &mut out, |_, _, _| {}).unwrap();
        let lines: Vec<String> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect();
        assert_eq!(n as usize, lines.len());
        lines
    }

    #[test]
    fn test_list_filters_by_length() {
        let l = list("Dusk dawn a noonday 2x", 2, 4);
        assert_eq!(l.words(), ["dusk", "dawn", "2x"]);
    }

    #[test]
    fn test_two_lists() {
        let a = list("dusk dawn", 1, 16);
        let b = list("till dawn", 1, 16);
        assert_eq!(
            run(&[a, b], 8, 8),
            ["dusktill", "duskdawn", "dawntill", "dawndawn"]
        );
    }

    #[test]
    fn test_single_words_and_triples() {
        let a = list("abcdefgh ab", 1, 16);
        let b = list("cd", 1, 16);
        let c = list("efgh", 1, 16);
        assert_eq!(run(&[a, b, c], 8, 8), ["abcdefgh", "abcdefgh"]);
    }

    #[test]
    fn test_progress_reports_every_first_word() {
        let a = list("one two three", 1, 16);
        let mut calls = Vec::new();
        combine(&[a], LengthRange::new(1, 16), &mut io::sink(), |i, n, _| {
            calls.push((i, n))
        })
        .unwrap();
        assert_eq!(calls, [(0, 3), (1, 3), (2, 3)]);
    }
}

//! Word index for word-list mode.
//!
//! Every word is decoded to its 80-bit base32 value and packed into a 16-bit
//! bucket id plus a 64-bit word code. Buckets hold sorted, deduplicated codes
//! so a lookup is one indexed access followed by a binary search.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::crypto::base32::{self, ENCODED_LEN, RAW_LEN};

/// Number of buckets (one per 16-bit id).
pub const BUCKETS: usize = 1 << 16;

/// Maximum number of words accepted from a word list.
pub const MAX_WORDS: u64 = u32::MAX as u64;

/// Marks a duplicate during deduplication; sorts after every real code.
const PENDING_REMOVAL: u64 = u64::MAX;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
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
}

/// Packs the first `len` characters of a raw 10-byte buffer.
///
/// All bits past `5 * len` are set to one rather than zero, so a short word
/// never aliases a longer one that continues with `a` characters. The first
/// two bytes form the bucket id, the remaining eight the word code (both
/// big-endian).
#[inline]
pub fn pack(raw: &[u8; RAW_LEN], len: usize) -> (u16, u64) {
    debug_assert!(len <= ENCODED_LEN);

    let mut buf = *raw;
    let bits = len * 5;
    let mut used = bits / 8;
    let partial = bits % 8;

    if partial != 0 {
        buf[used] |= 0xFF >> partial;
        used += 1;
    }
    for b in &mut buf[used..] {
        *b = 0xFF;
    }

    let bucket = u16::from_be_bytes([buf[0], buf[1]]);
    let mut word = [0u8; 8];
    word.copy_from_slice(&buf[2..]);

    (bucket, u64::from_be_bytes(word))
}

/// Splits a byte stream into base32 tokens.
///
/// Tokens are maximal runs of alphabet characters (case-insensitive; digits
/// only when `digits` is set). Runs longer than 16 characters are cut at 16
/// and the rest of the run is skipped.
pub fn tokenize<R: Read, F: FnMut(&[u8])>(reader: R, digits: bool, mut emit: F) -> io::Result<()> {
    let mut word = [0u8; ENCODED_LEN];
    let mut len = 0usize;
    let mut in_run = false;

    let mut reader = BufReader::new(reader);
    let mut chunk = [0u8; 8192];
    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &c in &chunk[..n] {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || (digits && (b'2'..=b'7').contains(&c)) {
                if len < ENCODED_LEN {
                    word[len] = c;
                    len += 1;
                }
                in_run = true;
            } else if in_run {
                emit(&word[..len]);
                len = 0;
                in_run = false;
            }
        }
    }

    if in_run {
        emit(&word[..len]);
    }
    Ok(())
}

/// Growable index used while loading a word list.
pub struct WordIndexBuilder {
    buckets: Vec<Vec<u64>>,
    min_len: usize,
    max_len: usize,
    words: u64,
}

impl WordIndexBuilder {
    /// Creates an empty builder accepting words of `min_len..=max_len` characters.
    pub fn new(min_len: usize, max_len: usize) -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKETS],
            min_len,
            max_len,
            words: 0,
        }
    }

    /// Adds a word. Returns false if it was outside the length bounds or the
    /// word limit has been reached.
    pub fn insert(&mut self, word: &[u8]) -> bool {
        let len = word.len();
        if len < self.min_len || len > self.max_len || self.words >= MAX_WORDS {
            return false;
        }

        let raw = base32::decode_prefix(word);
        let (bucket, code) = pack(&raw, len);
        self.buckets[bucket as usize].push(code);
        self.words += 1;
        true
    }

    /// Loads every token of `reader`.
    pub fn extend_from_reader<R: Read>(&mut self, reader: R, digits: bool) -> io::Result<()> {
        tokenize(reader, digits, |word| {
            self.insert(word);
        })
    }

    /// Number of words inserted so far, duplicates included.
    pub fn len(&self) -> u64 {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }

    /// Sorts and deduplicates every bucket and freezes the index.
    pub fn build(self) -> WordIndex {
        let buckets: Vec<Box<[u64]>> = self
            .buckets
            .into_iter()
            .map(|mut bucket| {
                dedup_sorted(&mut bucket);
                bucket.into_boxed_slice()
            })
            .collect();

        let words = buckets.iter().map(|b| b.len() as u64).sum();
        WordIndex {
            buckets: buckets.into_boxed_slice(),
            words,
        }
    }
}

/// Sorts `bucket` and removes duplicate codes.
///
/// Duplicates are overwritten with [`PENDING_REMOVAL`], a second sort moves
/// them to the tail, and the tail is cut off. The kept copy of each run is
/// its last element, so a genuine `u64::MAX` code survives exactly once.
fn dedup_sorted(bucket: &mut Vec<u64>) {
    bucket.sort_unstable();

    let mut duplicates = 0;
    for j in 1..bucket.len() {
        if bucket[j] == bucket[j - 1] {
            bucket[j - 1] = PENDING_REMOVAL;
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        bucket.sort_unstable();
        bucket.truncate(bucket.len() - duplicates);
    }
}

/// Read-only word index, shared by all workers.
#[derive(Debug)]
pub struct WordIndex {
    buckets: Box<[Box<[u64]>]>,
    words: u64,
}

impl WordIndex {
    /// Loads and freezes the word list at `path`.
    pub fn load(
        path: &Path,
        min_len: usize,
        max_len: usize,
        digits: bool,
    ) -> Result<Self, IndexError> {
        let file = File::open(path).map_err(|source| IndexError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Reading words from {}, please wait...", path.display());

        let mut builder = WordIndexBuilder::new(min_len, max_len);
        builder
            .extend_from_reader(file, digits)
            .map_err(|source| IndexError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        if builder.is_empty() {
            return Err(IndexError::Empty {
                path: path.to_path_buf(),
            });
        }
        info!("Loaded {} words.", builder.len());

        info!("Sorting the word hashes and removing duplicates.");
        let index = builder.build();
        info!("Final word count: {}.", index.len());

        Ok(index)
    }

    /// Returns true if `code` is present in `bucket`.
    #[inline]
    pub fn contains(&self, bucket: u16, code: u64) -> bool {
        self.buckets[bucket as usize].binary_search(&code).is_ok()
    }

    /// Returns the sorted codes of one bucket.
    pub fn bucket(&self, bucket: u16) -> &[u64] {
        &self.buckets[bucket as usize]
    }

    /// Number of distinct words.
    pub fn len(&self) -> u64 {
        self.words
    }

    pub fn is_empty(&self) -> bool {
        self.words == 0
    }
}

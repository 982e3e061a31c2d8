//! Matching strategies.

use std::sync::Arc;

use regex::Regex;

use crate::crypto::base32::{ENCODED_LEN, RAW_LEN};
use crate::crypto::OnionAddress;

use super::index::{pack, WordIndex};

/// Matches a fixed, already normalized prefix.
#[derive(Debug, Clone)]
pub struct PrefixMatcher {
    prefix: Vec<u8>,
}

impl PrefixMatcher {
    /// Creates a matcher for `prefix` (lowercase alphabet characters, 1-16 long).
    /// Anything past 16 characters is dropped.
    pub fn new(prefix: impl Into<String>) -> Self {
        let mut prefix = prefix.into().into_bytes();
        prefix.truncate(ENCODED_LEN);
        Self { prefix }
    }

    /// Returns the prefix.
    pub fn prefix(&self) -> &str {
        std::str::from_utf8(&self.prefix).unwrap_or("")
    }

    #[inline]
    pub fn evaluate(&self, onion: &OnionAddress) -> Option<usize> {
        let len = self.prefix.len();
        (onion.as_bytes()[..len] == self.prefix[..]).then_some(len)
    }

    /// Returns the expected number of trials (32^n for an n-character prefix).
    pub fn estimated_difficulty(&self) -> u64 {
        32u64.saturating_pow(self.prefix.len() as u32)
    }
}

/// Matches the full 16-character name against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compiles `pattern`. Matching is case-sensitive; names are lowercase.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    #[inline]
    pub fn evaluate(&self, onion: &OnionAddress) -> Option<usize> {
        self.regex.is_match(onion.as_str()).then_some(ENCODED_LEN)
    }
}

/// Looks up every allowed prefix length in a shared [`WordIndex`].
#[derive(Debug, Clone)]
pub struct WordMatcher {
    index: Arc<WordIndex>,
    min_len: usize,
    max_len: usize,
    digits: bool,
}

impl WordMatcher {
    pub fn new(index: Arc<WordIndex>, min_len: usize, max_len: usize, digits: bool) -> Self {
        Self {
            index,
            min_len,
            max_len,
            digits,
        }
    }

    pub fn index(&self) -> &WordIndex {
        &self.index
    }

    /// Returns the shortest length in bounds whose prefix is an indexed word.
    ///
    /// Without digits, any character below `'a'` within the first `min_len`
    /// positions rejects the name outright, and one at position `len - 1`
    /// stops the scan at that length.
    #[inline]
    pub fn evaluate(&self, raw: &[u8; RAW_LEN], onion: &OnionAddress) -> Option<usize> {
        let chars = onion.as_bytes();

        if !self.digits && chars[..self.min_len].iter().any(|&c| c < b'a') {
            return None;
        }

        for len in self.min_len..=self.max_len {
            if !self.digits && chars[len - 1] < b'a' {
                return None;
            }

            let (bucket, code) = pack(raw, len);
            if self.index.contains(bucket, code) {
                return Some(len);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::base32;
    use crate::matcher::index::WordIndexBuilder;

    fn onion(s: &[u8; 16]) -> ([u8; RAW_LEN], OnionAddress) {
        (base32::decode(s), OnionAddress::from_encoded(*s))
    }

    fn words(list: &[&str], min_len: usize, max_len: usize, digits: bool) -> WordMatcher {
        let mut builder = WordIndexBuilder::new(min_len, max_len);
        for w in list {
            builder.insert(w.as_bytes());
        }
        WordMatcher::new(Arc::new(builder.build()), min_len, max_len, digits)
    }

    #[test]
    fn test_prefix_match() {
        let m = PrefixMatcher::new("test");
        let (_, hit) = onion(b"testabcdefghijkl");
        let (_, miss) = onion(b"tesxabcdefghijkl");
        assert_eq!(m.evaluate(&hit), Some(4));
        assert_eq!(m.evaluate(&miss), None);
    }

    #[test]
    fn test_prefix_longer_than_name_is_cut() {
        let m = PrefixMatcher::new("abcdefghijklmnopqrst");
        assert_eq!(m.prefix(), "abcdefghijklmnop");
        let (_, hit) = onion(b"abcdefghijklmnop");
        assert_eq!(m.evaluate(&hit), Some(16));
    }

    #[test]
    fn test_prefix_full_length() {
        let m = PrefixMatcher::new("abcdefghijklmnop");
        let (_, hit) = onion(b"abcdefghijklmnop");
        assert_eq!(m.evaluate(&hit), Some(16));
    }

    #[test]
    fn test_prefix_difficulty() {
        assert_eq!(PrefixMatcher::new("ab").estimated_difficulty(), 1024);
    }

    #[test]
    fn test_regex_match() {
        let m = RegexMatcher::new("^dusk.*dawn$").unwrap();
        let (_, hit) = onion(b"duskabcdefghdawn");
        let (_, miss) = onion(b"duskabcdefghdawx");
        assert_eq!(m.evaluate(&hit), Some(16));
        assert_eq!(m.evaluate(&miss), None);
    }

    #[test]
    fn test_regex_is_case_sensitive() {
        let m = RegexMatcher::new("^TEST").unwrap();
        let (_, name) = onion(b"testabcdefghijkl");
        assert_eq!(m.evaluate(&name), None);
    }

    #[test]
    fn test_regex_compile_error() {
        assert!(RegexMatcher::new("(unclosed").is_err());
    }

    #[test]
    fn test_word_match_returns_shortest_length() {
        let m = words(&["dusk", "duskdawn", "dawn"], 4, 16, false);
        let (raw, name) = onion(b"duskdawnabcdefgh");
        assert_eq!(m.evaluate(&raw, &name), Some(4));

        let m = words(&["duskdawn"], 4, 16, false);
        assert_eq!(m.evaluate(&raw, &name), Some(8));
    }

    #[test]
    fn test_word_match_requires_prefix() {
        let m = words(&["dawn"], 4, 16, false);
        let (raw, name) = onion(b"duskdawnabcdefgh");
        assert_eq!(m.evaluate(&raw, &name), None);
    }

    #[test]
    fn test_word_match_respects_bounds() {
        let m = words(&["duskdawn"], 8, 8, false);
        let (raw, name) = onion(b"duskdawnabcdefgh");
        assert_eq!(m.evaluate(&raw, &name), Some(8));

        // A longer configured minimum never looks at the 8-character prefix.
        let mut builder = WordIndexBuilder::new(1, 16);
        builder.insert(b"duskdawn");
        let m = WordMatcher::new(Arc::new(builder.build()), 9, 16, false);
        assert_eq!(m.evaluate(&raw, &name), None);
    }

    #[test]
    fn test_word_match_digit_before_min_len_rejects() {
        let m = words(&["abcdefgh"], 8, 16, false);
        let (raw, name) = onion(b"abcdefg2abcdefgh");
        assert_eq!(m.evaluate(&raw, &name), None);
    }

    #[test]
    fn test_word_match_digit_at_boundaries() {
        // Digit exactly at position min_len - 1.
        let m = words(&["abcdefg2"], 8, 16, true);
        let (raw, name) = onion(b"abcdefg2abcdefgh");
        assert_eq!(m.evaluate(&raw, &name), Some(8));

        // Digit at the last allowed position: found with digits, stopped without.
        let m = words(&["abcdefghabcdefg2"], 8, 16, true);
        let (raw, name) = onion(b"abcdefghabcdefg2");
        assert_eq!(m.evaluate(&raw, &name), Some(16));
        let m = words(&["abcdefghabcdefg2"], 8, 16, false);
        assert_eq!(m.evaluate(&raw, &name), None);

        let m = words(&["abcdefghi"], 8, 16, false);
        let (raw, name) = onion(b"abcdefgh3bcdefgh");
        assert_eq!(m.evaluate(&raw, &name), None);
    }

    #[test]
    fn test_word_match_digit_after_match_is_ignored() {
        let m = words(&["abcdefgh"], 8, 16, false);
        let (raw, name) = onion(b"abcdefgh2bcdefgh");
        assert_eq!(m.evaluate(&raw, &name), Some(8));
    }
}

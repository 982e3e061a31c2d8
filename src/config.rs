//! Runtime configuration for the onion name generator.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgGroup, Parser};

use crate::crypto::base32::ENCODED_LEN;

/// Maximum number of worker threads.
pub const MAX_THREADS: usize = 100;

/// Length bounds accepted by `-l`.
const WORD_LEN_MIN: usize = 8;
const WORD_LEN_MAX: usize = ENCODED_LEN;

const EXAMPLES: &str = "\
Examples:
  onion_vanity -cvt4 -l8-12 -f wordlist.txt >> results.txt
  onion_vanity -v -r '^test|^exam'
  onion_vanity -ct5 -p test

  base32 alphabet allows letters [a-z] and digits [2-7]
  Regex pattern examples:
    xxx           must contain 'xxx'
    ^foo          must begin with 'foo'
    bar$          must end with 'bar'
    b[aoeiu]r     must have a vowel between 'b' and 'r'
    '^ab|^cd'     must begin with 'ab' or 'cd'
    [a-z]{16}     must contain letters only, no digits
    ^dusk.*dawn$  must begin with 'dusk' and end with 'dawn'
    [a-z2-7]{16}  any name - will succeed after one iteration";

/// Inclusive range of name lengths, written `min-max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Returns true if `len` lies within the range.
    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

impl FromStr for LengthRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (min, max) = s
            .split_once('-')
            .ok_or_else(|| format!("expected min-max, got '{}'", s))?;
        let min: usize = min
            .trim()
            .parse()
            .map_err(|_| format!("invalid minimum length '{}'", min))?;
        let max: usize = max
            .trim()
            .parse()
            .map_err(|_| format!("invalid maximum length '{}'", max))?;

        if min == 0 || max > ENCODED_LEN || min > max {
            return Err(format!(
                "lengths must satisfy 1 <= min <= max <= {}",
                ENCODED_LEN
            ));
        }
        Ok(Self { min, max })
    }
}

impl fmt::Display for LengthRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min, self.max)
    }
}

/// Onion Vanity Name Generator
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
#[command(group(ArgGroup::new("mode").required(true).args(["file", "prefix", "regex"])))]
pub struct Cli {
    /// Continue searching after the hash is found
    #[arg(short = 'c')]
    pub continuous: bool,

    /// Allow digits to be part of the prefix
    #[arg(short = 'n')]
    pub digits: bool,

    /// Verbose mode - print extra information to STDERR
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Number of threads to spawn (at most 100)
    #[arg(short = 't', value_name = "count", default_value_t = 1)]
    pub threads: usize,

    /// Look for prefixes that are from 'min' to 'max' characters long (8-16)
    #[arg(short = 'l', value_name = "min-max", requires = "file")]
    pub lengths: Option<LengthRange>,

    /// Name of the text file with a list of prefixes
    #[arg(short = 'f', value_name = "filename")]
    pub file: Option<PathBuf>,

    /// Single prefix to look for (1-16 characters long)
    #[arg(short = 'p', value_name = "prefix")]
    pub prefix: Option<String>,

    /// Search for a regular expression
    #[arg(short = 'r', value_name = "regex")]
    pub regex: Option<String>,
}

impl Cli {
    /// Validates the arguments and freezes them into a [`SearchConfig`].
    pub fn into_search_config(self) -> Result<SearchConfig, ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Threads);
        }
        let threads = self.threads.min(MAX_THREADS);

        let (mode, range) = match (self.file, self.prefix, self.regex) {
            (Some(path), None, None) => {
                let range = self
                    .lengths
                    .unwrap_or(LengthRange::new(WORD_LEN_MIN, WORD_LEN_MAX));
                if range.min < WORD_LEN_MIN {
                    return Err(ConfigError::Lengths(range));
                }
                (SearchMode::Words(path), range)
            }
            (None, Some(prefix), None) => {
                let prefix = normalize_prefix(&prefix, self.digits)?;
                let len = prefix.len();
                (SearchMode::Prefix(prefix), LengthRange::new(len, len))
            }
            (None, None, Some(regex)) => {
                (SearchMode::Regex(regex), LengthRange::new(1, ENCODED_LEN))
            }
            _ => return Err(ConfigError::Mode),
        };

        Ok(SearchConfig {
            mode,
            min_len: range.min,
            max_len: range.max,
            digits: self.digits,
            continuous: self.continuous,
            threads,
            verbose: self.verbose,
        })
    }
}

/// Lowercases `prefix` and checks it against the base32 alphabet.
pub fn normalize_prefix(prefix: &str, digits: bool) -> Result<String, ConfigError> {
    let prefix = prefix.to_ascii_lowercase();

    if prefix.is_empty() || prefix.len() > ENCODED_LEN {
        return Err(ConfigError::InvalidPrefix(
            "Prefix must be 1-16 characters long".into(),
        ));
    }

    let valid = prefix
        .bytes()
        .all(|c| c.is_ascii_lowercase() || (digits && (b'2'..=b'7').contains(&c)));
    if !valid {
        let allowed = if digits { "a-z, 2-7" } else { "a-z" };
        return Err(ConfigError::InvalidPrefix(format!(
            "Prefix must contain only base32 characters ({})",
            allowed
        )));
    }

    Ok(prefix)
}

/// What is being searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Any word of a word list, as a prefix
    Words(PathBuf),
    /// A fixed, normalized prefix
    Prefix(String),
    /// A regular expression over the full name
    Regex(String),
}

/// Validated search settings, fixed for the life of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub mode: SearchMode,
    pub min_len: usize,
    pub max_len: usize,
    pub digits: bool,
    pub continuous: bool,
    pub threads: usize,
    pub verbose: bool,
}

impl fmt::Display for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} threads, prefixes {}-{} characters long",
            if self.continuous { "continuous" } else { "single result" },
            if self.digits { "digits ok" } else { "no digits" },
            self.threads,
            self.min_len,
            self.max_len
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid prefix: {0}")]
    InvalidPrefix(String),

    #[error("Thread count must be at least 1")]
    Threads,

    #[error("Invalid length range {0}: must be within 8-16")]
    Lengths(LengthRange),

    #[error("Exactly one of -f, -p or -r is required")]
    Mode,
}

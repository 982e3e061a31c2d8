//! Onion name representation.

use std::fmt;

use super::base32::{self, ENCODED_LEN, RAW_LEN};

/// A 16-character onion name (without the `.onion` suffix).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnionAddress([u8; ENCODED_LEN]);

impl OnionAddress {
    /// Derives the name from a SHA-1 digest; only the first 10 bytes are used.
    #[inline]
    pub fn from_digest(digest: &[u8; 20]) -> Self {
        let mut raw = [0u8; RAW_LEN];
        raw.copy_from_slice(&digest[..RAW_LEN]);
        Self(base32::encode(&raw))
    }

    /// Creates a name from already encoded characters.
    #[inline]
    pub const fn from_encoded(chars: [u8; ENCODED_LEN]) -> Self {
        Self(chars)
    }

    /// Returns the encoded characters.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; ENCODED_LEN] {
        &self.0
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        // The alphabet is pure ASCII; this only fails for names built through
        // `from_encoded` with foreign bytes.
        std::str::from_utf8(&self.0).unwrap_or("")
    }

    /// Returns the first `len` characters.
    pub fn prefix(&self, len: usize) -> &str {
        let len = len.min(ENCODED_LEN);
        std::str::from_utf8(&self.0[..len]).unwrap_or("")
    }

    /// Returns true if both names agree on their first `len` characters.
    #[inline]
    pub fn agrees_with(&self, other: &OnionAddress, len: usize) -> bool {
        let len = len.min(ENCODED_LEN);
        self.0[..len] == other.0[..len]
    }
}

impl fmt::Debug for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnionAddress({})", self.as_str())
    }
}

impl fmt::Display for OnionAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

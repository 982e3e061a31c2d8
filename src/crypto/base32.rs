//! Base32 codec for onion names.
//!
//! Ten raw bytes map to exactly sixteen characters (80 bits / 5), so there is
//! never any padding. Symbols are emitted most-significant bits first.

/// The 32-symbol alphabet: `a..z` are values 0-25, `2..7` are 26-31.
pub const ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Number of raw bytes covered by an onion name.
pub const RAW_LEN: usize = 10;

/// Number of characters in an onion name.
pub const ENCODED_LEN: usize = 16;

/// Value substituted for characters outside the alphabet while decoding.
const INVALID_SYMBOL: u8 = 26;

/// Encodes 10 raw bytes into 16 base32 characters.
#[inline]
pub fn encode(src: &[u8; RAW_LEN]) -> [u8; ENCODED_LEN] {
    let sym = |v: u8| ALPHABET[(v & 31) as usize];

    [
        sym(src[0] >> 3),
        sym((src[0] << 2) | (src[1] >> 6)),
        sym(src[1] >> 1),
        sym((src[1] << 4) | (src[2] >> 4)),
        sym((src[2] << 1) | (src[3] >> 7)),
        sym(src[3] >> 2),
        sym((src[3] << 3) | (src[4] >> 5)),
        sym(src[4]),
        sym(src[5] >> 3),
        sym((src[5] << 2) | (src[6] >> 6)),
        sym(src[6] >> 1),
        sym((src[6] << 4) | (src[7] >> 4)),
        sym((src[7] << 1) | (src[8] >> 7)),
        sym(src[8] >> 2),
        sym((src[8] << 3) | (src[9] >> 5)),
        sym(src[9]),
    ]
}

/// Returns the 5-bit value of a base32 character.
///
/// Anything outside the alphabet decodes as 26 (the value of `'2'`). Decoding
/// never fails so that a stray byte cannot take a worker down.
#[inline]
pub fn symbol_value(c: u8) -> u8 {
    match c {
        b'a'..=b'z' => c - b'a',
        b'2'..=b'7' => c - b'2' + 26,
        _ => INVALID_SYMBOL,
    }
}

/// Returns true if `c` is one of the 32 alphabet characters.
#[inline]
pub fn is_symbol(c: u8) -> bool {
    c.is_ascii_lowercase() || (b'2'..=b'7').contains(&c)
}

/// Decodes 16 base32 characters into 10 raw bytes.
pub fn decode(src: &[u8; ENCODED_LEN]) -> [u8; RAW_LEN] {
    let mut t = [0u8; ENCODED_LEN];
    for (v, &c) in t.iter_mut().zip(src.iter()) {
        *v = symbol_value(c);
    }

    [
        (t[0] << 3) | (t[1] >> 2),
        (t[1] << 6) | (t[2] << 1) | (t[3] >> 4),
        (t[3] << 4) | (t[4] >> 1),
        (t[4] << 7) | (t[5] << 2) | (t[6] >> 3),
        (t[6] << 5) | t[7],
        (t[8] << 3) | (t[9] >> 2),
        (t[9] << 6) | (t[10] << 1) | (t[11] >> 4),
        (t[11] << 4) | (t[12] >> 1),
        (t[12] << 7) | (t[13] << 2) | (t[14] >> 3),
        (t[14] << 5) | t[15],
    ]
}

/// Decodes a word of up to 16 characters, treating missing positions as
/// invalid symbols. Only the first `5 * word.len()` bits are meaningful.
pub fn decode_prefix(word: &[u8]) -> [u8; RAW_LEN] {
    let mut padded = [0u8; ENCODED_LEN];
    let n = word.len().min(ENCODED_LEN);
    padded[..n].copy_from_slice(&word[..n]);
    decode(&padded)
}

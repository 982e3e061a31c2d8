//! RSA key candidates and the incremental onion-name pipeline.
//!
//! An onion name is the base32 encoding of the first 10 bytes of the SHA-1
//! digest of the PKCS#1 DER encoded public key. The public exponent is the
//! last field of that encoding, so the digest state over everything before it
//! is computed once per key and cloned for every exponent trial.

use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::LineEnding;
use rsa::{BigUint, RsaPrivateKey};
use sha1::{Digest, Sha1};

use super::OnionAddress;

/// RSA modulus size used for onion service keys.
pub const KEY_BITS: usize = 1024;

/// First public exponent tried; also the exponent keys are generated with.
pub const EXPONENT_START: u32 = 0xFF_FFFF + 2;

/// Last public exponent tried.
pub const EXPONENT_LIMIT: u32 = u32::MAX;

/// First exponent whose DER integer needs a fifth byte. From here on the
/// fast-path digest no longer describes the real key, so every match fails
/// the full re-derivation.
pub const WIDE_EXPONENT: u32 = 0x8000_0000;

/// Size of the exponent field at the tail of the DER encoding.
const EXPONENT_LEN: usize = 4;

/// Errors from key generation and encoding. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("RSA key generation failed: {0}")]
    Generation(#[source] rsa::Error),

    #[error("DER encoding failed: {0}")]
    Encoding(String),

    #[error("PEM encoding failed: {0}")]
    Pem(String),
}

/// Returns the candidate exponents for one key, in trial order.
pub fn exponents() -> impl Iterator<Item = u32> {
    (EXPONENT_START..=EXPONENT_LIMIT).step_by(2)
}

/// A freshly generated key together with its precomputed digest prefix.
///
/// Owned by a single worker and discarded once its exponent space is
/// exhausted or a match has been confirmed.
pub struct KeyCandidate {
    key: RsaPrivateKey,
    prefix: Sha1,
}

impl KeyCandidate {
    /// Generates a new 1024-bit key with public exponent [`EXPONENT_START`].
    pub fn generate() -> Result<Self, KeyError> {
        let exp = BigUint::from(EXPONENT_START);
        let key = RsaPrivateKey::new_with_exp(&mut rand::thread_rng(), KEY_BITS, &exp)
            .map_err(KeyError::Generation)?;
        Self::from_key(key)
    }

    /// Wraps an existing key whose public exponent is [`EXPONENT_START`].
    pub fn from_key(key: RsaPrivateKey) -> Result<Self, KeyError> {
        let der = public_der(&key)?;
        let split = der
            .len()
            .checked_sub(EXPONENT_LEN)
            .ok_or_else(|| KeyError::Encoding("public key encoding too short".into()))?;

        if der[split..] != EXPONENT_START.to_be_bytes() {
            return Err(KeyError::Encoding(
                "public exponent is not the trailing field of the encoding".into(),
            ));
        }

        let mut prefix = Sha1::new();
        prefix.update(&der[..split]);

        Ok(Self { key, prefix })
    }

    /// Computes the digest the key would have with public exponent `e`.
    ///
    /// This is the hot path: one clone of the prefix state, four bytes of
    /// input and a finalization.
    #[inline]
    pub fn trial(&self, e: u32) -> [u8; 20] {
        let mut hasher = self.prefix.clone();
        hasher.update(e.to_be_bytes());
        hasher.finalize().into()
    }

    /// Returns the generated key, still carrying the initial exponent.
    pub fn key(&self) -> &RsaPrivateKey {
        &self.key
    }

    #[cfg(test)]
    pub(crate) fn corrupt_prefix(&mut self) {
        self.prefix.update([0u8]);
    }
}

/// Returns the PKCS#1 DER encoding of the public half of `key`.
fn public_der(key: &RsaPrivateKey) -> Result<Vec<u8>, KeyError> {
    let doc = key
        .to_public_key()
        .to_pkcs1_der()
        .map_err(|e| KeyError::Encoding(e.to_string()))?;
    Ok(doc.as_bytes().to_vec())
}

/// Derives the onion name of `key` from scratch: full encoding, full digest.
pub fn derive_onion(key: &RsaPrivateKey) -> Result<OnionAddress, KeyError> {
    let der = public_der(key)?;
    let digest: [u8; 20] = Sha1::digest(&der).into();
    Ok(OnionAddress::from_digest(&digest))
}

/// Returns the PKCS#1 PEM encoding of the private key.
pub fn private_key_pem(key: &RsaPrivateKey) -> Result<String, KeyError> {
    let pem = key
        .to_pkcs1_pem(LineEnding::LF)
        .map_err(|e| KeyError::Pem(e.to_string()))?;
    Ok(String::from(pem.as_str()))
}

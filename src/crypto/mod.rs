//! Cryptographic operations for onion name generation.
//!
//! This module provides:
//! - The base32 codec used by onion names
//! - RSA key candidates and incremental SHA-1 digests per public exponent
//! - Post-match key validation

pub mod base32;
pub mod keypair;
mod onion;
pub mod validate;

pub use keypair::{derive_onion, private_key_pem, KeyCandidate, KeyError};
pub use onion::OnionAddress;
pub use validate::{assign_exponent, Rejection};

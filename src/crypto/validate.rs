//! Post-match key validation (PKCS#1 v2.1).
//!
//! Swapping the public exponent of a generated key invalidates every private
//! parameter. They are recomputed here from the primes, and the resulting key
//! is checked again before it can be reported.

use num_bigint_dig::ModInverse;
use num_integer::Integer;
use num_traits::One;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey};

/// Why a candidate exponent was refused. Rejections are never fatal; the
/// search simply moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("e is not coprime to lambda(n)")]
    NotCoprime,

    #[error("e is not less than n - 1")]
    ExponentTooLarge,

    #[error("key has {0} primes, expected 2")]
    PrimeCount(usize),

    #[error("{0} has no modular inverse")]
    NoInverse(&'static str),

    #[error("key consistency check failed: {0}")]
    Inconsistent(String),
}

/// Private parameters derived for a new public exponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrtParams {
    pub d: BigUint,
    pub dmp1: BigUint,
    pub dmq1: BigUint,
    pub iqmp: BigUint,
}

/// Derives `d`, `d mod (p-1)`, `d mod (q-1)` and `q^-1 mod p` for exponent `e`.
pub fn derive_params(
    p: &BigUint,
    q: &BigUint,
    n: &BigUint,
    e: &BigUint,
) -> Result<CrtParams, Rejection> {
    let one = BigUint::one();
    let p1 = p - &one;
    let q1 = q - &one;
    let gcd = p1.gcd(&q1);
    // lcm(p-1, q-1) without forming (p-1)(q-1)
    let lambda = (&p1 / &gcd) * &q1;

    if !lambda.gcd(e).is_one() {
        return Err(Rejection::NotCoprime);
    }
    if *e >= n - &one {
        return Err(Rejection::ExponentTooLarge);
    }

    let d = e
        .clone()
        .mod_inverse(&lambda)
        .and_then(|d| d.to_biguint())
        .ok_or(Rejection::NoInverse("e"))?;
    let iqmp = q
        .clone()
        .mod_inverse(p)
        .and_then(|v| v.to_biguint())
        .ok_or(Rejection::NoInverse("q"))?;

    Ok(CrtParams {
        dmp1: &d % &p1,
        dmq1: &d % &q1,
        d,
        iqmp,
    })
}

/// Rebuilds `key` around public exponent `e` and certifies the result.
pub fn assign_exponent(key: &RsaPrivateKey, e: &BigUint) -> Result<RsaPrivateKey, Rejection> {
    let primes = key.primes();
    if primes.len() != 2 {
        return Err(Rejection::PrimeCount(primes.len()));
    }
    let (p, q) = (&primes[0], &primes[1]);
    let n = key.n();

    let params = derive_params(p, q, n, e)?;

    if &(p * q) != n {
        return Err(Rejection::Inconsistent("n != p * q".into()));
    }

    let rebuilt = RsaPrivateKey::from_components(
        n.clone(),
        e.clone(),
        params.d.clone(),
        vec![p.clone(), q.clone()],
    )
    .map_err(|err| Rejection::Inconsistent(err.to_string()))?;

    rebuilt
        .validate()
        .map_err(|err| Rejection::Inconsistent(err.to_string()))?;

    let qinv = rebuilt.qinv().and_then(|v| v.to_biguint());
    if rebuilt.dp() != Some(&params.dmp1)
        || rebuilt.dq() != Some(&params.dmq1)
        || qinv.as_ref() != Some(&params.iqmp)
    {
        return Err(Rejection::Inconsistent("CRT parameters disagree".into()));
    }

    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keypair::{derive_onion, KeyCandidate, EXPONENT_START};

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn test_textbook_parameters() {
        // p = 61, q = 53, lambda = lcm(60, 52) = 780
        let params = derive_params(&big(61), &big(53), &big(3233), &big(17)).unwrap();
        assert_eq!(params.d, big(413));
        assert_eq!(params.dmp1, big(413 % 60));
        assert_eq!(params.dmq1, big(413 % 52));
        assert_eq!((params.iqmp * big(53)) % big(61), big(1));
    }

    #[test]
    fn test_rejects_exponent_sharing_factor_with_lambda() {
        let err = derive_params(&big(61), &big(53), &big(3233), &big(3)).unwrap_err();
        assert_eq!(err, Rejection::NotCoprime);
        let err = derive_params(&big(61), &big(53), &big(3233), &big(65)).unwrap_err();
        assert_eq!(err, Rejection::NotCoprime);
    }

    #[test]
    fn test_rejects_exponent_not_below_n_minus_one() {
        // 3233 = 61 * 53 is coprime to 780, so only the size check can fail.
        let err = derive_params(&big(61), &big(53), &big(3233), &big(3233)).unwrap_err();
        assert_eq!(err, Rejection::ExponentTooLarge);
    }

    #[test]
    fn test_assign_exponent_on_generated_key() {
        let candidate = KeyCandidate::generate().unwrap();
        let key = candidate.key();

        // Any odd e either fails the coprimality check or yields a valid key.
        let mut e = EXPONENT_START + 2;
        let rebuilt = loop {
            match assign_exponent(key, &big(e as u64)) {
                Ok(k) => break k,
                Err(Rejection::NotCoprime) => e += 2,
                Err(other) => panic!("unexpected rejection: {other}"),
            }
        };

        assert_eq!(rebuilt.e(), &big(e as u64));
        assert_eq!(rebuilt.n(), key.n());
        assert!(rebuilt.validate().is_ok());

        let fast = crate::crypto::OnionAddress::from_digest(&candidate.trial(e));
        assert_eq!(derive_onion(&rebuilt).unwrap(), fast);
    }

    #[test]
    fn test_assign_exponent_rejects_even_and_oversized() {
        let candidate = KeyCandidate::generate().unwrap();
        let key = candidate.key();

        assert_eq!(
            assign_exponent(key, &big(65_538)).unwrap_err(),
            Rejection::NotCoprime
        );
        assert_eq!(
            assign_exponent(key, key.n()).unwrap_err(),
            Rejection::ExponentTooLarge
        );
    }
}

//! Fast passphrase digest and constant-time comparison

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Hex SHA-256 of the raw passphrase.
///
/// Only a cheap rejection before the expensive unseal; a matching digest
/// never substitutes for the authenticated decrypt.
pub fn hash_passphrase(passphrase: &str) -> String {
    hex::encode(Sha256::digest(passphrase.as_bytes()))
}

/// Compare two byte strings without a data-dependent early exit.
///
/// Inputs of any length are reduced to fixed-size digests first, so unequal
/// lengths take the same path as unequal contents and simply yield `false`.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let same_len = (a.len() as u64).ct_eq(&(b.len() as u64));
    let left = Sha256::digest(a);
    let right = Sha256::digest(b);

    (same_len & left.as_slice().ct_eq(right.as_slice())).into()
}

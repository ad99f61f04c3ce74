//! Cryptographic primitives protecting the mnemonic at rest
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption
//! - PBKDF2-HMAC-SHA512 key derivation from passphrases
//! - Passphrase digests and constant-time comparison
//! - Secure memory handling with zeroize

mod encryption;
mod key_derivation;
mod passphrase;
mod secure_memory;

pub use encryption::{
    decrypt, encrypt, EncryptedData, EncryptedPayload, VaultCipher, ALGORITHM, KDF_NAME,
};
pub use key_derivation::{
    derive_key, generate_salt, KeyDerivationParams, DEFAULT_ITERATIONS, MIN_ITERATIONS,
};
pub use passphrase::{constant_time_eq, hash_passphrase};
pub use secure_memory::{SecretKey, SecretString, VaultKey};

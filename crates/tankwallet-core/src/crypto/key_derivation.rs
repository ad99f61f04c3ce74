//! Password-based key derivation using PBKDF2-HMAC-SHA512

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha512;
use zeroize::Zeroize;

use super::VaultKey;

/// Iteration count used for newly sealed payloads
pub const DEFAULT_ITERATIONS: u32 = 210_000;

/// Lowest iteration count accepted from configuration
pub const MIN_ITERATIONS: u32 = 200_000;

/// Upper bound on the iteration count read back from a payload
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived key length in bytes (256 bits)
pub const KEY_LEN: usize = 32;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// HMAC-SHA512 iteration count
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit vault key from a passphrase
///
/// # Arguments
/// * `passphrase` - The user's passphrase
/// * `salt` - Random salt stored alongside the ciphertext
/// * `params` - Iteration count to use
pub fn derive_key(passphrase: &str, salt: &[u8], params: &KeyDerivationParams) -> VaultKey {
    let mut key_bytes = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha512>(passphrase.as_bytes(), salt, params.iterations, &mut key_bytes);

    let key = VaultKey::new(key_bytes);
    key_bytes.zeroize();
    key
}

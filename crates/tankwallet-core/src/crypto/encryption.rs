//! AES-256-GCM envelope for the vault mnemonic
//!
//! Payload fields are base64 text so the envelope can live inside the JSON
//! vault record:
//! - salt: 16 bytes, fed to PBKDF2
//! - iv: 12 bytes (96 bits) - standard for GCM
//! - authTag: 16 bytes (128 bits)
//! - ciphertext: variable length

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroize;

use super::key_derivation::{
    derive_key, generate_salt, KeyDerivationParams, DEFAULT_ITERATIONS, MAX_ITERATIONS,
};
use super::{SecretString, VaultKey};
use crate::error::{Result, WalletError};

/// Cipher tag written into every payload
pub const ALGORITHM: &str = "aes-256-gcm";

/// KDF tag written into every payload
pub const KDF_NAME: &str = "pbkdf2-sha512";

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Raw encrypted data with IV and auth tag
#[derive(Debug, Clone)]
pub struct EncryptedData {
    /// Initialization vector (12 bytes for GCM)
    pub iv: [u8; IV_LEN],
    /// Authentication tag (16 bytes)
    pub auth_tag: [u8; TAG_LEN],
    /// Encrypted ciphertext
    pub ciphertext: Vec<u8>,
}

/// Encrypt plaintext using AES-256-GCM under a fresh random IV
pub fn encrypt(plaintext: &[u8], key: &VaultKey) -> Result<EncryptedData> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| WalletError::EncryptionError(e.to_string()))?;

    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    // aes-gcm appends the auth tag to the ciphertext
    let ciphertext_with_tag = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| WalletError::EncryptionError(e.to_string()))?;

    if ciphertext_with_tag.len() < TAG_LEN {
        return Err(WalletError::EncryptionError(
            "Ciphertext too short".to_string(),
        ));
    }

    let tag_start = ciphertext_with_tag.len() - TAG_LEN;
    let ciphertext = ciphertext_with_tag[..tag_start].to_vec();
    let mut auth_tag = [0u8; TAG_LEN];
    auth_tag.copy_from_slice(&ciphertext_with_tag[tag_start..]);

    Ok(EncryptedData {
        iv,
        auth_tag,
        ciphertext,
    })
}

/// Decrypt and authenticate ciphertext using AES-256-GCM
///
/// A tag mismatch (wrong key or tampered data) is reported as
/// `AuthenticationFailure`; no plaintext is returned in that case.
pub fn decrypt(encrypted: &EncryptedData, key: &VaultKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| WalletError::EncryptionError(e.to_string()))?;

    let nonce = Nonce::from_slice(&encrypted.iv);

    let mut ciphertext_with_tag = encrypted.ciphertext.clone();
    ciphertext_with_tag.extend_from_slice(&encrypted.auth_tag);

    cipher
        .decrypt(nonce, ciphertext_with_tag.as_slice())
        .map_err(|_| WalletError::AuthenticationFailure)
}

fn default_algo() -> String {
    ALGORITHM.to_string()
}

fn default_kdf_name() -> String {
    KDF_NAME.to_string()
}

fn default_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

/// Sealed mnemonic as stored in the vault record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedPayload {
    #[serde(default = "default_algo")]
    pub algo: String,
    #[serde(default = "default_kdf_name", alias = "kdf")]
    pub kdf_name: String,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default)]
    pub salt: String,
    #[serde(default)]
    pub iv: String,
    #[serde(default)]
    pub auth_tag: String,
    /// Absent only when the key is missing; an empty mnemonic seals to `""`
    #[serde(default, alias = "data")]
    pub ciphertext: Option<String>,
}

fn missing(name: &str) -> WalletError {
    WalletError::MalformedPayload(format!("missing {}", name))
}

fn decode_bytes(name: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| WalletError::MalformedPayload(format!("invalid {} encoding: {}", name, e)))
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>> {
    if value.is_empty() {
        return Err(missing(name));
    }
    decode_bytes(name, value)
}

fn fixed<const N: usize>(name: &str, bytes: Vec<u8>) -> Result<[u8; N]> {
    bytes.as_slice().try_into().map_err(|_| {
        WalletError::MalformedPayload(format!(
            "invalid {} length: expected {}, got {}",
            name,
            N,
            bytes.len()
        ))
    })
}

impl EncryptedPayload {
    fn from_parts(salt: &[u8], params: &KeyDerivationParams, data: &EncryptedData) -> Self {
        Self {
            algo: ALGORITHM.to_string(),
            kdf_name: KDF_NAME.to_string(),
            iterations: params.iterations,
            salt: STANDARD.encode(salt),
            iv: STANDARD.encode(data.iv),
            auth_tag: STANDARD.encode(data.auth_tag),
            ciphertext: Some(STANDARD.encode(&data.ciphertext)),
        }
    }

    /// Decode and check every field before any key derivation happens
    fn decode(&self) -> Result<(Vec<u8>, KeyDerivationParams, EncryptedData)> {
        if self.algo != ALGORITHM {
            return Err(WalletError::MalformedPayload(format!(
                "unsupported algorithm: {}",
                self.algo
            )));
        }
        if self.kdf_name != KDF_NAME {
            return Err(WalletError::MalformedPayload(format!(
                "unsupported kdf: {}",
                self.kdf_name
            )));
        }
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(WalletError::MalformedPayload(format!(
                "iteration count out of range: {}",
                self.iterations
            )));
        }

        let salt = decode_field("salt", &self.salt)?;
        let iv = fixed::<IV_LEN>("iv", decode_field("iv", &self.iv)?)?;
        let auth_tag = fixed::<TAG_LEN>("authTag", decode_field("authTag", &self.auth_tag)?)?;
        let ciphertext = match &self.ciphertext {
            Some(value) => decode_bytes("ciphertext", value)?,
            None => return Err(missing("ciphertext")),
        };

        Ok((
            salt,
            KeyDerivationParams {
                iterations: self.iterations,
            },
            EncryptedData {
                iv,
                auth_tag,
                ciphertext,
            },
        ))
    }
}

/// Seals and unseals the mnemonic under a passphrase-derived key
#[derive(Debug, Clone)]
pub struct VaultCipher {
    params: KeyDerivationParams,
}

impl Default for VaultCipher {
    fn default() -> Self {
        Self {
            params: KeyDerivationParams::default(),
        }
    }
}

impl VaultCipher {
    /// Create a cipher that seals with the given iteration count
    pub fn new(iterations: u32) -> Result<Self> {
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return Err(WalletError::Config(format!(
                "KDF iterations must be between 1 and {}",
                MAX_ITERATIONS
            )));
        }
        Ok(Self {
            params: KeyDerivationParams { iterations },
        })
    }

    pub fn iterations(&self) -> u32 {
        self.params.iterations
    }

    /// Encrypt the mnemonic under a key derived from `passphrase`
    ///
    /// Fresh salt and IV are drawn for every call; the derived key is
    /// dropped (and zeroed) before returning.
    pub fn seal(&self, mnemonic: &str, passphrase: &str) -> Result<EncryptedPayload> {
        let salt = generate_salt();
        let key = derive_key(passphrase, &salt, &self.params);
        let data = encrypt(mnemonic.as_bytes(), &key)?;
        drop(key);

        debug!("Sealed mnemonic with {} iterations", self.params.iterations);
        Ok(EncryptedPayload::from_parts(&salt, &self.params, &data))
    }

    /// Decrypt the mnemonic using the payload's own salt and iteration count
    pub fn unseal(&self, payload: &EncryptedPayload, passphrase: &str) -> Result<SecretString> {
        let (salt, params, data) = payload.decode()?;

        let key = derive_key(passphrase, &salt, &params);
        let plaintext = decrypt(&data, &key);
        drop(key);

        match String::from_utf8(plaintext?) {
            Ok(mnemonic) => Ok(SecretString::new(mnemonic)),
            Err(e) => {
                e.into_bytes().zeroize();
                Err(WalletError::MalformedPayload(
                    "plaintext is not valid UTF-8".to_string(),
                ))
            }
        }
    }
}

//! Mnemonic to address/key derivation
//!
//! The wallet service only sees the [`KeyDeriver`] trait. [`Bip39Deriver`]
//! is the implementation shipped with the crate: BIP39 English mnemonics,
//! an Ed25519 key taken from the seed, and a bech32m `trac` address over
//! the public key.

use async_trait::async_trait;
use bech32::{ToBase32, Variant};
use bip39::{Language, Mnemonic};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroize;

use crate::crypto::{SecretKey, SecretString};
use crate::error::{Result, WalletError};

/// Human-readable prefix of every wallet address
pub const ADDRESS_HRP: &str = "trac";

/// Derivation path reported for keys produced by [`Bip39Deriver`]
pub const DERIVATION_PATH: &str = "m/44'/0'/0'/0'";

/// Output of a derivation: public address plus the secrets behind it
#[derive(Debug)]
pub struct DerivedWallet {
    pub address: String,
    pub mnemonic: SecretString,
    pub secret_key: SecretKey,
    pub derivation_path: String,
}

/// Capability that turns a mnemonic into an address and signing key
#[async_trait]
pub trait KeyDeriver: Send + Sync {
    /// Derive from `mnemonic`, or generate a fresh wallet when `None`
    async fn derive_or_generate(&self, mnemonic: Option<&str>) -> Result<DerivedWallet>;

    /// Canonical form of `candidate`, or `None` when it is not a valid mnemonic
    fn sanitize_mnemonic(&self, candidate: &str) -> Option<String>;
}

/// BIP39 / Ed25519 / bech32m key deriver
#[derive(Debug, Clone, Copy, Default)]
pub struct Bip39Deriver;

impl Bip39Deriver {
    pub fn new() -> Self {
        Self
    }

    fn generate() -> Result<Mnemonic> {
        let mut entropy = [0u8; 32];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| WalletError::WalletGenerationFailed(e.to_string()));
        entropy.zeroize();
        mnemonic
    }

    fn derive(mnemonic: &Mnemonic) -> Result<DerivedWallet> {
        let mut seed = mnemonic.to_seed_normalized("");
        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&seed[..32]);
        seed.zeroize();

        let signing_key = SigningKey::from_bytes(&key_bytes);
        let public_key = signing_key.verifying_key().to_bytes();
        let secret_key = SecretKey::new(key_bytes);
        key_bytes.zeroize();

        let address = bech32::encode(ADDRESS_HRP, public_key.to_base32(), Variant::Bech32m)
            .map_err(|e| WalletError::WalletGenerationFailed(e.to_string()))?;

        Ok(DerivedWallet {
            address,
            mnemonic: SecretString::new(mnemonic.to_string()),
            secret_key,
            derivation_path: DERIVATION_PATH.to_string(),
        })
    }
}

#[async_trait]
impl KeyDeriver for Bip39Deriver {
    async fn derive_or_generate(&self, mnemonic: Option<&str>) -> Result<DerivedWallet> {
        let mnemonic = match mnemonic {
            Some(phrase) => {
                let mut normalized = self
                    .sanitize_mnemonic(phrase)
                    .ok_or(WalletError::InvalidMnemonic)?;
                let parsed = Mnemonic::parse_in_normalized(Language::English, &normalized)
                    .map_err(|_| WalletError::InvalidMnemonic);
                normalized.zeroize();
                parsed?
            }
            None => Self::generate()?,
        };

        Self::derive(&mnemonic)
    }

    fn sanitize_mnemonic(&self, candidate: &str) -> Option<String> {
        let normalized = candidate
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ");
        if normalized.is_empty() {
            return None;
        }

        Mnemonic::parse_in_normalized(Language::English, &normalized)
            .ok()
            .map(|mnemonic| mnemonic.to_string())
    }
}

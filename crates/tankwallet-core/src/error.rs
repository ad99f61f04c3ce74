//! Error types for tankwallet-core

use thiserror::Error;

use crate::ledger::Asset;

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Wallet error types
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid passphrase")]
    AuthenticationFailure,

    #[error("Vault integrity check failed - derived address does not match the stored address")]
    IntegrityCheckFailed,

    #[error("Vault already exists")]
    VaultAlreadyExists,

    #[error("No vault found - create or import a wallet first")]
    NoVaultFound,

    #[error("Wallet is locked - unlock with passphrase first")]
    WalletLocked,

    #[error("Insufficient {0} balance")]
    InsufficientBalance(Asset),

    #[error("Unsupported swap pair: {from} -> {to}")]
    UnsupportedPair { from: Asset, to: Asset },

    #[error("Swap pair must be different")]
    SamePairRejected,

    #[error("Wallet generation failed: {0}")]
    WalletGenerationFailed(String),

    #[error("Invalid mnemonic phrase")]
    InvalidMnemonic,

    #[error("Malformed encrypted payload: {0}")]
    MalformedPayload(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WalletError {
    /// Whether the error was caused by caller input or wallet state rather
    /// than an internal or I/O fault. Transports map these to 4xx responses.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            WalletError::Validation(_)
                | WalletError::AuthenticationFailure
                | WalletError::VaultAlreadyExists
                | WalletError::NoVaultFound
                | WalletError::WalletLocked
                | WalletError::InsufficientBalance(_)
                | WalletError::UnsupportedPair { .. }
                | WalletError::SamePairRejected
                | WalletError::InvalidMnemonic
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_classification() {
        assert!(WalletError::WalletLocked.is_client_error());
        assert!(WalletError::InsufficientBalance(Asset::Tnk).is_client_error());
        assert!(!WalletError::IntegrityCheckFailed.is_client_error());
        assert!(!WalletError::Io(std::io::Error::other("disk full")).is_client_error());
    }

    #[test]
    fn test_messages_name_the_asset() {
        let err = WalletError::InsufficientBalance(Asset::Trk);
        assert_eq!(err.to_string(), "Insufficient TRK balance");

        let err = WalletError::UnsupportedPair {
            from: Asset::Tnk,
            to: Asset::Trk,
        };
        assert_eq!(err.to_string(), "Unsupported swap pair: TNK -> TRK");
    }
}

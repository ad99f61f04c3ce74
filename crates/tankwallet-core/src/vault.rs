//! The durable vault record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::ActivityLog;
use crate::crypto::EncryptedPayload;
use crate::ledger::Balances;

/// Current vault file format version
pub const VAULT_VERSION: u32 = 1;

/// Everything persisted for one installation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vault {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Fixed at creation; checked against the derived address on unlock
    pub address: String,
    pub encrypted_mnemonic: EncryptedPayload,
    /// Hex SHA-256 of the passphrase, for the fast pre-check only
    pub passphrase_hash: String,
    pub balances: Balances,
    #[serde(default)]
    pub activity: ActivityLog,
}

impl Vault {
    pub fn new(
        address: String,
        encrypted_mnemonic: EncryptedPayload,
        passphrase_hash: String,
        balances: Balances,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            version: VAULT_VERSION,
            created_at: now,
            updated_at: now,
            address,
            encrypted_mnemonic,
            passphrase_hash,
            balances,
            activity: ActivityLog::default(),
        }
    }
}

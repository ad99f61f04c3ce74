//! Unlocked session state
//!
//! A [`Session`] exists only while the wallet is unlocked and holds the
//! decrypted mnemonic and signing key. Dropping or wiping it zeroes both
//! buffers through `zeroize`.
//!
//! Zeroing is best-effort. Copies made by the allocator when a buffer
//! grew, or held inside the key-derivation library while it ran, are not
//! reachable from here and may survive in freed memory.

use chrono::{DateTime, Utc};
use zeroize::Zeroize;

use crate::crypto::{SecretKey, SecretString};
use crate::derivation::DerivedWallet;

/// Live key material for the unlocked wallet
pub struct Session {
    address: String,
    mnemonic: SecretString,
    secret_key: SecretKey,
    derivation_path: String,
    unlocked_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
}

impl Session {
    pub fn new(wallet: DerivedWallet, now: DateTime<Utc>) -> Self {
        let DerivedWallet {
            address,
            mnemonic,
            secret_key,
            derivation_path,
        } = wallet;

        Self {
            address,
            mnemonic,
            secret_key,
            derivation_path,
            unlocked_at: now,
            last_activity_at: now,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn unlocked_at(&self) -> DateTime<Utc> {
        self.unlocked_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    /// Record activity at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Zero every secret buffer in place
    pub fn wipe(&mut self) {
        self.mnemonic.zeroize();
        self.secret_key.zeroize();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("derivation_path", &self.derivation_path)
            .field("unlocked_at", &self.unlocked_at)
            .field("last_activity_at", &self.last_activity_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(now: DateTime<Utc>) -> Session {
        Session::new(
            DerivedWallet {
                address: "trac1qqqqqqqqqqqqqqqqqqqqqqqq".to_string(),
                mnemonic: SecretString::from("abandon abandon about"),
                secret_key: SecretKey::new([7u8; 32]),
                derivation_path: "m/44'/0'/0'/0'".to_string(),
            },
            now,
        )
    }

    #[test]
    fn test_touch_updates_last_activity() {
        let now = Utc::now();
        let mut session = session(now);
        session.touch(now + Duration::seconds(30));

        assert_eq!(session.unlocked_at(), now);
        assert_eq!(session.last_activity_at(), now + Duration::seconds(30));
    }

    #[test]
    fn test_wipe_zeroes_secrets() {
        let mut session = session(Utc::now());
        session.wipe();

        assert!(session.secret_key().is_zeroed());
        assert!(session.mnemonic.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let output = format!("{:?}", session(Utc::now()));
        assert!(!output.contains("abandon"));
        assert!(output.contains("trac1"));
    }
}

//! # tankwallet-core
//!
//! Core vault, session and ledger logic for TankWallet including:
//! - AES-256-GCM sealing of the mnemonic under a PBKDF2-derived key
//! - Crash-safe JSON vault storage
//! - Locked/unlocked session state with inactivity auto-lock
//! - Local TNK/TRK balances mutated by validated send and swap operations

pub mod activity;
pub mod auto_lock;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod derivation;
pub mod error;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod vault;
mod wallet;

pub use activity::{ActivityEntry, ActivityKind, ActivityLog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::WalletConfig;
pub use crypto::{EncryptedPayload, VaultCipher};
pub use derivation::{Bip39Deriver, DerivedWallet, KeyDeriver};
pub use error::{Result, WalletError};
pub use ledger::{Asset, Balances, SwapQuote, SwapRates};
pub use storage::{FileVaultStore, MemoryVaultStore, VaultStore};
pub use vault::Vault;
pub use wallet::{
    spawn_auto_lock_watcher, LockReason, SendReceipt, SendRequest, SharedWalletService,
    StateSnapshot, SwapReceipt, SwapRequest, WalletService, WalletState, MIN_PASSPHRASE_LEN,
};

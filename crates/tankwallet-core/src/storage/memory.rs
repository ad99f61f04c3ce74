//! In-memory storage backend
//!
//! Keeps the vault in process memory only. Useful for embedding and for
//! exercising failure paths: a read-only store rejects every save.

use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::VaultStore;
use crate::error::Result;
use crate::vault::Vault;

/// Shared in-memory vault store; clones see the same vault
#[derive(Debug, Clone, Default)]
pub struct MemoryVaultStore {
    vault: Arc<Mutex<Option<Vault>>>,
    read_only: Arc<AtomicBool>,
    saves: Arc<AtomicUsize>,
}

impl MemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing vault
    pub fn with_vault(vault: Vault) -> Self {
        let store = Self::default();
        *store.slot() = Some(vault);
        store
    }

    /// Reject saves with `PermissionDenied` while set
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Number of successful saves so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of the stored vault
    pub fn snapshot(&self) -> Option<Vault> {
        self.slot().clone()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vault>> {
        self.vault.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl VaultStore for MemoryVaultStore {
    fn exists(&self) -> bool {
        self.slot().is_some()
    }

    fn load(&self) -> Result<Option<Vault>> {
        Ok(self.slot().clone())
    }

    fn save(&self, vault: &Vault) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(Error::new(ErrorKind::PermissionDenied, "vault store is read-only").into());
        }
        *self.slot() = Some(vault.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "In-Memory"
    }
}

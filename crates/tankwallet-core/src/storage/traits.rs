//! Storage trait definitions

use crate::error::Result;
use crate::vault::Vault;

/// Durable home of the single vault record
///
/// Calls are blocking and complete (or fail) before returning; the wallet
/// service never retries a failed save.
pub trait VaultStore: Send + Sync {
    /// Check whether a vault has been written
    fn exists(&self) -> bool;

    /// Read the vault, `None` when nothing has been written yet
    fn load(&self) -> Result<Option<Vault>>;

    /// Replace the stored vault wholesale
    fn save(&self, vault: &Vault) -> Result<()>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}

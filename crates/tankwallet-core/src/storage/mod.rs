//! Storage backends for vault persistence
//!
//! This module provides two storage backends:
//! 1. JSON file with atomic replace (default)
//! 2. In-memory (embedding and tests)

mod memory;
mod traits;
mod vault_file;

pub use memory::MemoryVaultStore;
pub use traits::VaultStore;
pub use vault_file::{FileVaultStore, VAULT_FILE_NAME};

//! JSON file storage backend
//!
//! The vault lives in `<data_dir>/vault.json`. Writes go to a temporary
//! file in the same directory which is flushed and then renamed over the
//! canonical path, so a reader sees either the old or the new record.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::VaultStore;
use crate::error::Result;
use crate::vault::Vault;

/// Vault file name inside the data directory
pub const VAULT_FILE_NAME: &str = "vault.json";

const TEMP_FILE_NAME: &str = ".vault.tmp";

/// File-backed vault store
#[derive(Debug, Clone)]
pub struct FileVaultStore {
    path: PathBuf,
}

impl FileVaultStore {
    /// Store `vault.json` inside `data_dir`
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(VAULT_FILE_NAME))
    }

    /// Store the vault at an explicit path
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) => dir.join(TEMP_FILE_NAME),
            None => PathBuf::from(TEMP_FILE_NAME),
        }
    }

    fn write_temp(&self, temp_path: &Path, contents: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(temp_path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}

impl VaultStore for FileVaultStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<Option<Vault>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No vault file at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let vault: Vault = serde_json::from_str(&contents)?;
        debug!("Loaded vault from {:?}", self.path);
        Ok(Some(vault))
    }

    fn save(&self, vault: &Vault) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = serde_json::to_string_pretty(vault)?;
        let temp_path = self.temp_path();

        if let Err(e) = self.write_temp(&temp_path, contents.as_bytes()) {
            if fs::remove_file(&temp_path).is_err() {
                warn!("Could not remove partial vault file {:?}", temp_path);
            }
            return Err(e.into());
        }
        fs::rename(&temp_path, &self.path)?;

        debug!("Saved vault to {:?}", self.path);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Vault File"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::VaultCipher;
    use crate::ledger::{Asset, Balances};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn sample_vault() -> Vault {
        let payload = VaultCipher::new(1_000)
            .unwrap()
            .seal("legal winner thank year wave sausage worth useful legal winner thank yellow", "abcdefgh")
            .unwrap();
        Vault::new(
            "trac1qqqqqqqqqqqqqqqqqqqqqqqq".to_string(),
            payload,
            "00".repeat(32),
            Balances::from_iter([(Asset::Tnk, Decimal::new(250, 0)), (Asset::Trk, Decimal::new(120, 0))]),
            Utc::now(),
        )
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileVaultStore::new(temp_dir.path());

        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileVaultStore::new(temp_dir.path());
        let vault = sample_vault();

        store.save(&vault).unwrap();

        assert!(store.exists());
        assert_eq!(store.load().unwrap(), Some(vault));
        assert!(!temp_dir.path().join(TEMP_FILE_NAME).exists());
    }

    #[test]
    fn test_save_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("data");
        let store = FileVaultStore::new(&nested);

        store.save(&sample_vault()).unwrap();
        assert!(nested.join(VAULT_FILE_NAME).is_file());
    }

    #[test]
    fn test_save_replaces_wholesale() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileVaultStore::new(temp_dir.path());

        let mut vault = sample_vault();
        store.save(&vault).unwrap();

        vault.balances = Balances::from_iter([(Asset::Tnk, Decimal::new(1, 0))]);
        store.save(&vault).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.balances.get(Asset::Tnk), Decimal::new(1, 0));
        assert_eq!(loaded.balances.get(Asset::Trk), Decimal::ZERO);
    }

    #[test]
    fn test_stale_temp_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileVaultStore::new(temp_dir.path());
        let vault = sample_vault();
        store.save(&vault).unwrap();

        // A crash mid-write leaves only the temp file behind
        std::fs::write(temp_dir.path().join(TEMP_FILE_NAME), "{\"version\": 1, \"addr").unwrap();

        assert_eq!(store.load().unwrap(), Some(vault));
    }

    #[test]
    fn test_corrupt_vault_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileVaultStore::new(temp_dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        assert!(store.load().is_err());
    }
}

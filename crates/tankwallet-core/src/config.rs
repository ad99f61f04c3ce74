//! Runtime configuration
//!
//! Non-secret settings come from an optional `settings.json` in the data
//! directory, then from environment overrides. Missing fields fall back to
//! the defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crypto::{VaultCipher, DEFAULT_ITERATIONS, MIN_ITERATIONS};
use crate::error::{Result, WalletError};
use crate::ledger::{Asset, Balances, SwapRates};
use crate::storage::VAULT_FILE_NAME;

/// Overrides the data directory
pub const ENV_DATA_DIR: &str = "TANKWALLET_DATA_DIR";

/// Overrides the inactivity timeout, in milliseconds
pub const ENV_AUTO_LOCK_MS: &str = "TANKWALLET_AUTO_LOCK_MS";

/// Settings file name inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Default inactivity timeout: 5 minutes
pub const DEFAULT_AUTO_LOCK_MS: u64 = 5 * 60 * 1000;

fn default_initial_balances() -> Balances {
    Balances::from_iter([
        (Asset::Tnk, Decimal::new(250, 0)),
        (Asset::Trk, Decimal::new(120, 0)),
    ])
}

fn default_auto_lock_ms() -> u64 {
    DEFAULT_AUTO_LOCK_MS
}

fn default_kdf_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

/// Platform data directory, or `~/.tankwallet` when none can be resolved
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "tankwallet")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .or_else(|| UserDirs::new().map(|dirs| dirs.home_dir().join(".tankwallet")))
        .unwrap_or_else(|| PathBuf::from(".tankwallet"))
}

/// Wallet configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConfig {
    /// Where `vault.json` lives; taken from the environment, never the file
    #[serde(skip, default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_auto_lock_ms")]
    pub auto_lock_ms: u64,
    /// Balances written into a freshly created or imported vault
    #[serde(default = "default_initial_balances")]
    pub initial_balances: Balances,
    #[serde(default)]
    pub swap_rates: SwapRates,
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            auto_lock_ms: DEFAULT_AUTO_LOCK_MS,
            initial_balances: default_initial_balances(),
            swap_rates: SwapRates::default(),
            kdf_iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl WalletConfig {
    /// Load from the process environment and the data directory
    pub fn load() -> Result<Self> {
        Self::load_for(None)
    }

    /// Like [`load`](Self::load), with `data_dir` taking precedence over
    /// `TANKWALLET_DATA_DIR` when given
    pub fn load_for(data_dir: Option<&Path>) -> Result<Self> {
        Self::resolve(data_dir, |key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::resolve(None, lookup)
    }

    /// Pick the data directory first, then read its settings file and
    /// apply environment overrides on top
    pub fn resolve<F>(data_dir: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => lookup(ENV_DATA_DIR)
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(default_data_dir),
        };

        let mut config = Self::load_from(&data_dir)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Read `settings.json` from `data_dir`, defaults when absent
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE_NAME);
        let mut config = if path.is_file() {
            let contents = std::fs::read_to_string(&path)?;
            let config: WalletConfig = serde_json::from_str(&contents)
                .map_err(|e| WalletError::Config(format!("{}: {}", path.display(), e)))?;
            debug!("Loaded settings from {:?}", path);
            config
        } else {
            debug!("No settings file found, using defaults");
            Self::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    /// Apply setting overrides through `lookup`; the data directory is
    /// fixed before the settings file is read and is left alone here
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_AUTO_LOCK_MS) {
            self.auto_lock_ms = raw.trim().parse().map_err(|_| {
                WalletError::Config(format!("{} must be a whole number of milliseconds", ENV_AUTO_LOCK_MS))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.auto_lock_ms == 0 {
            return Err(WalletError::Config("auto-lock timeout must be positive".to_string()));
        }
        if self.initial_balances.has_negative() {
            return Err(WalletError::Config("initial balances must not be negative".to_string()));
        }
        if let Some((from, to, _)) = self.swap_rates.iter().find(|(_, _, rate)| *rate <= Decimal::ZERO) {
            return Err(WalletError::Config(format!("swap rate {}_{} must be positive", from, to)));
        }
        if self.kdf_iterations < MIN_ITERATIONS {
            return Err(WalletError::Config(format!(
                "KDF iterations must be at least {}",
                MIN_ITERATIONS
            )));
        }
        Ok(())
    }

    pub fn vault_path(&self) -> PathBuf {
        self.data_dir.join(VAULT_FILE_NAME)
    }

    pub fn auto_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.auto_lock_ms)
    }

    /// Cipher sealing new vaults with the configured iteration count
    pub fn cipher(&self) -> Result<VaultCipher> {
        VaultCipher::new(self.kdf_iterations)
    }
}

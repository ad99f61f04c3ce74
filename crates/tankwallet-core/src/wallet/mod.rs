//! Wallet service: vault lifecycle, session state and the local ledger

mod types;
mod watcher;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::activity::{ActivityEntry, ActivityKind, DEFAULT_READ_LIMIT, SEND_STATUS};
use crate::auto_lock::AutoLock;
use crate::clock::{Clock, SystemClock};
use crate::config::WalletConfig;
use crate::crypto::{constant_time_eq, hash_passphrase, SecretString, VaultCipher};
use crate::derivation::{Bip39Deriver, DerivedWallet, KeyDeriver};
use crate::error::{Result, WalletError};
use crate::ledger::{self, Asset, Balances, Leg, SwapQuote, SwapRates};
use crate::session::Session;
use crate::storage::{FileVaultStore, VaultStore};
use crate::vault::Vault;

pub use types::{
    LockReason, SendReceipt, SendRequest, StateSnapshot, SwapReceipt, SwapRequest, WalletState,
    SERVICE_MODE,
};
pub use watcher::{spawn_auto_lock_watcher, SharedWalletService};

/// Shortest passphrase accepted for create, import and unlock
pub const MIN_PASSPHRASE_LEN: usize = 8;

const BOOTSTRAP_MESSAGE: &str = "TankWallet created";
const IMPORT_MESSAGE: &str = "Wallet imported from mnemonic";

fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
        return Err(WalletError::Validation(format!(
            "Passphrase must be at least {} characters",
            MIN_PASSPHRASE_LEN
        )));
    }
    Ok(())
}

/// The wallet service
///
/// Owns the loaded vault and, while unlocked, the only [`Session`]. Every
/// mutating operation builds the next vault as a value, persists it and
/// only then replaces the in-memory copy.
pub struct WalletService {
    store: Box<dyn VaultStore>,
    cipher: VaultCipher,
    deriver: Arc<dyn KeyDeriver>,
    clock: Arc<dyn Clock>,
    vault: Option<Vault>,
    session: Option<Session>,
    auto_lock: AutoLock,
    lock_reason: LockReason,
    initial_balances: Balances,
    swap_rates: SwapRates,
}

impl WalletService {
    /// Create a service over `store`, starting Locked if a vault exists
    pub fn new(
        config: &WalletConfig,
        store: Box<dyn VaultStore>,
        deriver: Arc<dyn KeyDeriver>,
    ) -> Result<Self> {
        let vault = store.load()?;
        let lock_reason = if vault.is_some() {
            LockReason::Locked
        } else {
            LockReason::NoVault
        };

        debug!(
            "Opened wallet service on {} storage (vault present: {})",
            store.backend_name(),
            vault.is_some()
        );

        Ok(Self {
            store,
            cipher: config.cipher()?,
            deriver,
            clock: Arc::new(SystemClock),
            vault,
            session: None,
            auto_lock: AutoLock::new(config.auto_lock_timeout()),
            lock_reason,
            initial_balances: config.initial_balances.clone(),
            swap_rates: config.swap_rates.clone(),
        })
    }

    /// Open the vault file in the configured data directory
    pub fn open(config: &WalletConfig) -> Result<Self> {
        config.validate()?;
        let store = FileVaultStore::new(&config.data_dir);
        Self::new(config, Box::new(store), Arc::new(Bip39Deriver::new()))
    }

    /// Replace the cipher used to seal new vaults
    pub fn with_cipher(mut self, cipher: VaultCipher) -> Self {
        self.cipher = cipher;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn into_shared(self) -> SharedWalletService {
        Arc::new(Mutex::new(self))
    }

    pub fn wallet_state(&self) -> WalletState {
        match (&self.vault, &self.session) {
            (None, _) => WalletState::NoVault,
            (Some(_), None) => WalletState::Locked,
            (Some(_), Some(_)) => WalletState::Unlocked,
        }
    }

    pub fn has_vault(&self) -> bool {
        self.vault.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.session.is_none()
    }

    pub fn lock_reason(&self) -> LockReason {
        self.lock_reason
    }

    /// Create a vault from a fresh or supplied mnemonic, then unlock it
    pub async fn create_wallet(
        &mut self,
        passphrase: &str,
        mnemonic: Option<&str>,
    ) -> Result<StateSnapshot> {
        self.enforce_auto_lock();
        if self.vault.is_some() {
            return Err(WalletError::VaultAlreadyExists);
        }
        validate_passphrase(passphrase)?;

        let derived = self.derive(mnemonic).await?;
        let sanitized = self
            .deriver
            .sanitize_mnemonic(derived.mnemonic.expose())
            .map(SecretString::new)
            .ok_or_else(|| {
                WalletError::WalletGenerationFailed("mnemonic validation failed".to_string())
            })?;

        self.install_vault(
            passphrase,
            &derived,
            &sanitized,
            ActivityKind::Bootstrap {
                message: BOOTSTRAP_MESSAGE.to_string(),
            },
        )?;
        info!("Wallet created for {}", derived.address);
        drop(derived);

        self.unlock(passphrase).await
    }

    /// Create a vault from an existing mnemonic, then unlock it
    pub async fn import_wallet(&mut self, passphrase: &str, mnemonic: &str) -> Result<StateSnapshot> {
        self.enforce_auto_lock();
        if self.vault.is_some() {
            return Err(WalletError::VaultAlreadyExists);
        }
        validate_passphrase(passphrase)?;

        let mnemonic = mnemonic.trim();
        if mnemonic.is_empty() {
            return Err(WalletError::Validation("Mnemonic is required".to_string()));
        }

        let derived = self.derive(Some(mnemonic)).await?;
        let sanitized = self
            .deriver
            .sanitize_mnemonic(derived.mnemonic.expose())
            .map(SecretString::new)
            .ok_or(WalletError::InvalidMnemonic)?;

        self.install_vault(
            passphrase,
            &derived,
            &sanitized,
            ActivityKind::Import {
                message: IMPORT_MESSAGE.to_string(),
            },
        )?;
        info!("Wallet imported for {}", derived.address);
        drop(derived);

        self.unlock(passphrase).await
    }

    /// Verify `passphrase` and open a session
    ///
    /// Unlocking while already unlocked re-verifies and replaces the session.
    /// On any failure the current session (if any) is left as it was.
    pub async fn unlock(&mut self, passphrase: &str) -> Result<StateSnapshot> {
        self.enforce_auto_lock();
        let vault = self.vault.as_ref().ok_or(WalletError::NoVaultFound)?;
        validate_passphrase(passphrase)?;

        let expected_hash = hash_passphrase(passphrase);
        if !constant_time_eq(vault.passphrase_hash.as_bytes(), expected_hash.as_bytes()) {
            warn!("Unlock rejected: passphrase does not match");
            return Err(WalletError::AuthenticationFailure);
        }

        let mnemonic = self
            .cipher
            .unseal(&vault.encrypted_mnemonic, passphrase)
            .inspect_err(|e| warn!("Unlock rejected: {}", e))?;
        let expected_address = vault.address.clone();

        let derived = self.derive(Some(mnemonic.expose())).await?;
        drop(mnemonic);

        if derived.address != expected_address {
            warn!("Vault integrity check failed for {}", expected_address);
            return Err(WalletError::IntegrityCheckFailed);
        }

        let now = self.clock.now();
        self.session = Some(Session::new(derived, now));
        self.lock_reason = LockReason::Unlocked;
        self.auto_lock.arm(now);

        info!("Wallet unlocked");
        Ok(self.snapshot())
    }

    /// Drop the session, zeroing its secrets. Safe to call in any state.
    pub fn lock(&mut self, reason: LockReason) -> StateSnapshot {
        self.auto_lock.cancel();
        if let Some(mut session) = self.session.take() {
            session.wipe();
            info!("Wallet locked ({})", reason);
        }
        self.lock_reason = reason;
        self.snapshot()
    }

    /// Lock if the inactivity deadline has passed; returns whether it did
    pub fn enforce_auto_lock(&mut self) -> bool {
        if self.session.is_some() && self.auto_lock.is_expired(self.clock.now()) {
            info!("Auto-lock timeout reached");
            self.lock(LockReason::AutoTimeout);
            return true;
        }
        false
    }

    /// Restart the inactivity window; no-op while locked
    pub fn touch(&mut self) {
        self.enforce_auto_lock();
        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            session.touch(now);
            self.auto_lock.arm(now);
        }
    }

    /// Fail with `WalletLocked` unless a session is live, then touch it
    pub fn require_unlocked(&mut self) -> Result<()> {
        self.enforce_auto_lock();
        if self.session.is_none() {
            return Err(WalletError::WalletLocked);
        }
        self.touch();
        Ok(())
    }

    pub fn state(&mut self) -> StateSnapshot {
        self.enforce_auto_lock();
        self.snapshot()
    }

    /// Address of the vault; available while locked
    pub fn address(&self) -> Result<String> {
        self.vault
            .as_ref()
            .map(|vault| vault.address.clone())
            .ok_or(WalletError::NoVaultFound)
    }

    /// Debit the local ledger for a transfer to `request.to`
    pub fn send(&mut self, request: &SendRequest) -> Result<SendReceipt> {
        self.require_unlocked()?;
        ledger::validate_address(&request.to)?;
        let asset: Asset = request.asset.parse()?;
        let amount = ledger::parse_amount(&request.amount)?;

        let tx_ref = ledger::reference("tx");
        let memo = request.memo.clone().unwrap_or_default();
        let to = request.to.clone();

        let balances = self.commit(|vault, now| {
            vault.balances = vault.balances.apply(&[Leg::Debit { asset, amount }])?;
            vault.activity.record(
                ActivityKind::Send {
                    asset,
                    amount,
                    to,
                    memo,
                    tx_ref: tx_ref.clone(),
                    status: SEND_STATUS.to_string(),
                },
                now,
            );
            Ok(())
        })?;

        info!("Sent {} {} ({})", amount, asset, tx_ref);
        Ok(SendReceipt { tx_ref, balances })
    }

    /// Price a swap at the current rate table; works while locked
    pub fn quote_swap(&self, request: &SwapRequest) -> Result<SwapQuote> {
        let from: Asset = request.from_asset.parse()?;
        let to: Asset = request.to_asset.parse()?;
        if from == to {
            return Err(WalletError::SamePairRejected);
        }
        let amount = ledger::parse_amount(&request.amount)?;

        ledger::quote_swap(&self.swap_rates, from, to, amount, self.clock.now())
    }

    /// Reprice and execute a swap as one transaction
    pub fn execute_swap(&mut self, request: &SwapRequest) -> Result<SwapReceipt> {
        self.require_unlocked()?;
        let quote = self.quote_swap(request)?;
        let swap_ref = ledger::reference("swp");

        let balances = self.commit(|vault, now| {
            vault.balances = vault.balances.apply(&quote.legs())?;
            vault.activity.record(
                ActivityKind::Swap {
                    from_asset: quote.from_asset,
                    to_asset: quote.to_asset,
                    amount: quote.amount,
                    receive: quote.receive,
                    fee: quote.fee,
                    rate: quote.rate,
                    swap_ref: swap_ref.clone(),
                },
                now,
            );
            Ok(())
        })?;

        info!(
            "Swapped {} {} for {} {} ({})",
            quote.amount, quote.from_asset, quote.receive, quote.to_asset, swap_ref
        );
        Ok(SwapReceipt {
            swap_ref,
            quote,
            balances,
        })
    }

    /// Newest activity first; empty without a vault
    pub fn activity(&self, limit: Option<usize>) -> Vec<ActivityEntry> {
        match &self.vault {
            Some(vault) => vault.activity.recent(limit.unwrap_or(DEFAULT_READ_LIMIT)),
            None => Vec::new(),
        }
    }

    async fn derive(&self, mnemonic: Option<&str>) -> Result<DerivedWallet> {
        let derived = self
            .deriver
            .derive_or_generate(mnemonic)
            .await
            .map_err(|e| match e {
                WalletError::InvalidMnemonic | WalletError::WalletGenerationFailed(_) => e,
                other => WalletError::WalletGenerationFailed(other.to_string()),
            })?;

        if derived.address.is_empty() || derived.mnemonic.is_empty() {
            return Err(WalletError::WalletGenerationFailed(
                "derivation returned an empty address or mnemonic".to_string(),
            ));
        }
        Ok(derived)
    }

    fn install_vault(
        &mut self,
        passphrase: &str,
        derived: &DerivedWallet,
        mnemonic: &SecretString,
        entry: ActivityKind,
    ) -> Result<()> {
        let now = self.clock.now();
        let payload = self.cipher.seal(mnemonic.expose(), passphrase)?;

        let mut vault = Vault::new(
            derived.address.clone(),
            payload,
            hash_passphrase(passphrase),
            self.initial_balances.clone(),
            now,
        );
        vault.activity.record(entry, now);

        self.store.save(&vault)?;
        self.vault = Some(vault);
        self.lock_reason = LockReason::Locked;
        Ok(())
    }

    /// Apply `change` to a copy of the vault, persist it, then swap it in
    fn commit<F>(&mut self, change: F) -> Result<Balances>
    where
        F: FnOnce(&mut Vault, DateTime<Utc>) -> Result<()>,
    {
        let current = self.vault.as_ref().ok_or(WalletError::NoVaultFound)?;
        let now = self.clock.now();

        let mut next = current.clone();
        change(&mut next, now)?;
        next.updated_at = now;

        self.store.save(&next)?;
        let balances = next.balances.clone();
        self.vault = Some(next);
        Ok(balances)
    }

    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            has_vault: self.vault.is_some(),
            locked: self.session.is_none(),
            address: self.vault.as_ref().map(|vault| vault.address.clone()),
            balances: self.vault.as_ref().map(|vault| vault.balances.clone()),
            auto_lock_seconds: self.auto_lock.timeout().as_secs(),
            lock_reason: self.lock_reason,
            mode: SERVICE_MODE.to_string(),
        }
    }
}

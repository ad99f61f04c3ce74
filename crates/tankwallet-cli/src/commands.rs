//! Wallet commands shared by one-shot invocations and the shell

use std::error::Error;

use clap::Subcommand;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use zeroize::Zeroizing;

use tankwallet_core::{LockReason, SendRequest, SwapRequest, WalletError, WalletService};

/// Result type for command execution
pub type CommandResult<T> = Result<T, Box<dyn Error>>;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show vault and session state
    Status,

    /// Create a new vault (random mnemonic unless one is given)
    Create {
        #[arg(long)]
        mnemonic: Option<String>,
    },

    /// Create a vault from an existing mnemonic
    Import {
        #[arg(long)]
        mnemonic: String,
    },

    /// Unlock the vault
    Unlock,

    /// Lock the vault
    Lock,

    /// Print the wallet address
    Address,

    /// Send from the local balance
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        memo: Option<String>,
    },

    /// Price a swap without executing it
    Quote {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// Execute a swap at the current rate
    Swap {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
    },

    /// List recent activity, newest first
    Activity {
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Keep the wallet open and read commands from stdin
    Shell,
}

/// How a command is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Single command; unlocks on demand and locks again on exit
    OneShot,
    /// Inside the shell; the session persists between commands
    Shell,
}

/// Where passphrases come from: a preset value or an interactive prompt
#[derive(Clone, Default)]
pub struct PassphraseSource {
    preset: Option<Zeroizing<String>>,
}

impl PassphraseSource {
    pub fn new(preset: Option<String>) -> Self {
        Self {
            preset: preset.map(Zeroizing::new),
        }
    }

    pub fn read(&self, prompt: &str) -> std::io::Result<Zeroizing<String>> {
        match &self.preset {
            Some(passphrase) => Ok(passphrase.clone()),
            None => rpassword::prompt_password(prompt).map(Zeroizing::new),
        }
    }
}

impl std::fmt::Debug for PassphraseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseSource")
            .field("preset", &self.preset.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn to_json<T: Serialize>(value: &T) -> CommandResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// JSON body reported for a failed command
pub fn error_json(error: &(dyn Error + 'static)) -> Value {
    let client_error = error
        .downcast_ref::<WalletError>()
        .map(WalletError::is_client_error)
        .unwrap_or(false);
    json!({
        "error": error.to_string(),
        "clientError": client_error,
    })
}

async fn ensure_unlocked(
    service: &mut WalletService,
    passphrase: &PassphraseSource,
    invocation: Invocation,
) -> CommandResult<()> {
    if invocation == Invocation::OneShot && service.has_vault() && service.is_locked() {
        debug!("Unlocking for a one-shot command");
        let passphrase = passphrase.read("Passphrase: ")?;
        service.unlock(&passphrase).await?;
    }
    Ok(())
}

/// Run one command against the service and return its JSON output
pub async fn execute(
    service: &mut WalletService,
    command: &Command,
    passphrase: &PassphraseSource,
    invocation: Invocation,
) -> CommandResult<Value> {
    match command {
        Command::Status => to_json(&service.state()),

        Command::Create { mnemonic } => {
            let passphrase = passphrase.read("New passphrase: ")?;
            let state = service.create_wallet(&passphrase, mnemonic.as_deref()).await?;
            to_json(&state)
        }

        Command::Import { mnemonic } => {
            let mnemonic = Zeroizing::new(mnemonic.clone());
            let passphrase = passphrase.read("New passphrase: ")?;
            let state = service.import_wallet(&passphrase, &mnemonic).await?;
            to_json(&state)
        }

        Command::Unlock => {
            let passphrase = passphrase.read("Passphrase: ")?;
            to_json(&service.unlock(&passphrase).await?)
        }

        Command::Lock => to_json(&service.lock(LockReason::Manual)),

        Command::Address => Ok(json!({ "address": service.address()? })),

        Command::Send {
            to,
            asset,
            amount,
            memo,
        } => {
            ensure_unlocked(service, passphrase, invocation).await?;
            let receipt = service.send(&SendRequest {
                to: to.clone(),
                asset: asset.clone(),
                amount: amount.clone(),
                memo: memo.clone(),
            })?;
            to_json(&receipt)
        }

        Command::Quote { from, to, amount } => {
            let quote = service.quote_swap(&SwapRequest {
                from_asset: from.clone(),
                to_asset: to.clone(),
                amount: amount.clone(),
            })?;
            to_json(&quote)
        }

        Command::Swap { from, to, amount } => {
            ensure_unlocked(service, passphrase, invocation).await?;
            let receipt = service.execute_swap(&SwapRequest {
                from_asset: from.clone(),
                to_asset: to.clone(),
                amount: amount.clone(),
            })?;
            to_json(&receipt)
        }

        Command::Activity { limit } => to_json(&service.activity(*limit)),

        Command::Shell => Err("the shell is already running".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tankwallet_core::{Bip39Deriver, MemoryVaultStore, VaultCipher, WalletConfig};

    const PASSPHRASE: &str = "abcdefgh";
    const DESTINATION: &str = "trac1qqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqq";

    fn service(store: &MemoryVaultStore) -> WalletService {
        WalletService::new(
            &WalletConfig::default(),
            Box::new(store.clone()),
            Arc::new(Bip39Deriver::new()),
        )
        .unwrap()
        .with_cipher(VaultCipher::new(1_000).unwrap())
    }

    fn send(amount: &str) -> Command {
        Command::Send {
            to: DESTINATION.to_string(),
            asset: "TNK".to_string(),
            amount: amount.to_string(),
            memo: None,
        }
    }

    #[tokio::test]
    async fn test_status_without_vault() {
        let store = MemoryVaultStore::new();
        let mut service = service(&store);
        let passphrase = PassphraseSource::new(None);

        let output = execute(&mut service, &Command::Status, &passphrase, Invocation::OneShot)
            .await
            .unwrap();
        assert_eq!(output["hasVault"], json!(false));
        assert_eq!(output["lockReason"], json!("no-vault"));
    }

    #[tokio::test]
    async fn test_one_shot_send_unlocks_on_demand() {
        let store = MemoryVaultStore::new();
        let passphrase = PassphraseSource::new(Some(PASSPHRASE.to_string()));

        let mut first = service(&store);
        execute(&mut first, &Command::Create { mnemonic: None }, &passphrase, Invocation::OneShot)
            .await
            .unwrap();
        drop(first);

        let mut second = service(&store);
        assert!(second.is_locked());
        let output = execute(&mut second, &send("50"), &passphrase, Invocation::OneShot)
            .await
            .unwrap();

        assert!(output["txRef"].as_str().unwrap().starts_with("tx-"));
        assert_eq!(output["balances"]["TNK"], json!("200.0000"));
        assert_eq!(store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_shell_send_requires_explicit_unlock() {
        let store = MemoryVaultStore::new();
        let passphrase = PassphraseSource::new(Some(PASSPHRASE.to_string()));
        let mut service = service(&store);
        execute(&mut service, &Command::Create { mnemonic: None }, &passphrase, Invocation::Shell)
            .await
            .unwrap();
        execute(&mut service, &Command::Lock, &passphrase, Invocation::Shell)
            .await
            .unwrap();

        let error = execute(&mut service, &send("1"), &passphrase, Invocation::Shell)
            .await
            .unwrap_err();
        let body = error_json(error.as_ref());
        assert_eq!(body["clientError"], json!(true));
        assert!(body["error"].as_str().unwrap().contains("locked"));

        execute(&mut service, &Command::Unlock, &passphrase, Invocation::Shell)
            .await
            .unwrap();
        execute(&mut service, &send("1"), &passphrase, Invocation::Shell)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quote_output_shape() {
        let store = MemoryVaultStore::new();
        let mut service = service(&store);
        let command = Command::Quote {
            from: "TNK".to_string(),
            to: "TRK".to_string(),
            amount: "10".to_string(),
        };

        let output = execute(&mut service, &command, &PassphraseSource::default(), Invocation::OneShot)
            .await
            .unwrap();
        assert_eq!(output["fromAsset"], json!("TNK"));
        assert_eq!(output["receive"], json!("5.1844"));
        assert!(output.get("expiresAt").is_some());
    }

    #[test]
    fn test_io_errors_are_not_client_errors() {
        let error = std::io::Error::other("disk full");
        assert_eq!(error_json(&error)["clientError"], json!(false));
    }

    #[test]
    fn test_passphrase_source_debug_redacts() {
        let source = PassphraseSource::new(Some(PASSPHRASE.to_string()));
        assert!(!format!("{:?}", source).contains(PASSPHRASE));
    }
}

//! TankWallet CLI - local encrypted vault and TNK/TRK ledger
//!
//! Each subcommand prints one JSON document on stdout. Commands that move
//! funds unlock the vault for the duration of the call and lock it again
//! before exiting; `shell` keeps a session open between commands.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use tankwallet_cli::{execute, run_shell, Command, Invocation, PassphraseSource};
use tankwallet_core::{LockReason, WalletConfig, WalletService};

/// TankWallet - local encrypted vault with a TNK/TRK ledger
#[derive(Parser, Debug)]
#[command(name = "tankwallet")]
#[command(version)]
#[command(about = "TankWallet - local encrypted vault with a TNK/TRK ledger")]
struct Args {
    /// Directory holding vault.json (overrides TANKWALLET_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Vault passphrase; prompted for when absent
    #[arg(long, env = "TANKWALLET_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = WalletConfig::load_for(args.data_dir.as_deref())
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    info!("Using data directory {}", config.data_dir.display());

    let mut service =
        WalletService::open(&config).map_err(|e| format!("Failed to open wallet: {}", e))?;
    let passphrase = PassphraseSource::new(args.passphrase);

    if args.command == Command::Shell {
        return run_shell(service, passphrase).await;
    }

    let result = execute(&mut service, &args.command, &passphrase, Invocation::OneShot).await;
    service.lock(LockReason::Shutdown);

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

//! Interactive shell: one long-lived service driven line by line from stdin

use std::error::Error;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use tankwallet_core::{spawn_auto_lock_watcher, LockReason, WalletService};

use crate::commands::{error_json, execute, Command, Invocation, PassphraseSource};

/// How often the shell checks the auto-lock deadline
pub const WATCH_PERIOD: Duration = Duration::from_secs(1);

#[derive(Parser, Debug)]
#[command(name = "tankwallet", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

/// Split a line into arguments, honouring single and double quotes
pub fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_arg = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

enum Parsed {
    Command(Command),
    Help(String),
    Invalid(String),
}

fn parse_line(line: &str) -> Parsed {
    let args = match split_line(line) {
        Ok(args) => args,
        Err(e) => return Parsed::Invalid(e),
    };

    match ShellLine::try_parse_from(args) {
        Ok(parsed) => Parsed::Command(parsed.command),
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand) => {
            Parsed::Help(e.render().to_string())
        }
        Err(e) => Parsed::Invalid(e.render().to_string().trim().to_string()),
    }
}

/// Run the shell until EOF or `exit`; the session is locked on the way out
pub async fn run_shell(
    service: WalletService,
    passphrase: PassphraseSource,
) -> Result<(), Box<dyn Error>> {
    let shared = service.into_shared();
    let watcher = spawn_auto_lock_watcher(&shared, WATCH_PERIOD);
    info!("TankWallet shell ready - type `help` for commands, `exit` to quit");

    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut line = String::new();

    loop {
        line.clear();

        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            info!("EOF received, shutting down");
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "exit" || line == "quit" {
            break;
        }

        let output = match parse_line(line) {
            Parsed::Command(Command::Shell) => json!({ "error": "the shell is already running" }),
            Parsed::Command(command) => {
                debug!("Running {:?}", command);
                let mut service = shared.lock().await;
                match execute(&mut service, &command, &passphrase, Invocation::Shell).await {
                    Ok(value) => value,
                    Err(e) => error_json(e.as_ref()),
                }
            }
            Parsed::Help(text) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.flush().await?;
                continue;
            }
            Parsed::Invalid(message) => json!({ "error": message }),
        };

        write_json(&mut stdout, &output).await?;
    }

    shared.lock().await.lock(LockReason::Shutdown);
    watcher.abort();
    Ok(())
}

async fn write_json(stdout: &mut tokio::io::Stdout, value: &Value) -> Result<(), Box<dyn Error>> {
    let rendered = serde_json::to_string_pretty(value)?;
    stdout.write_all(rendered.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

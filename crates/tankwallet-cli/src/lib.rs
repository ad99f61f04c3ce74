//! # tankwallet-cli
//!
//! Command-line front end for the TankWallet service. Every command prints
//! one JSON document on stdout; logs go to stderr.

pub mod commands;
pub mod shell;

pub use commands::{execute, Command, Invocation, PassphraseSource};
pub use shell::run_shell;

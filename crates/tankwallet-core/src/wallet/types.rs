//! Value types exchanged with the wallet service

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ledger::{Balances, SwapQuote};

/// Value of [`StateSnapshot::mode`]
pub const SERVICE_MODE: &str = "local-bridge";

/// Wallet state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// No vault has been created or imported yet
    NoVault,
    /// Vault exists, passphrase required
    Locked,
    /// Session is live
    Unlocked,
}

/// Why the wallet is in its current lock state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockReason {
    NoVault,
    Locked,
    Unlocked,
    Manual,
    AutoTimeout,
    Shutdown,
}

impl LockReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockReason::NoVault => "no-vault",
            LockReason::Locked => "locked",
            LockReason::Unlocked => "unlocked",
            LockReason::Manual => "manual",
            LockReason::AutoTimeout => "auto-timeout",
            LockReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public view of the service; carries no secret material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub has_vault: bool,
    pub locked: bool,
    pub address: Option<String>,
    pub balances: Option<Balances>,
    pub auto_lock_seconds: u64,
    pub lock_reason: LockReason,
    pub mode: String,
}

/// Transfer request as received from a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub to: String,
    pub asset: String,
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Swap request, used for both quoting and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub from_asset: String,
    pub to_asset: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub tx_ref: String,
    pub balances: Balances,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapReceipt {
    pub swap_ref: String,
    pub quote: SwapQuote,
    pub balances: Balances,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_reason_wire_names() {
        for reason in [
            LockReason::NoVault,
            LockReason::Locked,
            LockReason::Unlocked,
            LockReason::Manual,
            LockReason::AutoTimeout,
            LockReason::Shutdown,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason));
        }
    }

    #[test]
    fn test_send_request_memo_optional() {
        let request: SendRequest =
            serde_json::from_str(r#"{"to": "trac1abc", "asset": "TNK", "amount": "1.5"}"#).unwrap();
        assert_eq!(request.memo, None);
    }

    #[test]
    fn test_swap_request_camel_case() {
        let request: SwapRequest =
            serde_json::from_str(r#"{"fromAsset": "TNK", "toAsset": "TRK", "amount": "10"}"#).unwrap();
        assert_eq!(request.from_asset, "TNK");
        assert_eq!(request.to_asset, "TRK");
    }
}

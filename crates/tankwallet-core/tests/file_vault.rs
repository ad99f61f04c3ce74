//! End-to-end wallet flows over the on-disk vault

use std::sync::Arc;

use rust_decimal::Decimal;
use tankwallet_core::{
    ActivityKind, Asset, Bip39Deriver, FileVaultStore, LockReason, SendRequest, SwapRequest,
    VaultCipher, VaultStore, WalletConfig, WalletError, WalletService, WalletState,
};
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery";

fn open(dir: &TempDir) -> WalletService {
    let config = WalletConfig {
        data_dir: dir.path().to_path_buf(),
        ..WalletConfig::default()
    };
    WalletService::new(
        &config,
        Box::new(FileVaultStore::new(dir.path())),
        Arc::new(Bip39Deriver::new()),
    )
    .unwrap()
    .with_cipher(VaultCipher::new(1_000).unwrap())
}

#[tokio::test]
async fn test_vault_survives_restart() {
    let dir = TempDir::new().unwrap();

    let address = {
        let mut service = open(&dir);
        let state = service.create_wallet(PASSPHRASE, None).await.unwrap();
        service
            .send(&SendRequest {
                to: "trac1zzzzzzzzzzzzzzzzzzzzzzzzzzzz".to_string(),
                asset: "TRK".to_string(),
                amount: "20".to_string(),
                memo: Some("rent".to_string()),
            })
            .unwrap();
        service.lock(LockReason::Shutdown);
        state.address.unwrap()
    };

    let mut service = open(&dir);
    assert_eq!(service.wallet_state(), WalletState::Locked);
    assert_eq!(service.address().unwrap(), address);

    let state = service.unlock(PASSPHRASE).await.unwrap();
    let balances = state.balances.unwrap();
    assert_eq!(balances.get(Asset::Trk), Decimal::new(100, 0));
    assert_eq!(balances.get(Asset::Tnk), Decimal::new(250, 0));

    let activity = service.activity(None);
    assert_eq!(activity.len(), 2);
    assert!(matches!(&activity[0].kind, ActivityKind::Send { memo, .. } if memo == "rent"));
    assert_eq!(activity[1].kind.name(), "bootstrap");
}

#[tokio::test]
async fn test_vault_file_layout() {
    let dir = TempDir::new().unwrap();
    let mut service = open(&dir);
    service.create_wallet(PASSPHRASE, None).await.unwrap();
    service
        .execute_swap(&SwapRequest {
            from_asset: "TRK".to_string(),
            to_asset: "TNK".to_string(),
            amount: "10".to_string(),
        })
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join("vault.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    assert_eq!(json["version"], 1);
    assert_eq!(json["encryptedMnemonic"]["algo"], "aes-256-gcm");
    assert_eq!(json["encryptedMnemonic"]["kdfName"], "pbkdf2-sha512");
    assert_eq!(json["encryptedMnemonic"]["iterations"], 1_000);
    assert_eq!(json["activity"][0]["kind"], "swap");
    assert_eq!(json["activity"][0]["swapRef"].as_str().unwrap().len(), 12);
    assert!(json.get("createdAt").is_some());
    assert!(!dir.path().join(".vault.tmp").exists());
}

#[tokio::test]
async fn test_legacy_vault_is_readable() {
    let dir = TempDir::new().unwrap();
    let payload = VaultCipher::new(1_000)
        .unwrap()
        .seal(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
            PASSPHRASE,
        )
        .unwrap();
    let address = {
        use tankwallet_core::KeyDeriver;
        Bip39Deriver::new()
            .derive_or_generate(Some(
                "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
            ))
            .await
            .unwrap()
            .address
    };

    // Older files used `kdf`/`data`, plain numbers for balances and a
    // `type` tag on activity entries
    let legacy = serde_json::json!({
        "version": 1,
        "createdAt": "2024-05-01T10:00:00.000Z",
        "updatedAt": "2024-05-01T10:00:00.000Z",
        "address": address,
        "encryptedMnemonic": {
            "algo": payload.algo,
            "kdf": payload.kdf_name,
            "iterations": payload.iterations,
            "salt": payload.salt,
            "iv": payload.iv,
            "authTag": payload.auth_tag,
            "data": payload.ciphertext,
        },
        "passphraseHash": tankwallet_core::crypto::hash_passphrase(PASSPHRASE),
        "balances": { "TNK": 12.5, "TRK": 3 },
        "activity": [
            {
                "id": "0d9e8f7a-6b5c-4d3e-8f2a-1b0c9d8e7f6a",
                "timestamp": "2024-05-01T10:00:00.000Z",
                "type": "bootstrap",
                "message": "TankWallet created"
            }
        ],
    });
    std::fs::write(
        dir.path().join("vault.json"),
        serde_json::to_string_pretty(&legacy).unwrap(),
    )
    .unwrap();

    let store = FileVaultStore::new(dir.path());
    assert!(store.exists());
    assert_eq!(store.load().unwrap().unwrap().activity.len(), 1);

    let mut service = open(&dir);
    assert_eq!(service.state().lock_reason, LockReason::Locked);
    let state = service.unlock(PASSPHRASE).await.unwrap();
    assert_eq!(state.address, Some(address));
    assert_eq!(state.balances.unwrap().get(Asset::Tnk), Decimal::new(125, 1));

    let activity = service.activity(None);
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind.name(), "bootstrap");
}

#[tokio::test]
async fn test_wrong_passphrase_keeps_vault_locked() {
    let dir = TempDir::new().unwrap();
    open(&dir).create_wallet(PASSPHRASE, None).await.unwrap();

    let mut service = open(&dir);
    let result = service.unlock("incorrect horse").await;
    assert!(matches!(result, Err(WalletError::AuthenticationFailure)));
    assert_eq!(service.wallet_state(), WalletState::Locked);
    assert_eq!(service.state().lock_reason, LockReason::Locked);
}

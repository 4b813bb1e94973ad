//! Tests for vault persistence, legacy migration and session behavior

use std::time::Duration;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};

use eon_wallet::account::WalletDocument;
use eon_wallet::vault::*;
use eon_wallet::Error;

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn document() -> WalletDocument {
    WalletDocument::import("Vault Test".to_string(), MNEMONIC).unwrap()
}

/// Build a blob in the pre-salt format: AES-256-GCM under SHA-256(password),
/// nonce prefixed to the ciphertext.
fn legacy_blob(document: &WalletDocument, password: &str) -> LegacyVault {
    let key: [u8; 32] = Sha256::digest(password.as_bytes()).into();
    let nonce = [7u8; 12];

    let plaintext = serde_json::to_vec(document).unwrap();
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
        .unwrap();

    let mut raw = nonce.to_vec();
    raw.extend_from_slice(&ciphertext);
    LegacyVault {
        encrypted: general_purpose::STANDARD.encode(raw),
    }
}

#[test]
fn test_round_trip() {
    let doc = document();
    let vault = encrypt_vault(&doc, "hunter2hunter2").unwrap();
    assert_eq!(decrypt_vault(&vault, "hunter2hunter2").unwrap(), doc);
}

#[test]
fn test_wrong_password_fails() {
    let vault = encrypt_vault(&document(), "hunter2hunter2").unwrap();
    assert!(matches!(
        decrypt_vault(&vault, "hunter3hunter3"),
        Err(Error::WrongPassword)
    ));
}

#[test]
fn test_migrate_legacy_preserves_document() {
    let doc = document();
    let blob = legacy_blob(&doc, "old password");

    let (migrated_doc, upgraded) = migrate_legacy(&blob, "old password").unwrap();
    assert_eq!(migrated_doc, doc);
    assert_eq!(upgraded.version, VAULT_VERSION);

    // the upgraded vault decrypts to the same document
    assert_eq!(decrypt_vault(&upgraded, "old password").unwrap(), doc);
}

#[test]
fn test_migrate_legacy_wrong_password() {
    let blob = legacy_blob(&document(), "old password");
    assert!(matches!(
        migrate_legacy(&blob, "not it"),
        Err(Error::WrongPassword)
    ));
}

#[test]
fn test_load_vault_detects_formats() {
    let vault = encrypt_vault(&document(), "pw").unwrap();
    let current_json = serde_json::to_string(&vault).unwrap();
    assert!(matches!(
        load_vault(&current_json).unwrap(),
        StoredVault::Current(_)
    ));

    let legacy_json = r#"{"encrypted":"AAAA"}"#;
    assert!(matches!(
        load_vault(legacy_json).unwrap(),
        StoredVault::Legacy(_)
    ));
}

#[test]
fn test_load_vault_rejects_corrupt_record() {
    assert!(matches!(load_vault("{not json"), Err(Error::Vault(_))));
    assert!(matches!(load_vault("[1,2,3]"), Err(Error::Vault(_))));
}

#[tokio::test]
async fn test_session_unlock_and_lock() {
    let doc = document();
    let vault = StoredVault::Current(encrypt_vault(&doc, "pw").unwrap());
    let session = VaultSession::new();

    assert!(!session.is_unlocked().await);
    assert!(session.unlock(&vault, "pw").await.unwrap().is_none());
    assert!(session.is_unlocked().await);

    let name = session.with_wallet(|w| w.name().to_string()).await.unwrap();
    assert_eq!(name, "Vault Test");

    session.lock().await;
    assert!(!session.is_unlocked().await);
    assert!(matches!(
        session.with_wallet(|w| w.id().to_string()).await,
        Err(Error::SessionLocked)
    ));

    // unlocking again after a lock works
    assert!(session.unlock(&vault, "pw").await.unwrap().is_none());
    assert!(session.is_unlocked().await);
}

#[tokio::test]
async fn test_session_rejects_wrong_password() {
    let vault = StoredVault::Current(encrypt_vault(&document(), "pw").unwrap());
    let session = VaultSession::new();

    assert!(matches!(
        session.unlock(&vault, "wrong").await,
        Err(Error::WrongPassword)
    ));
    assert!(!session.is_unlocked().await);

    // the failure did not poison the session
    assert!(session.unlock(&vault, "pw").await.is_ok());
}

#[tokio::test]
async fn test_session_migrates_legacy_vault() {
    let doc = document();
    let stored = StoredVault::Legacy(legacy_blob(&doc, "pw"));
    let session = VaultSession::new();

    let upgraded = session.unlock(&stored, "pw").await.unwrap();
    let upgraded = upgraded.expect("legacy unlock should return an upgraded vault");
    assert_eq!(upgraded.version, VAULT_VERSION);
    assert_eq!(decrypt_vault(&upgraded, "pw").unwrap(), doc);
    assert!(session.is_unlocked().await);
}

#[tokio::test]
async fn test_session_auto_locks_when_idle() {
    let vault = StoredVault::Current(encrypt_vault(&document(), "pw").unwrap());
    let session = VaultSession::with_auto_lock(Duration::from_millis(50));

    session.unlock(&vault, "pw").await.unwrap();
    assert!(session.is_unlocked().await);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(!session.is_unlocked().await);
}

#[tokio::test]
async fn test_session_persist_round_trips() {
    let doc = document();
    let vault = StoredVault::Current(encrypt_vault(&doc, "pw").unwrap());
    let session = VaultSession::new();
    session.unlock(&vault, "pw").await.unwrap();

    let mut updated = doc.clone();
    updated.add_account();
    let rewritten = session.persist(&updated, "pw").await.unwrap();
    assert_eq!(decrypt_vault(&rewritten, "pw").unwrap(), updated);
}

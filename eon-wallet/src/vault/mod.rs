//! Secure vault for wallet secret material
//!
//! Encrypts the serialized [`WalletDocument`] under a password-derived key:
//! PBKDF2-HMAC-SHA256 (100,000 iterations, fixed) into AES-256-GCM with a
//! fresh random salt and nonce per encryption. Also migrates the legacy
//! unsalted format (key taken directly from a hash of the password).

mod session;

pub use session::*;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::account::WalletDocument;
use crate::error::{Error, Result};

/// Current vault format version
pub const VAULT_VERSION: u32 = 2;

/// PBKDF2 iteration count. Fixed and documented, not user-configurable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Persisted vault record (current format)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncryptedVault {
    /// Base64 ciphertext (including the GCM authentication tag)
    pub encrypted: String,
    /// Hex-encoded PBKDF2 salt
    pub salt: String,
    /// Hex-encoded AES-GCM nonce
    pub iv: String,
    /// Format version
    pub version: u32,
    /// Timestamp when the vault was written
    pub timestamp: u64,
}

/// Persisted vault record in the pre-salt legacy format
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegacyVault {
    /// Base64 of `nonce ∥ ciphertext`, encrypted under SHA-256(password)
    pub encrypted: String,
}

/// Either vault format, as found on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredVault {
    Current(EncryptedVault),
    Legacy(LegacyVault),
}

/// A derived symmetric vault key. Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; KEY_LEN]);

impl VaultKey {
    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Derive the vault key from a password and salt
pub fn derive_vault_key(password: &str, salt: &[u8]) -> VaultKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    VaultKey(key)
}

/// Parse a persisted vault record, distinguishing current and legacy formats.
///
/// A record that parses as neither is corrupt; callers reset the vault key
/// only, never attempt partial recovery of its contents.
pub fn load_vault(json: &str) -> Result<StoredVault> {
    serde_json::from_str(json).map_err(|e| Error::Vault(format!("corrupt vault record: {}", e)))
}

/// Encrypt a wallet document under a password.
///
/// A fresh salt and nonce are drawn from the OS CSPRNG on every call; no
/// salt/nonce pair is ever reused.
pub fn encrypt_vault(document: &WalletDocument, password: &str) -> Result<EncryptedVault> {
    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| Error::EntropySource(e.to_string()))?;

    let key = derive_vault_key(password, &salt);
    encrypt_vault_with_key(document, &key, &salt)
}

/// Encrypt a wallet document under an already-derived key and its salt
pub fn encrypt_vault_with_key(
    document: &WalletDocument,
    key: &VaultKey,
    salt: &[u8],
) -> Result<EncryptedVault> {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|e| Error::EntropySource(e.to_string()))?;

    let plaintext =
        serde_json::to_vec(document).map_err(|e| Error::Serialization(e.to_string()))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
        .map_err(|_| Error::Vault("encryption failure".to_string()))?;

    Ok(EncryptedVault {
        encrypted: general_purpose::STANDARD.encode(ciphertext),
        salt: hex::encode(salt),
        iv: hex::encode(nonce),
        version: VAULT_VERSION,
        timestamp: unix_timestamp()?,
    })
}

/// Decrypt a vault with a password
pub fn decrypt_vault(vault: &EncryptedVault, password: &str) -> Result<WalletDocument> {
    let salt = decode_salt(vault)?;
    let key = derive_vault_key(password, &salt);
    decrypt_vault_with_key(vault, &key)
}

/// Decode and check the stored salt
pub fn decode_salt(vault: &EncryptedVault) -> Result<Vec<u8>> {
    let salt =
        hex::decode(&vault.salt).map_err(|e| Error::Vault(format!("corrupt vault salt: {}", e)))?;
    if salt.len() < SALT_LEN {
        return Err(Error::Vault("vault salt too short".to_string()));
    }
    Ok(salt)
}

/// Decrypt a vault with an already-derived key.
///
/// A failed authentication tag and an unparseable plaintext both surface as
/// [`Error::WrongPassword`]; the difference is not observable.
pub fn decrypt_vault_with_key(vault: &EncryptedVault, key: &VaultKey) -> Result<WalletDocument> {
    let nonce =
        hex::decode(&vault.iv).map_err(|e| Error::Vault(format!("corrupt vault nonce: {}", e)))?;
    if nonce.len() != NONCE_LEN {
        return Err(Error::Vault("vault nonce has wrong length".to_string()));
    }
    let ciphertext = general_purpose::STANDARD
        .decode(&vault.encrypted)
        .map_err(|e| Error::Vault(format!("corrupt vault ciphertext: {}", e)))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_ref())
        .map_err(|_| Error::WrongPassword)?;

    serde_json::from_slice(&plaintext).map_err(|_| Error::WrongPassword)
}

/// Decrypt a legacy (pre-salt) vault blob.
///
/// The legacy scheme fed SHA-256 of the password directly into AES-256-GCM
/// and prefixed the nonce to the ciphertext.
pub fn decrypt_legacy(vault: &LegacyVault, password: &str) -> Result<WalletDocument> {
    let raw = general_purpose::STANDARD
        .decode(&vault.encrypted)
        .map_err(|e| Error::Vault(format!("corrupt legacy vault: {}", e)))?;
    if raw.len() <= NONCE_LEN {
        return Err(Error::Vault("legacy vault too short".to_string()));
    }

    let mut key: [u8; KEY_LEN] = Sha256::digest(password.as_bytes()).into();
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::WrongPassword);
    key.zeroize();

    serde_json::from_slice(&plaintext?).map_err(|_| Error::WrongPassword)
}

/// Decrypt a legacy blob and re-encrypt it under the current scheme
pub fn migrate_legacy(
    vault: &LegacyVault,
    password: &str,
) -> Result<(WalletDocument, EncryptedVault)> {
    let document = decrypt_legacy(vault, password)?;
    let upgraded = encrypt_vault(&document, password)?;
    tracing::info!(version = VAULT_VERSION, "migrated legacy vault format");
    Ok((document, upgraded))
}

fn unix_timestamp() -> Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Unknown(e.to_string()))
}

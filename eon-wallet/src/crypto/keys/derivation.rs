//! Common key derivation functionality
//!
//! Both networks derive ed25519 keypairs through the same hardened
//! SLIP-0010 chain; they differ only in coin type and path depth.

use std::fmt;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Index bit marking a hardened derivation step
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// Supported key types
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum KeyType {
    /// EON native network
    Eon,
    /// Solana (secondary network)
    Solana,
}

/// A private key for a specific network.
///
/// Key material is zeroized when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    /// The raw private key bytes
    bytes: Vec<u8>,
    /// The type of key
    #[zeroize(skip)]
    key_type: KeyType,
}

impl PrivateKey {
    /// Create a new private key from bytes
    pub fn new(bytes: Vec<u8>, key_type: KeyType) -> Self {
        Self { bytes, key_type }
    }

    /// Get the raw private key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the key type
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bytes", &"<redacted>")
            .field("key_type", &self.key_type)
            .finish()
    }
}

/// A public key for a specific network
#[derive(Debug, Clone)]
pub struct PublicKey {
    /// The raw public key bytes
    bytes: Vec<u8>,
    /// The type of key
    key_type: KeyType,
}

impl PublicKey {
    /// Create a new public key from bytes
    pub fn new(bytes: Vec<u8>, key_type: KeyType) -> Self {
        Self { bytes, key_type }
    }

    /// Get the raw public key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the key type
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }
}

/// A key pair for a specific network
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// The private key
    private_key: PrivateKey,
    /// The public key
    public_key: PublicKey,
    /// The derivation path the pair was produced from
    path: String,
}

impl KeyPair {
    /// Create a new key pair
    pub fn new(private_key: PrivateKey, public_key: PublicKey, path: String) -> Result<Self> {
        if private_key.key_type() != public_key.key_type() {
            return Err(Error::KeyDerivation("Key type mismatch".to_string()));
        }
        Ok(Self {
            private_key,
            public_key,
            path,
        })
    }

    /// Get the private key
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// Get the public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Get the key type
    pub fn key_type(&self) -> KeyType {
        self.private_key.key_type()
    }

    /// Get the derivation path
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Derive a key pair from a seed for a specific network and account index
pub fn derive_key_pair(seed: &[u8], key_type: KeyType, account_index: u32) -> Result<KeyPair> {
    match key_type {
        KeyType::Eon => crate::crypto::keys::eon::derive_eon_key_pair(seed, account_index),
        KeyType::Solana => crate::crypto::keys::solana::derive_solana_key_pair(seed, account_index),
    }
}

/// Parse a derivation path of the form `m/44'/501'/0'/0'`.
///
/// Every component must be hardened: ed25519 derivation has no public
/// parent-to-child step, and unhardened indices would also reopen
/// public-key-only derivation attacks.
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>> {
    if !path.starts_with("m/") {
        return Err(Error::KeyDerivation(format!(
            "Invalid derivation path: {}",
            path
        )));
    }

    let components = path.trim_start_matches("m/").split('/');
    let mut result = Vec::new();

    for component in components {
        if component.is_empty() {
            continue;
        }

        if !component.ends_with('\'') {
            return Err(Error::KeyDerivation(format!(
                "non-hardened component not allowed: {}",
                component
            )));
        }

        let index = component
            .trim_end_matches('\'')
            .parse::<u32>()
            .map_err(|_| {
                Error::KeyDerivation(format!("Invalid derivation path component: {}", component))
            })?;
        if index >= HARDENED_OFFSET {
            return Err(Error::KeyDerivation(format!(
                "index out of range: {}",
                index
            )));
        }

        result.push(HARDENED_OFFSET + index);
    }

    Ok(result)
}

/// Derive the master key from a seed
pub fn derive_master_key(seed: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(b"ed25519 seed")
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(seed);
    let result = hmac.finalize().into_bytes();

    split_hash_output(&result)
}

/// Derive a child key from a parent key.
///
/// Only hardened derivation is supported; a non-hardened index is an error,
/// never a silent substitution.
pub fn derive_child_key(
    parent_key: [u8; 32],
    parent_chain_code: [u8; 32],
    index: u32,
) -> Result<([u8; 32], [u8; 32])> {
    if index < HARDENED_OFFSET {
        return Err(Error::KeyDerivation(format!(
            "ed25519 derivation requires hardened indices, got {}",
            index
        )));
    }

    let mut data = Vec::with_capacity(37);
    data.push(0);
    data.extend_from_slice(&parent_key);
    data.extend_from_slice(&index.to_be_bytes());

    let mut hmac = <Hmac<Sha512> as KeyInit>::new_from_slice(&parent_chain_code)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(&data);
    let result = hmac.finalize().into_bytes();

    split_hash_output(&result)
}

/// Derive the (key, chain code) pair at the end of a hardened path
pub fn derive_path(seed: &[u8], path: &[u32]) -> Result<([u8; 32], [u8; 32])> {
    let (mut secret_key, mut chain_code) = derive_master_key(seed)?;

    for &index in path {
        (secret_key, chain_code) = derive_child_key(secret_key, chain_code, index)?;
    }

    Ok((secret_key, chain_code))
}

fn split_hash_output(bytes: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let key: [u8; 32] = bytes
        .get(0..32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::KeyDerivation("malformed hash output".to_string()))?;
    let chain_code: [u8; 32] = bytes
        .get(32..64)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::KeyDerivation("malformed hash output".to_string()))?;

    Ok((key, chain_code))
}

/// Check that an account index is a plain 31-bit value before hardening
pub fn check_account_index(account_index: u32) -> Result<()> {
    if account_index >= HARDENED_OFFSET {
        return Err(Error::InvalidInput(format!(
            "account index must be below 2^31, got {}",
            account_index
        )));
    }
    Ok(())
}

//! Wallet implementation

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::activation::ActivationRecord;
use crate::crypto::keys::{derive_key_pair, KeyPair, KeyType};
use crate::crypto::mnemonic::{generate_mnemonic, mnemonic_to_seed, validate_mnemonic, MnemonicStrength};
use crate::error::{Error, Result};

use super::address::{derive_eon_address, derive_solana_address, Address};

/// The document the vault encrypts: everything needed to rebuild a wallet.
///
/// The mnemonic only ever exists in plaintext inside this in-memory value
/// while the session is unlocked; it is zeroized on drop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletDocument {
    /// The wallet's unique identifier
    pub id: String,
    /// The wallet's name
    pub name: String,
    /// The mnemonic phrase
    pub mnemonic: String,
    /// Account indices the wallet has derived
    pub account_indices: Vec<u32>,
    /// Activation record, if a capability has been activated
    pub activation: Option<ActivationRecord>,
    /// The timestamp when the wallet was created
    pub created_at: u64,
}

impl WalletDocument {
    /// Create a new wallet document with a generated mnemonic
    pub fn create(name: String) -> Result<Self> {
        let mnemonic = generate_mnemonic(MnemonicStrength::Words12)?;
        Ok(Self {
            id: new_wallet_id(),
            name,
            mnemonic,
            account_indices: vec![0],
            activation: None,
            created_at: unix_timestamp()?,
        })
    }

    /// Create a wallet document from an existing mnemonic
    pub fn import(name: String, mnemonic: &str) -> Result<Self> {
        validate_mnemonic(mnemonic)?;
        Ok(Self {
            id: new_wallet_id(),
            name,
            mnemonic: mnemonic.to_string(),
            account_indices: vec![0],
            activation: None,
            created_at: unix_timestamp()?,
        })
    }

    /// Reserve the next account index and return it
    pub fn add_account(&mut self) -> u32 {
        let next = self
            .account_indices
            .iter()
            .max()
            .map(|i| i + 1)
            .unwrap_or(0);
        self.account_indices.push(next);
        next
    }
}

impl Drop for WalletDocument {
    fn drop(&mut self) {
        self.mnemonic.zeroize();
    }
}

/// An account with its keys and addresses on both networks
#[derive(Debug, Clone)]
pub struct WalletAccount {
    /// Account index within the wallet
    pub index: u32,
    /// EON network key pair
    pub eon: KeyPair,
    /// Solana network key pair
    pub solana: KeyPair,
    /// EON network address
    pub eon_address: Address,
    /// Solana network address
    pub solana_address: Address,
}

/// An unlocked wallet holding derived key material.
///
/// Owned exclusively by the session while unlocked; dropping it zeroizes
/// every private key.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The wallet's unique identifier
    id: String,
    /// The wallet's name
    name: String,
    /// Derived accounts
    accounts: Vec<WalletAccount>,
    /// Activation record, if a capability has been activated
    activation: Option<ActivationRecord>,
    /// The timestamp when the wallet was created
    created_at: u64,
}

impl Wallet {
    /// Rebuild a wallet from its persisted document, deriving all accounts
    pub fn from_document(document: &WalletDocument, passphrase: Option<&str>) -> Result<Self> {
        let seed = mnemonic_to_seed(&document.mnemonic, passphrase)?;

        let mut accounts = Vec::with_capacity(document.account_indices.len());
        for &index in &document.account_indices {
            accounts.push(derive_account(&seed, index)?);
        }

        Ok(Self {
            id: document.id.clone(),
            name: document.name.clone(),
            accounts,
            activation: document.activation.clone(),
            created_at: document.created_at,
        })
    }

    /// Get the wallet's ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the wallet's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the wallet's accounts
    pub fn accounts(&self) -> &[WalletAccount] {
        &self.accounts
    }

    /// Get an account by index
    pub fn account(&self, index: u32) -> Result<&WalletAccount> {
        self.accounts
            .iter()
            .find(|a| a.index == index)
            .ok_or_else(|| Error::InvalidInput(format!("no account with index {}", index)))
    }

    /// Get the activation record, if any
    pub fn activation(&self) -> Option<&ActivationRecord> {
        self.activation.as_ref()
    }

    /// Record an issued activation
    pub fn set_activation(&mut self, record: ActivationRecord) -> Result<()> {
        if self.activation.is_some() {
            return Err(Error::AlreadyActivated(
                "wallet already holds an activation record".to_string(),
            ));
        }
        self.activation = Some(record);
        Ok(())
    }

    /// Get the wallet's creation timestamp
    pub fn created_at(&self) -> u64 {
        self.created_at
    }
}

fn derive_account(seed: &[u8], index: u32) -> Result<WalletAccount> {
    let eon = derive_key_pair(seed, KeyType::Eon, index)?;
    let solana = derive_key_pair(seed, KeyType::Solana, index)?;

    let eon_address = derive_eon_address(eon.public_key(), eon.path())?;
    let solana_address = derive_solana_address(solana.public_key(), solana.path())?;

    Ok(WalletAccount {
        index,
        eon,
        solana,
        eon_address,
        solana_address,
    })
}

fn new_wallet_id() -> String {
    format!("wallet_{}", hex::encode(rand::random::<[u8; 8]>()))
}

fn unix_timestamp() -> Result<u64> {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| Error::Unknown(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_wallet_creation() {
        let document = WalletDocument::create("Test Wallet".to_string()).unwrap();

        assert_eq!(document.name, "Test Wallet");
        assert_eq!(document.account_indices, vec![0]);
        assert!(validate_mnemonic(&document.mnemonic).is_ok());

        let wallet = Wallet::from_document(&document, None).unwrap();
        assert_eq!(wallet.accounts().len(), 1);
        assert!(wallet.activation().is_none());
    }

    #[test]
    fn test_wallet_import_rejects_bad_mnemonic() {
        let invalid = "invalid mnemonic phrase test test test test test test test test test";
        assert!(WalletDocument::import("Imported".to_string(), invalid).is_err());
    }

    #[test]
    fn test_addresses_are_reproducible() {
        let document = WalletDocument::import("Imported".to_string(), MNEMONIC).unwrap();

        let a = Wallet::from_document(&document, None).unwrap();
        let b = Wallet::from_document(&document, None).unwrap();

        assert_eq!(
            a.accounts()[0].eon_address.as_str(),
            b.accounts()[0].eon_address.as_str()
        );
        assert_eq!(
            a.accounts()[0].solana_address.as_str(),
            b.accounts()[0].solana_address.as_str()
        );
    }

    #[test]
    fn test_add_account_diverges() {
        let mut document = WalletDocument::import("Imported".to_string(), MNEMONIC).unwrap();
        assert_eq!(document.add_account(), 1);

        let wallet = Wallet::from_document(&document, None).unwrap();
        assert_eq!(wallet.accounts().len(), 2);
        assert_ne!(
            wallet.accounts()[0].solana_address.as_str(),
            wallet.accounts()[1].solana_address.as_str()
        );
        assert_ne!(
            wallet.accounts()[0].eon_address.as_str(),
            wallet.accounts()[1].eon_address.as_str()
        );
    }

    #[test]
    fn test_one_activation_per_wallet() {
        let document = WalletDocument::import("Imported".to_string(), MNEMONIC).unwrap();
        let mut wallet = Wallet::from_document(&document, None).unwrap();

        let record = ActivationRecord {
            capability: crate::activation::CapabilityType::Full,
            phase: 1,
            proof_tx: "sig".to_string(),
            code: "code".to_string(),
            timestamp: 0,
        };
        wallet.set_activation(record.clone()).unwrap();
        assert!(matches!(
            wallet.set_activation(record),
            Err(Error::AlreadyActivated(_))
        ));
    }
}

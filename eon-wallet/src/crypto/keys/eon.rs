//! EON native network key derivation

use ed25519_dalek::{SigningKey, VerifyingKey};

use super::derivation::{
    check_account_index, derive_path, KeyPair, KeyType, PrivateKey, PublicKey, HARDENED_OFFSET,
};
use crate::error::Result;

/// Coin type constant for the EON network
pub const EON_COIN_TYPE: u32 = 4750;

/// Derive an EON key pair from a seed and account index.
///
/// Uses the fixed five-level hardened path
/// `m/44'/4750'/{account}'/0'/0'`. The chain is standard SLIP-0010
/// ed25519, so any compliant implementation given the same coin type and
/// path reproduces the same keys bit for bit.
pub fn derive_eon_key_pair(seed: &[u8], account_index: u32) -> Result<KeyPair> {
    check_account_index(account_index)?;

    let path = [
        HARDENED_OFFSET + 44,
        HARDENED_OFFSET + EON_COIN_TYPE,
        HARDENED_OFFSET + account_index,
        HARDENED_OFFSET,
        HARDENED_OFFSET,
    ];
    let (secret_key, _chain_code) = derive_path(seed, &path)?;

    let signing_key = SigningKey::from_bytes(&secret_key);
    let verifying_key = VerifyingKey::from(&signing_key);

    let private_key = PrivateKey::new(signing_key.to_bytes().to_vec(), KeyType::Eon);
    let public_key = PublicKey::new(verifying_key.to_bytes().to_vec(), KeyType::Eon);

    KeyPair::new(
        private_key,
        public_key,
        format!("m/44'/{}'/{}'/0'/0'", EON_COIN_TYPE, account_index),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::mnemonic::mnemonic_to_seed;

    #[test]
    fn test_derivation_is_deterministic() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = mnemonic_to_seed(mnemonic, None).unwrap();

        let a = derive_eon_key_pair(&seed, 0).unwrap();
        let b = derive_eon_key_pair(&seed, 0).unwrap();
        assert_eq!(a.public_key().as_bytes(), b.public_key().as_bytes());
        assert_eq!(a.private_key().as_bytes(), b.private_key().as_bytes());
        assert_eq!(a.path(), "m/44'/4750'/0'/0'/0'");
    }

    #[test]
    fn test_accounts_diverge() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = mnemonic_to_seed(mnemonic, None).unwrap();

        let a = derive_eon_key_pair(&seed, 0).unwrap();
        let b = derive_eon_key_pair(&seed, 1).unwrap();
        assert_ne!(a.public_key().as_bytes(), b.public_key().as_bytes());
    }

    #[test]
    fn test_rejects_hardened_account_index() {
        let seed = [7u8; 64];
        assert!(derive_eon_key_pair(&seed, 0x8000_0000).is_err());
    }
}

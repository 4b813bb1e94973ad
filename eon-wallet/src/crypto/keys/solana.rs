//! Solana (secondary network) key derivation

use ed25519_dalek::{SigningKey, VerifyingKey};

use super::derivation::{
    check_account_index, derive_path, parse_derivation_path, KeyPair, KeyType, PrivateKey,
    PublicKey, HARDENED_OFFSET,
};
use crate::error::{Error, Result};

/// Coin type constant for Solana
pub const SOLANA_COIN_TYPE: u32 = 501;

/// Derive a Solana key pair from a seed and account index.
///
/// Uses the four-level hardened path `m/44'/501'/{account}'/0'` shared by
/// third-party wallets on the network, so imported accounts line up with
/// what those wallets display.
pub fn derive_solana_key_pair(seed: &[u8], account_index: u32) -> Result<KeyPair> {
    check_account_index(account_index)?;

    let path = [
        HARDENED_OFFSET + 44,
        HARDENED_OFFSET + SOLANA_COIN_TYPE,
        HARDENED_OFFSET + account_index,
        HARDENED_OFFSET,
    ];
    key_pair_at(seed, &path, format!("m/44'/{}'/{}'/0'", SOLANA_COIN_TYPE, account_index))
}

/// Derive a Solana key pair at an explicit hardened derivation path
pub fn derive_solana_key_pair_at_path(seed: &[u8], path: &str) -> Result<KeyPair> {
    let components = parse_derivation_path(path)?;
    key_pair_at(seed, &components, path.to_string())
}

fn key_pair_at(seed: &[u8], path: &[u32], path_string: String) -> Result<KeyPair> {
    let (secret_key, _chain_code) = derive_path(seed, path)?;

    let signing_key = SigningKey::from_bytes(&secret_key);
    let verifying_key = VerifyingKey::from(&signing_key);

    let private_key = PrivateKey::new(signing_key.to_bytes().to_vec(), KeyType::Solana);
    let public_key = PublicKey::new(verifying_key.to_bytes().to_vec(), KeyType::Solana);

    KeyPair::new(private_key, public_key, path_string)
}

/// Get the Solana address from a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Result<String> {
    if public_key.key_type() != KeyType::Solana {
        return Err(Error::KeyDerivation("Not a Solana public key".to_string()));
    }

    let public_key = public_key.as_bytes();

    // The public key should be 32 bytes
    if public_key.len() != 32 {
        return Err(Error::KeyDerivation(
            "Invalid Solana public key length".to_string(),
        ));
    }

    Ok(bs58::encode(public_key).into_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::mnemonic::mnemonic_to_seed;

    #[test]
    fn test_explicit_path_matches_account_helper() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = mnemonic_to_seed(mnemonic, None).unwrap();

        let by_index = derive_solana_key_pair(&seed, 3).unwrap();
        let by_path = derive_solana_key_pair_at_path(&seed, "m/44'/501'/3'/0'").unwrap();
        assert_eq!(
            by_index.public_key().as_bytes(),
            by_path.public_key().as_bytes()
        );
    }

    #[test]
    fn test_address_is_base58_of_public_key() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = mnemonic_to_seed(mnemonic, None).unwrap();

        let pair = derive_solana_key_pair(&seed, 0).unwrap();
        let address = public_key_to_address(pair.public_key()).unwrap();
        assert_eq!(
            bs58::decode(&address).into_vec().unwrap(),
            pair.public_key().as_bytes()
        );
    }
}

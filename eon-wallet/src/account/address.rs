//! Address management

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::keys::{KeyType, PublicKey};
use crate::error::{Error, Result};

/// Separator between the two hash parts of an EON address
pub const EON_MARKER: &str = "eon";

/// Domain string for the legacy address fallback
const LEGACY_DOMAIN: &str = "eonlegacy";

/// Modern EON address layout: 19 + 3 + 15 + 4 characters
const EON_ADDRESS_LEN: usize = 41;
/// Legacy EON address layout: 8 + 3 + 8 + 4 characters
const EON_LEGACY_ADDRESS_LEN: usize = 23;

/// A network address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// The address string in the network's native format
    pub address: String,
    /// The type of network this address is for
    pub key_type: KeyType,
    /// The derivation path used to generate this address
    pub path: String,
}

impl Address {
    /// Create a new address
    pub fn new(address: String, key_type: KeyType, path: String) -> Self {
        Self {
            address,
            key_type,
            path,
        }
    }

    /// Get the address string
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// Get the key type
    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Get the derivation path
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn eon_checksum(part1: &str, part2: &str) -> String {
    let digest = Sha256::digest(format!("{}{}{}", part1, EON_MARKER, part2).as_bytes());
    hex::encode(digest)[..4].to_string()
}

/// Encode a public key as an EON address.
///
/// Layout: `{19 hex}eon{15 hex}{4 hex checksum}`, where the hex parts are
/// consecutive substrings of the SHA-256 digest of the public key and the
/// checksum hashes `part1 ∥ "eon" ∥ part2`. Pure function of the key.
pub fn encode_eon_address(public_key: &PublicKey) -> Result<String> {
    if public_key.key_type() != KeyType::Eon {
        return Err(Error::Address("Not an EON public key".to_string()));
    }

    let digest_hex = hex::encode(Sha256::digest(public_key.as_bytes()));
    let part1 = &digest_hex[0..19];
    let part2 = &digest_hex[19..34];
    let checksum = eon_checksum(part1, part2);

    Ok(format!("{}{}{}{}", part1, EON_MARKER, part2, checksum))
}

/// Verify an EON address.
///
/// Accepts both the modern 41-character layout and the legacy 23-character
/// `{8}eon{8}{4}` layout; rejects anything whose checksum does not
/// recompute.
pub fn verify_eon_address(address: &str) -> Result<()> {
    decode_eon_address(address).map(|_| ())
}

/// Decode an EON address into its two hash parts, recomputing the checksum
pub fn decode_eon_address(address: &str) -> Result<(String, String)> {
    if !address.is_ascii() {
        return Err(Error::Address("address is not ASCII".to_string()));
    }

    let (part1, marker, part2, checksum) = match address.len() {
        EON_ADDRESS_LEN => (
            &address[0..19],
            &address[19..22],
            &address[22..37],
            &address[37..41],
        ),
        EON_LEGACY_ADDRESS_LEN => (
            &address[0..8],
            &address[8..11],
            &address[11..19],
            &address[19..23],
        ),
        other => {
            return Err(Error::Address(format!(
                "invalid address length: {}",
                other
            )))
        }
    };

    if marker != EON_MARKER {
        return Err(Error::Address("missing eon marker".to_string()));
    }

    let is_lower_hex = |s: &str| {
        s.chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    };
    if !is_lower_hex(part1) || !is_lower_hex(part2) || !is_lower_hex(checksum) {
        return Err(Error::Address("non-hex address part".to_string()));
    }

    if eon_checksum(part1, part2) != checksum {
        return Err(Error::Address("checksum mismatch".to_string()));
    }

    Ok((part1.to_string(), part2.to_string()))
}

/// Encode a public key as a Solana address (base58 over the raw bytes)
pub fn encode_solana_address(public_key: &PublicKey) -> Result<String> {
    crate::crypto::keys::solana::public_key_to_address(public_key)
}

/// Derive a legacy EON address from a Solana address.
///
/// One-way display fallback for wallets imported without seed material:
/// hashes the Solana address under a fixed domain string and renders the
/// legacy `{8}eon{8}{4}` layout. Never a source of spending keys.
pub fn legacy_eon_from_solana(solana_address: &str) -> String {
    let digest_hex = hex::encode(Sha256::digest(
        format!("{}{}", solana_address, LEGACY_DOMAIN).as_bytes(),
    ));
    let part1 = &digest_hex[0..8];
    let part2 = &digest_hex[8..16];
    let checksum = eon_checksum(part1, part2);

    format!("{}{}{}{}", part1, EON_MARKER, part2, checksum)
}

/// Derive an EON address from a public key
pub fn derive_eon_address(public_key: &PublicKey, path: &str) -> Result<Address> {
    let address = encode_eon_address(public_key)?;
    Ok(Address::new(address, KeyType::Eon, path.to_string()))
}

/// Derive a Solana address from a public key
pub fn derive_solana_address(public_key: &PublicKey, path: &str) -> Result<Address> {
    if public_key.key_type() != KeyType::Solana {
        return Err(Error::Address("Not a Solana public key".to_string()));
    }

    let address = encode_solana_address(public_key)?;
    Ok(Address::new(address, KeyType::Solana, path.to_string()))
}

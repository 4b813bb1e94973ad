//! Mnemonic phrase generation and handling

use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use crate::error::{Error, Result};

/// Supported mnemonic strengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MnemonicStrength {
    /// 12 words (128 bits)
    Words12,
    /// 15 words (160 bits)
    Words15,
    /// 18 words (192 bits)
    Words18,
    /// 21 words (224 bits)
    Words21,
    /// 24 words (256 bits)
    Words24,
}

impl MnemonicStrength {
    /// Get entropy length in bytes
    fn entropy_bytes(&self) -> usize {
        match self {
            Self::Words12 => 16,
            Self::Words15 => 20,
            Self::Words18 => 24,
            Self::Words21 => 28,
            Self::Words24 => 32,
        }
    }

    /// Get the number of words this strength produces
    pub fn word_count(&self) -> usize {
        match self {
            Self::Words12 => 12,
            Self::Words15 => 15,
            Self::Words18 => 18,
            Self::Words21 => 21,
            Self::Words24 => 24,
        }
    }

    /// Map a word count to a strength
    pub fn from_word_count(count: usize) -> Result<Self> {
        match count {
            12 => Ok(Self::Words12),
            15 => Ok(Self::Words15),
            18 => Ok(Self::Words18),
            21 => Ok(Self::Words21),
            24 => Ok(Self::Words24),
            other => Err(Error::InvalidMnemonic(format!(
                "invalid word count: {}",
                other
            ))),
        }
    }
}

/// Generate a new random mnemonic phrase with the specified strength.
///
/// Entropy comes from the operating system CSPRNG only. An unavailable
/// entropy source is a hard error, never a degraded fallback.
pub fn generate_mnemonic(strength: MnemonicStrength) -> Result<String> {
    let mut entropy = vec![0u8; strength.entropy_bytes()];
    OsRng
        .try_fill_bytes(&mut entropy)
        .map_err(|e| Error::EntropySource(e.to_string()))?;

    let mnemonic = Mnemonic::from_entropy(&entropy).map_err(map_mnemonic_error)?;

    Ok(mnemonic.to_string())
}

/// Validate a mnemonic phrase and return the entropy it encodes.
///
/// The checksum is re-derived from the claimed entropy bits (checksum length
/// is `entropy_bits / 32`) and compared against the embedded checksum.
pub fn validate_mnemonic(phrase: &str) -> Result<Vec<u8>> {
    let mnemonic = Mnemonic::parse_normalized(phrase).map_err(map_mnemonic_error)?;
    MnemonicStrength::from_word_count(mnemonic.word_count())?;
    Ok(mnemonic.to_entropy())
}

/// Generate a seed from a mnemonic phrase and optional passphrase.
///
/// Deterministic BIP39 stretch: PBKDF2-HMAC-SHA512, 2048 iterations, salt
/// `"mnemonic" + passphrase`. Same inputs always produce the same 64-byte
/// seed; address reproducibility depends on it.
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> Result<Vec<u8>> {
    let mnemonic = Mnemonic::parse_normalized(phrase).map_err(map_mnemonic_error)?;
    MnemonicStrength::from_word_count(mnemonic.word_count())?;

    let seed = mnemonic.to_seed(passphrase.unwrap_or(""));
    Ok(seed.to_vec())
}

fn map_mnemonic_error(e: bip39::Error) -> Error {
    match e {
        bip39::Error::BadWordCount(count) => {
            Error::InvalidMnemonic(format!("invalid word count: {}", count))
        }
        bip39::Error::UnknownWord(index) => {
            Error::InvalidMnemonic(format!("unknown word at position {}", index))
        }
        bip39::Error::BadEntropyBitCount(bits) => {
            Error::InvalidMnemonic(format!("invalid entropy bit count: {}", bits))
        }
        bip39::Error::InvalidChecksum => Error::InvalidMnemonic("checksum mismatch".to_string()),
        bip39::Error::AmbiguousLanguages(_) => {
            Error::InvalidMnemonic("ambiguous wordlist language".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_mnemonic_all_strengths() {
        for strength in [
            MnemonicStrength::Words12,
            MnemonicStrength::Words15,
            MnemonicStrength::Words18,
            MnemonicStrength::Words21,
            MnemonicStrength::Words24,
        ] {
            let mnemonic = generate_mnemonic(strength).unwrap();
            let entropy = validate_mnemonic(&mnemonic).unwrap();

            let words: Vec<&str> = mnemonic.split_whitespace().collect();
            assert_eq!(words.len(), strength.word_count());
            assert_eq!(entropy.len(), strength.entropy_bytes());
        }
    }

    #[test]
    fn test_validate_mnemonic() {
        let valid = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let entropy = validate_mnemonic(valid).unwrap();
        assert_eq!(entropy, vec![0u8; 16]);

        // all-abandon phrase carries a wrong checksum
        let bad_checksum = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(matches!(
            validate_mnemonic(bad_checksum),
            Err(Error::InvalidMnemonic(_))
        ));

        let unknown_word = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon zebra7";
        assert!(validate_mnemonic(unknown_word).is_err());

        let bad_count = "abandon abandon abandon";
        assert!(validate_mnemonic(bad_count).is_err());
    }

    #[test]
    fn test_mnemonic_to_seed() {
        let mnemonic = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let seed = mnemonic_to_seed(mnemonic, None).unwrap();

        assert_eq!(seed.len(), 64);
        // deterministic across calls
        assert_eq!(seed, mnemonic_to_seed(mnemonic, None).unwrap());
        // passphrase changes the seed
        assert_ne!(seed, mnemonic_to_seed(mnemonic, Some("TREZOR")).unwrap());
    }
}

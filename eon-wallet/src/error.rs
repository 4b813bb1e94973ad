//! Error types for the wallet core library

use thiserror::Error;

/// Custom error type for wallet core operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Entropy source unavailable: {0}")]
    EntropySource(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Address error: {0}")]
    Address(String),

    /// Vault decryption failed. A wrong password, a tampered ciphertext and
    /// an unparseable plaintext all collapse into this variant so callers
    /// cannot distinguish them.
    #[error("Wrong password")]
    WrongPassword,

    #[error("Session locked")]
    SessionLocked,

    /// The persisted vault record itself is malformed.
    #[error("Vault error: {0}")]
    Vault(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Already activated: {0}")]
    AlreadyActivated(String),

    #[error("Proof unconfirmed: {0}")]
    ProofUnconfirmed(String),

    #[error("Server rejected activation code request: {0}")]
    ServerRejectedCode(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Chain error: {0}")]
    Chain(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type for wallet core operations
pub type Result<T> = std::result::Result<T, Error>;

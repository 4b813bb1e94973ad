//! EON Wallet Core - dual-network wallet and node activation SDK
//!
//! This library provides the cryptographic and state-management core of the
//! EON wallet: mnemonic generation, per-network key derivation, address
//! encoding, encrypted vault persistence, and the client side of the node
//! activation protocol.

pub mod error;
pub mod crypto;
pub mod account;
pub mod vault;
pub mod activation;
pub mod chain;

// Re-export commonly used types for convenience
pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

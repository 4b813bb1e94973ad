//! Key derivation and management
//!
//! This module provides functionality for deriving and managing keys for
//! the two supported networks.

pub mod eon;
pub mod solana;
mod derivation;

pub use derivation::*;

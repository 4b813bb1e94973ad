//! Node activation protocol
//!
//! This module provides the client side of the multi-phase activation
//! protocol: pricing quotes, burn-proof verification, and the state machine
//! that requests and stores server-issued activation codes.

mod client;
mod pricing;

pub use client::*;
pub use pricing::*;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The class of network participation right being activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityType {
    /// Light node
    Light,
    /// Full node
    Full,
    /// Super node
    Super,
}

impl CapabilityType {
    /// Name used in REST paths and memo tags
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Full => "full",
            Self::Super => "super",
        }
    }

    /// Parse the capability tag out of a burn memo such as `node:full`
    pub fn from_memo(memo: &str) -> Option<Self> {
        match memo.trim().strip_prefix("node:")? {
            "light" => Some(Self::Light),
            "full" => Some(Self::Full),
            "super" => Some(Self::Super),
            _ => None,
        }
    }
}

/// Activation state machine.
///
/// `NoActivation → ProofSubmitted → CodeRequested → Activated`; once a code
/// has been issued the wallet can never re-enter `NoActivation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationState {
    /// No burn proof has been recorded
    NoActivation,
    /// A burn/transfer proof is confirmed on chain
    ProofSubmitted {
        proof_tx: String,
        capability: CapabilityType,
        phase: u8,
    },
    /// A code request round-trip is in flight
    CodeRequested {
        proof_tx: String,
        capability: CapabilityType,
        phase: u8,
    },
    /// A signed activation code has been issued and stored
    Activated { record: ActivationRecord },
}

/// A completed activation. Stored inside the encrypted wallet document, so
/// the issued code is never persisted in the clear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// Activated capability type
    pub capability: CapabilityType,
    /// Protocol phase the activation happened in
    pub phase: u8,
    /// Transaction reference evidencing the burn or pool transfer
    pub proof_tx: String,
    /// Server-issued activation code
    pub code: String,
    /// Issuance timestamp
    pub timestamp: u64,
}

/// Activation metadata as served by the bootstrap nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationMetadata {
    pub timestamp: u64,
    pub signature: String,
    pub burn_tx_hash: String,
    pub node_type: CapabilityType,
    pub phase: u8,
    pub wallet_address: String,
}

impl ActivationMetadata {
    /// Rebuild a local activation record from chain-side metadata
    pub fn to_record(&self) -> ActivationRecord {
        ActivationRecord {
            capability: self.node_type,
            phase: self.phase,
            proof_tx: self.burn_tx_hash.clone(),
            code: self.signature.clone(),
            timestamp: self.timestamp,
        }
    }
}

/// On-chain figures a quote is computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStats {
    /// Cumulative burned amount of the capability token, in base units
    pub burned: u64,
    /// Total supply of the capability token, in base units
    pub supply: u64,
    /// Current number of active nodes
    pub active_nodes: u64,
}

/// Currency a quote is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyKind {
    /// The SPL capability token on the secondary network
    Token,
    /// The native EON coin
    Native,
}

/// Mechanism by which the activation cost is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationMechanism {
    /// Phase 1: on-chain burn of the capability token
    Burn,
    /// Phase 2: transfer into the activation pool
    PoolTransfer,
}

/// Inputs a quote was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteBasis {
    BurnRatio { burned: u64, supply: u64 },
    NetworkSize { active_nodes: u64 },
}

/// An advisory activation price.
///
/// Never persisted as authoritative; the server/chain price check decides,
/// and a disagreement is retryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingQuote {
    /// Cost in base units of `currency`
    pub cost: u64,
    /// Denominating currency
    pub currency: CurrencyKind,
    /// Protocol phase the quote applies to
    pub phase: u8,
    /// Payment mechanism for this phase
    pub mechanism: ActivationMechanism,
    /// Inputs the quote was computed from
    pub computed_from: QuoteBasis,
}

/// Map a mismatched capability tag onto the proof error
pub(crate) fn capability_mismatch(expected: CapabilityType, found: CapabilityType) -> Error {
    Error::ProofUnconfirmed(format!(
        "burn is tagged for {} but {} was requested",
        found.api_name(),
        expected.api_name()
    ))
}

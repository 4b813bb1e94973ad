//! Activation ledger client
//!
//! Drives the activation state machine against the bootstrap REST API and
//! the chain proof scanner. All state transitions happen under one lock so
//! concurrent callers serialize and observe each other's results.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::chain::ChainProofScanner;
use crate::error::{Error, Result};

use super::pricing::{activation_phase, compute_quote};
use super::{
    capability_mismatch, ActivationMetadata, ActivationRecord, ActivationState, CapabilityType,
    ChainStats, PricingQuote,
};

/// Request body for `POST /api/v1/generate-activation-code`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCodeRequest {
    pub wallet_address: String,
    pub solana_address: String,
    pub burn_tx_hash: String,
    pub node_type: CapabilityType,
    pub phase: u8,
}

/// Response body for `POST /api/v1/generate-activation-code`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationCodeResponse {
    pub code: String,
    pub signature: String,
    pub timestamp: u64,
}

/// Response body for `GET /api/v1/pricing/{type}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerPricing {
    pub node_type: CapabilityType,
    pub cost: u64,
    pub phase: u8,
}

/// Request body for `POST /api/v1/nodes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRegistration {
    pub wallet_address: String,
    pub node_type: CapabilityType,
    pub activation_code: String,
}

/// Request body for `POST /api/v1/rewards/claim`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsClaim {
    pub wallet_address: String,
    pub node_type: CapabilityType,
}

/// Response body for `POST /api/v1/rewards/claim`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardsClaimResponse {
    pub amount: u64,
    pub tx_hash: Option<String>,
}

/// Bootstrap node REST API
#[async_trait::async_trait]
pub trait BootstrapApi: Send + Sync {
    async fn generate_activation_code(
        &self,
        request: &ActivationCodeRequest,
    ) -> Result<ActivationCodeResponse>;

    async fn activations_by_wallet(&self, wallet_address: &str)
        -> Result<Vec<ActivationMetadata>>;

    async fn pricing(&self, node_type: CapabilityType) -> Result<ServerPricing>;

    async fn register_node(&self, registration: &NodeRegistration) -> Result<()>;

    async fn claim_rewards(&self, claim: &RewardsClaim) -> Result<RewardsClaimResponse>;
}

/// HTTP implementation of [`BootstrapApi`] with bootstrap-endpoint failover.
///
/// Transport failures and 5xx responses rotate to the next endpoint; a 4xx
/// response is an authoritative rejection and is returned immediately.
pub struct HttpBootstrapApi {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl HttpBootstrapApi {
    /// Create a client over a list of bootstrap base URLs
    pub fn new(endpoints: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { endpoints, client }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let mut last = Error::NetworkUnavailable("no bootstrap endpoints configured".to_string());

        for base in &self.endpoints {
            let url = format!("{}{}", base, path);
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json()
                        .await
                        .map_err(|e| Error::Serialization(e.to_string()));
                }
                Ok(response) => {
                    tracing::warn!(endpoint = %base, status = %response.status(), "bootstrap endpoint returned error status");
                    last = Error::NetworkUnavailable(format!(
                        "{} returned {}",
                        url,
                        response.status()
                    ));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %base, error = %e, "bootstrap endpoint unreachable");
                    last = Error::NetworkUnavailable(e.to_string());
                }
            }
        }

        Err(last)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let mut last = Error::NetworkUnavailable("no bootstrap endpoints configured".to_string());

        for base in &self.endpoints {
            let url = format!("{}{}", base, path);
            match self.client.post(&url).json(body).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json()
                        .await
                        .map_err(|e| Error::Serialization(e.to_string()));
                }
                Ok(response) if response.status().is_client_error() => {
                    let status = response.status();
                    let detail = response.text().await.unwrap_or_default();
                    return Err(Error::ServerRejectedCode(format!("{}: {}", status, detail)));
                }
                Ok(response) => {
                    tracing::warn!(endpoint = %base, status = %response.status(), "bootstrap endpoint returned error status");
                    last = Error::NetworkUnavailable(format!(
                        "{} returned {}",
                        url,
                        response.status()
                    ));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %base, error = %e, "bootstrap endpoint unreachable");
                    last = Error::NetworkUnavailable(e.to_string());
                }
            }
        }

        Err(last)
    }
}

#[async_trait::async_trait]
impl BootstrapApi for HttpBootstrapApi {
    async fn generate_activation_code(
        &self,
        request: &ActivationCodeRequest,
    ) -> Result<ActivationCodeResponse> {
        self.post_json("/api/v1/generate-activation-code", request)
            .await
    }

    async fn activations_by_wallet(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<ActivationMetadata>> {
        self.get_json(&format!(
            "/api/v1/activations/by-wallet?address={}",
            wallet_address
        ))
        .await
    }

    async fn pricing(&self, node_type: CapabilityType) -> Result<ServerPricing> {
        self.get_json(&format!("/api/v1/pricing/{}", node_type.api_name()))
            .await
    }

    async fn register_node(&self, registration: &NodeRegistration) -> Result<()> {
        let _: serde_json::Value = self.post_json("/api/v1/nodes", registration).await?;
        Ok(())
    }

    async fn claim_rewards(&self, claim: &RewardsClaim) -> Result<RewardsClaimResponse> {
        self.post_json("/api/v1/rewards/claim", claim).await
    }
}

/// Client-side driver of the activation protocol for one wallet
pub struct ActivationLedgerClient {
    api: Arc<dyn BootstrapApi>,
    scanner: ChainProofScanner,
    eon_address: String,
    solana_address: String,
    state: Mutex<ActivationState>,
}

impl ActivationLedgerClient {
    /// Create a client for a wallet, seeding the state machine from any
    /// previously stored activation record
    pub fn new(
        api: Arc<dyn BootstrapApi>,
        scanner: ChainProofScanner,
        eon_address: String,
        solana_address: String,
        existing: Option<ActivationRecord>,
    ) -> Self {
        let state = match existing {
            Some(record) => ActivationState::Activated { record },
            None => ActivationState::NoActivation,
        };
        Self {
            api,
            scanner,
            eon_address,
            solana_address,
            state: Mutex::new(state),
        }
    }

    /// Current state machine position
    pub async fn state(&self) -> ActivationState {
        self.state.lock().await.clone()
    }

    /// Compute an advisory quote from current chain figures
    pub fn quote(&self, capability: CapabilityType, stats: &ChainStats) -> PricingQuote {
        compute_quote(capability, stats)
    }

    /// Fetch the server-side price for a capability type
    pub async fn server_quote(&self, capability: CapabilityType) -> Result<ServerPricing> {
        self.api.pricing(capability).await
    }

    /// Check the wallet can cover a quote's cost in capability tokens and
    /// still pay transaction fees
    pub async fn ensure_funds(&self, quote: &PricingQuote) -> Result<()> {
        let available = self.scanner.token_balance(&self.solana_address).await?;
        if available < quote.cost {
            return Err(Error::InsufficientBalance(format!(
                "activation costs {} base units, wallet holds {}",
                quote.cost, available
            )));
        }
        let fee_balance = self.scanner.native_balance(&self.solana_address).await?;
        if fee_balance == 0 {
            return Err(Error::InsufficientBalance(
                "no native balance to pay transaction fees".to_string(),
            ));
        }
        Ok(())
    }

    /// Record a confirmed burn/transfer proof:
    /// `NoActivation → ProofSubmitted`.
    ///
    /// Verifies the transaction on chain and cross-checks the bootstrap
    /// nodes for an existing activation before accepting the proof.
    pub async fn submit_proof(
        &self,
        proof_tx: &str,
        capability: CapabilityType,
        stats: &ChainStats,
    ) -> Result<()> {
        let mut state = self.state.lock().await;

        match &*state {
            ActivationState::Activated { .. } | ActivationState::CodeRequested { .. } => {
                return Err(Error::AlreadyActivated(
                    "wallet already holds an activation".to_string(),
                ));
            }
            ActivationState::ProofSubmitted {
                proof_tx: existing, ..
            } => {
                if existing == proof_tx {
                    return Ok(());
                }
                return Err(Error::AlreadyActivated(
                    "a different proof is already pending".to_string(),
                ));
            }
            ActivationState::NoActivation => {}
        }

        let known = self.api.activations_by_wallet(&self.solana_address).await?;
        if !known.is_empty() {
            return Err(Error::AlreadyActivated(format!(
                "chain already records an activation for {}",
                self.solana_address
            )));
        }

        let proof = self.scanner.verify_burn(proof_tx).await?;
        if let Some(found) = proof.capability {
            if found != capability {
                return Err(capability_mismatch(capability, found));
            }
        }

        let phase = activation_phase(stats.burned, stats.supply);
        tracing::info!(proof_tx, capability = capability.api_name(), phase, "burn proof accepted");
        *state = ActivationState::ProofSubmitted {
            proof_tx: proof_tx.to_string(),
            capability,
            phase,
        };
        Ok(())
    }

    /// Request a signed activation code for the submitted proof:
    /// `ProofSubmitted → CodeRequested → Activated`.
    ///
    /// Idempotent: the state lock is held across the server round-trip, so
    /// a concurrent duplicate waits and then observes the stored record. A
    /// transport failure reverts to `ProofSubmitted` and stays retryable.
    pub async fn request_activation_code(&self) -> Result<ActivationRecord> {
        let mut state = self.state.lock().await;

        let (proof_tx, capability, phase) = match &*state {
            ActivationState::NoActivation => {
                return Err(Error::ProofUnconfirmed(
                    "no burn proof has been submitted".to_string(),
                ));
            }
            ActivationState::Activated { record } => return Ok(record.clone()),
            ActivationState::ProofSubmitted {
                proof_tx,
                capability,
                phase,
            }
            | ActivationState::CodeRequested {
                proof_tx,
                capability,
                phase,
            } => (proof_tx.clone(), *capability, *phase),
        };

        *state = ActivationState::CodeRequested {
            proof_tx: proof_tx.clone(),
            capability,
            phase,
        };

        let request = ActivationCodeRequest {
            wallet_address: self.eon_address.clone(),
            solana_address: self.solana_address.clone(),
            burn_tx_hash: proof_tx.clone(),
            node_type: capability,
            phase,
        };

        match self.api.generate_activation_code(&request).await {
            Ok(response) => {
                let record = ActivationRecord {
                    capability,
                    phase,
                    proof_tx,
                    code: response.code,
                    timestamp: response.timestamp,
                };
                tracing::info!(capability = capability.api_name(), phase, "activation code issued");
                *state = ActivationState::Activated {
                    record: record.clone(),
                };
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(error = %e, "activation code request failed, proof remains retryable");
                *state = ActivationState::ProofSubmitted {
                    proof_tx,
                    capability,
                    phase,
                };
                Err(e)
            }
        }
    }

    /// Reconcile local state against the chain.
    ///
    /// A chain-side activation missing locally is repaired from the served
    /// metadata; a local record the chain does not know is kept and logged.
    pub async fn sync_with_chain(&self) -> Result<ActivationState> {
        let known = self.api.activations_by_wallet(&self.solana_address).await?;
        let mut state = self.state.lock().await;

        match (known.first(), &*state) {
            (Some(meta), ActivationState::Activated { record }) => {
                if record.proof_tx != meta.burn_tx_hash {
                    tracing::warn!(
                        local = %record.proof_tx,
                        chain = %meta.burn_tx_hash,
                        "local activation disagrees with chain, adopting chain record"
                    );
                    *state = ActivationState::Activated {
                        record: meta.to_record(),
                    };
                }
            }
            (Some(meta), _) => {
                tracing::info!(proof_tx = %meta.burn_tx_hash, "repairing local activation state from chain");
                *state = ActivationState::Activated {
                    record: meta.to_record(),
                };
            }
            (None, ActivationState::Activated { record }) => {
                tracing::warn!(
                    proof_tx = %record.proof_tx,
                    "chain has no record of local activation, keeping local record"
                );
            }
            (None, _) => {}
        }

        Ok(state.clone())
    }

    /// Register the activated node with the bootstrap nodes
    pub async fn register_node(&self) -> Result<()> {
        let record = self.require_activated().await?;
        self.api
            .register_node(&NodeRegistration {
                wallet_address: self.eon_address.clone(),
                node_type: record.capability,
                activation_code: record.code,
            })
            .await
    }

    /// Claim accumulated node rewards
    pub async fn claim_rewards(&self) -> Result<RewardsClaimResponse> {
        let record = self.require_activated().await?;
        self.api
            .claim_rewards(&RewardsClaim {
                wallet_address: self.eon_address.clone(),
                node_type: record.capability,
            })
            .await
    }

    async fn require_activated(&self) -> Result<ActivationRecord> {
        let state = self.state.lock().await;
        match &*state {
            ActivationState::Activated { record } => Ok(record.clone()),
            _ => Err(Error::InvalidInput(
                "wallet is not activated yet".to_string(),
            )),
        }
    }
}

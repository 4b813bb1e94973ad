//! Chain proof scanner
//!
//! Walks an address's transaction history in bounded batches looking for an
//! activation burn: either a direct call into the activation-burn program
//! or an SPL burn of the capability token. A memo in the same transaction
//! tags the capability type; memo-less burns match all types.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::activation::{CapabilityType, ChainStats};
use crate::error::{Error, Result};

use super::rpc::{ChainRpc, ParsedTransaction, SignatureInfo};

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Program id of the activation-burn contract
    pub burn_program: String,
    /// Mint address of the capability token
    pub capability_mint: String,
    /// Signatures fetched per RPC batch
    pub batch_size: usize,
    /// Hard cap on signatures inspected per scan
    pub max_signatures: usize,
    /// How long scan results stay cached per wallet address
    pub cache_ttl: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            burn_program: String::new(),
            capability_mint: String::new(),
            batch_size: 20,
            max_signatures: 200,
            cache_ttl: Duration::from_secs(60),
        }
    }
}

/// A confirmed activation burn found on chain
#[derive(Debug, Clone, PartialEq)]
pub struct BurnProof {
    /// Transaction signature evidencing the burn
    pub signature: String,
    /// Capability tag from the transaction memo; `None` for memo-less
    /// (older) burns, which match all capability types
    pub capability: Option<CapabilityType>,
    /// Burned amount in token base units (0 for direct program calls)
    pub amount: u64,
    /// Block time of the transaction, when the node reported one
    pub block_time: Option<i64>,
}

struct CachedScan {
    fetched_at: Instant,
    result: Option<BurnProof>,
}

/// Bounded cursor over an address's signature history.
///
/// Yields one candidate signature at a time, fetching batches on demand and
/// stopping once the history is exhausted or the inspection cap is reached.
struct SignatureCursor {
    address: String,
    before: Option<String>,
    buffer: VecDeque<SignatureInfo>,
    yielded: usize,
    exhausted: bool,
    batch_size: usize,
    limit: usize,
}

impl SignatureCursor {
    fn new(address: &str, batch_size: usize, limit: usize) -> Self {
        Self {
            address: address.to_string(),
            before: None,
            buffer: VecDeque::new(),
            yielded: 0,
            exhausted: false,
            batch_size,
            limit,
        }
    }

    async fn next(&mut self, rpc: &dyn ChainRpc) -> Result<Option<SignatureInfo>> {
        if self.yielded >= self.limit {
            return Ok(None);
        }

        if self.buffer.is_empty() && !self.exhausted {
            let batch = rpc
                .get_signatures_for_address(&self.address, self.before.clone(), self.batch_size)
                .await?;
            if batch.len() < self.batch_size {
                self.exhausted = true;
            }
            if let Some(last) = batch.last() {
                self.before = Some(last.signature.clone());
            }
            self.buffer.extend(batch);
        }

        match self.buffer.pop_front() {
            Some(info) => {
                self.yielded += 1;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }
}

/// Scans the secondary network for activation burn proofs
pub struct ChainProofScanner {
    rpc: Arc<dyn ChainRpc>,
    config: ScannerConfig,
    cache: Mutex<HashMap<String, CachedScan>>,
}

impl ChainProofScanner {
    /// Create a scanner over an RPC client
    pub fn new(rpc: Arc<dyn ChainRpc>, config: ScannerConfig) -> Self {
        Self {
            rpc,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Find the most recent activation burn in the wallet's history.
    ///
    /// Results are cached per wallet address for the configured TTL to
    /// bound RPC load.
    pub async fn find_burn_proof(&self, wallet_address: &str) -> Result<Option<BurnProof>> {
        {
            let cache = self.cache.lock().await;
            if let Some(cached) = cache.get(wallet_address) {
                if cached.fetched_at.elapsed() < self.config.cache_ttl {
                    return Ok(cached.result.clone());
                }
            }
        }

        let mut cursor = SignatureCursor::new(
            wallet_address,
            self.config.batch_size,
            self.config.max_signatures,
        );

        let mut found = None;
        while let Some(info) = cursor.next(&*self.rpc).await? {
            if info.err.is_some() {
                continue;
            }
            let Some(tx) = self.rpc.get_parsed_transaction(&info.signature).await? else {
                continue;
            };
            if let Some(proof) = self.extract_burn(&info.signature, &tx) {
                found = Some(proof);
                break;
            }
        }

        let mut cache = self.cache.lock().await;
        cache.insert(
            wallet_address.to_string(),
            CachedScan {
                fetched_at: Instant::now(),
                result: found.clone(),
            },
        );
        Ok(found)
    }

    /// Verify that a specific transaction is a confirmed activation burn
    pub async fn verify_burn(&self, signature: &str) -> Result<BurnProof> {
        let tx = self
            .rpc
            .get_parsed_transaction(signature)
            .await?
            .ok_or_else(|| {
                Error::ProofUnconfirmed(format!("transaction {} not found on chain", signature))
            })?;

        self.extract_burn(signature, &tx).ok_or_else(|| {
            Error::ProofUnconfirmed(format!(
                "transaction {} contains no activation burn",
                signature
            ))
        })
    }

    /// Total capability-token balance held by an owner
    pub async fn token_balance(&self, owner: &str) -> Result<u64> {
        let accounts = self
            .rpc
            .get_token_accounts_by_owner(owner, &self.config.capability_mint)
            .await?;
        Ok(accounts.iter().map(|a| a.amount).sum())
    }

    /// Native-coin balance of an address on the secondary network
    pub async fn native_balance(&self, address: &str) -> Result<u64> {
        self.rpc.get_balance(address).await
    }

    /// Chain figures for quote computation.
    ///
    /// The capability token is burn-only, so the cumulative burned amount
    /// is the launch supply minus the current on-chain supply.
    pub async fn chain_stats(&self, launch_supply: u64, active_nodes: u64) -> Result<ChainStats> {
        let supply = self
            .rpc
            .get_token_supply(&self.config.capability_mint)
            .await?;
        Ok(ChainStats {
            burned: launch_supply.saturating_sub(supply.amount),
            supply: launch_supply,
            active_nodes,
        })
    }

    fn extract_burn(&self, signature: &str, tx: &ParsedTransaction) -> Option<BurnProof> {
        if tx.meta.as_ref().and_then(|m| m.err.as_ref()).is_some() {
            return None;
        }

        let mut burn_amount: Option<u64> = None;
        let mut capability: Option<CapabilityType> = None;

        for instruction in &tx.transaction.message.instructions {
            if instruction.program_id.as_deref() == Some(self.config.burn_program.as_str())
                && !self.config.burn_program.is_empty()
            {
                burn_amount.get_or_insert(0);
                continue;
            }

            match instruction.program.as_deref() {
                Some("spl-token") => {
                    let Some(parsed) = instruction.parsed.as_ref() else {
                        continue;
                    };
                    let is_burn = parsed
                        .pointer("/type")
                        .and_then(|v| v.as_str())
                        .map(|t| t == "burn" || t == "burnChecked")
                        .unwrap_or(false);
                    let mint = parsed.pointer("/info/mint").and_then(|v| v.as_str());
                    if is_burn && mint == Some(self.config.capability_mint.as_str()) {
                        let amount = parsed
                            .pointer("/info/amount")
                            .and_then(|v| v.as_str())
                            .or_else(|| {
                                parsed
                                    .pointer("/info/tokenAmount/amount")
                                    .and_then(|v| v.as_str())
                            })
                            .and_then(|s| s.parse::<u64>().ok())
                            .unwrap_or(0);
                        burn_amount = Some(amount);
                    }
                }
                Some("spl-memo") => {
                    if let Some(memo) = instruction.parsed.as_ref().and_then(|v| v.as_str()) {
                        capability = CapabilityType::from_memo(memo);
                    }
                }
                _ => {}
            }
        }

        burn_amount.map(|amount| BurnProof {
            signature: signature.to_string(),
            capability,
            amount,
            block_time: tx.block_time,
        })
    }
}

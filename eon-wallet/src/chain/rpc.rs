//! JSON-RPC client for the secondary network

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::error::{Error, Result};

/// Signature listing entry returned by `getSignaturesForAddress`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    pub signature: String,
    pub slot: u64,
    /// Present when the transaction failed
    pub err: Option<serde_json::Value>,
    pub block_time: Option<i64>,
}

/// A transaction in `jsonParsed` encoding
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTransaction {
    pub slot: Option<u64>,
    pub block_time: Option<i64>,
    pub meta: Option<TransactionMeta>,
    pub transaction: TransactionPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMeta {
    pub err: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPayload {
    pub message: TransactionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionMessage {
    pub instructions: Vec<ParsedInstruction>,
}

/// One parsed instruction. `program` names well-known programs
/// (`spl-token`, `spl-memo`); `parsed` carries their decoded payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedInstruction {
    pub program: Option<String>,
    pub program_id: Option<String>,
    pub parsed: Option<serde_json::Value>,
}

/// A token account owned by an address
#[derive(Debug, Clone)]
pub struct TokenAccount {
    pub pubkey: String,
    pub amount: u64,
}

/// Supply of a token mint
#[derive(Debug, Clone)]
pub struct TokenSupply {
    pub amount: u64,
    pub decimals: u8,
}

/// RPC surface the scanner and activation client consume
#[async_trait::async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, address: &str) -> Result<u64>;

    async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<Vec<TokenAccount>>;

    async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<String>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>>;

    async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>>;

    async fn get_token_supply(&self, mint: &str) -> Result<TokenSupply>;
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP JSON-RPC client with endpoint rotation.
///
/// Transport failures and error statuses rotate to the next endpoint;
/// an RPC-level error object is returned as [`Error::Chain`].
pub struct HttpChainRpc {
    endpoints: Vec<String>,
    client: reqwest::Client,
}

impl HttpChainRpc {
    /// Create a client over a list of RPC endpoint URLs
    pub fn new(endpoints: Vec<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { endpoints, client }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut last = Error::NetworkUnavailable("no rpc endpoints configured".to_string());

        for url in &self.endpoints {
            match self.client.post(url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    let envelope: RpcEnvelope = response
                        .json()
                        .await
                        .map_err(|e| Error::Serialization(e.to_string()))?;
                    if let Some(err) = envelope.error {
                        return Err(Error::Chain(format!(
                            "{} failed: {} (code {})",
                            method, err.message, err.code
                        )));
                    }
                    return Ok(envelope.result.unwrap_or(serde_json::Value::Null));
                }
                Ok(response) => {
                    tracing::warn!(endpoint = %url, status = %response.status(), "rpc endpoint returned error status");
                    last = Error::NetworkUnavailable(format!(
                        "{} returned {}",
                        url,
                        response.status()
                    ));
                }
                Err(e) => {
                    tracing::warn!(endpoint = %url, error = %e, "rpc endpoint unreachable");
                    last = Error::NetworkUnavailable(e.to_string());
                }
            }
        }

        Err(last)
    }
}

#[async_trait::async_trait]
impl ChainRpc for HttpChainRpc {
    async fn get_balance(&self, address: &str) -> Result<u64> {
        let value = self.call("getBalance", json!([address])).await?;
        value
            .pointer("/value")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| Error::Serialization("malformed getBalance response".to_string()))
    }

    async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: &str,
    ) -> Result<Vec<TokenAccount>> {
        let value = self
            .call(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        let entries = value
            .pointer("/value")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                Error::Serialization("malformed getTokenAccountsByOwner response".to_string())
            })?;

        let mut accounts = Vec::with_capacity(entries.len());
        for entry in entries {
            let pubkey = entry
                .pointer("/pubkey")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let amount = entry
                .pointer("/account/data/parsed/info/tokenAmount/amount")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            accounts.push(TokenAccount { pubkey, amount });
        }
        Ok(accounts)
    }

    async fn get_signatures_for_address(
        &self,
        address: &str,
        before: Option<String>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>> {
        let mut options = json!({ "limit": limit });
        if let Some(before) = before {
            options["before"] = json!(before);
        }
        let value = self
            .call("getSignaturesForAddress", json!([address, options]))
            .await?;

        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn get_parsed_transaction(&self, signature: &str) -> Result<Option<ParsedTransaction>> {
        let value = self
            .call(
                "getParsedTransaction",
                json!([signature, { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }]),
            )
            .await?;

        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn get_token_supply(&self, mint: &str) -> Result<TokenSupply> {
        let value = self.call("getTokenSupply", json!([mint])).await?;

        let amount = value
            .pointer("/value/amount")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| Error::Serialization("malformed getTokenSupply response".to_string()))?;
        let decimals = value
            .pointer("/value/decimals")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u8;

        Ok(TokenSupply { amount, decimals })
    }
}

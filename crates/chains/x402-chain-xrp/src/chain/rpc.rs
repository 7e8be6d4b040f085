#![cfg(any(feature = "client", feature = "facilitator"))]

//! Thin JSON-RPC transport to a `rippled` server (or compatible gateway),
//! covering only the handful of methods the `exact` scheme needs:
//! `account_info`, `fee`, `submit`, `tx`, and `ledger_current`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum XrplRpcError {
    #[error("request to rippled server failed: {0}")]
    Transport(String),
    #[error("rippled returned an error: {0}")]
    Rippled(String),
    #[error("unexpected response shape: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub sequence: u32,
    pub balance_drops: u64,
    pub owner_count: u32,
}

#[derive(Debug, Clone)]
pub struct FeeInfo {
    pub base_fee_drops: u64,
}

#[derive(Debug, Clone)]
pub struct SubmitResult {
    pub engine_result: String,
    pub engine_result_message: String,
    pub tx_hash: Option<String>,
    pub accepted: bool,
}

#[derive(Debug, Clone)]
pub struct TxResult {
    pub validated: bool,
    pub successful: bool,
}

/// Abstracted over so the facilitator/client logic can be tested against a
/// fake implementation without a live `rippled` server.
#[async_trait]
pub trait XrplRpcClientLike: Send + Sync {
    async fn account_info(&self, account: &str) -> Result<AccountInfo, XrplRpcError>;
    async fn fee(&self) -> Result<FeeInfo, XrplRpcError>;
    async fn submit(&self, tx_blob: &str) -> Result<SubmitResult, XrplRpcError>;
    async fn tx(&self, hash: &str) -> Result<TxResult, XrplRpcError>;
    async fn ledger_current(&self) -> Result<u32, XrplRpcError>;
}

#[cfg(any(feature = "client", feature = "facilitator"))]
pub struct XrplJsonRpcClient {
    http: reqwest::Client,
    url: url::Url,
}

#[cfg(any(feature = "client", feature = "facilitator"))]
impl XrplJsonRpcClient {
    pub fn new(url: url::Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, XrplRpcError> {
        let body = serde_json::json!({
            "method": method,
            "params": [params],
        });
        let response = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| XrplRpcError::Transport(e.to_string()))?;
        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| XrplRpcError::Transport(e.to_string()))?;
        if let Some(error) = envelope.result.get("error") {
            let message = envelope
                .result
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            return Err(XrplRpcError::Rippled(format!("{error}: {message}")));
        }
        Ok(envelope.result)
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Value,
}

#[cfg(any(feature = "client", feature = "facilitator"))]
#[async_trait]
impl XrplRpcClientLike for XrplJsonRpcClient {
    async fn account_info(&self, account: &str) -> Result<AccountInfo, XrplRpcError> {
        let result = self
            .call(
                "account_info",
                serde_json::json!({ "account": account, "ledger_index": "current" }),
            )
            .await?;
        let account_data = result
            .get("account_data")
            .ok_or_else(|| XrplRpcError::MalformedResponse("missing account_data".into()))?;
        let sequence = account_data
            .get("Sequence")
            .and_then(Value::as_u64)
            .ok_or_else(|| XrplRpcError::MalformedResponse("missing Sequence".into()))?
            as u32;
        let balance_drops = account_data
            .get("Balance")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| XrplRpcError::MalformedResponse("missing Balance".into()))?;
        let owner_count = account_data
            .get("OwnerCount")
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32;
        Ok(AccountInfo {
            sequence,
            balance_drops,
            owner_count,
        })
    }

    async fn fee(&self) -> Result<FeeInfo, XrplRpcError> {
        let result = self.call("fee", serde_json::json!({})).await?;
        let base_fee_drops = result
            .get("drops")
            .and_then(|d| d.get("base_fee"))
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| XrplRpcError::MalformedResponse("missing drops.base_fee".into()))?;
        Ok(FeeInfo { base_fee_drops })
    }

    async fn submit(&self, tx_blob: &str) -> Result<SubmitResult, XrplRpcError> {
        let result = self
            .call("submit", serde_json::json!({ "tx_blob": tx_blob }))
            .await?;
        let engine_result = result
            .get("engine_result")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let engine_result_message = result
            .get("engine_result_message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let tx_hash = result
            .get("tx_json")
            .and_then(|t| t.get("hash"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let accepted = engine_result == "tesSUCCESS" || engine_result.starts_with("ter");
        Ok(SubmitResult {
            engine_result,
            engine_result_message,
            tx_hash,
            accepted,
        })
    }

    async fn tx(&self, hash: &str) -> Result<TxResult, XrplRpcError> {
        let result = self
            .call("tx", serde_json::json!({ "transaction": hash, "binary": false }))
            .await?;
        let validated = result
            .get("validated")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let successful = result
            .get("meta")
            .and_then(|m| m.get("TransactionResult"))
            .and_then(Value::as_str)
            .map(|r| r == "tesSUCCESS")
            .unwrap_or(false);
        Ok(TxResult {
            validated,
            successful,
        })
    }

    async fn ledger_current(&self) -> Result<u32, XrplRpcError> {
        let result = self.call("ledger_current", serde_json::json!({})).await?;
        result
            .get("ledger_current_index")
            .and_then(Value::as_u64)
            .map(|v| v as u32)
            .ok_or_else(|| XrplRpcError::MalformedResponse("missing ledger_current_index".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memo {
    #[serde(rename = "MemoData", skip_serializing_if = "Option::is_none")]
    pub memo_data: Option<String>,
    #[serde(rename = "MemoType", skip_serializing_if = "Option::is_none")]
    pub memo_type: Option<String>,
}

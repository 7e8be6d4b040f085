use serde::{Deserialize, Serialize};
use x402_types::chain::ChainId;
use x402_types::config::RpcConfig;

use crate::chain::XrpChainReference;

#[derive(Debug, Clone)]
pub struct XrpChainConfig {
    pub chain_reference: XrpChainReference,
    pub inner: XrpChainConfigInner,
}

impl XrpChainConfig {
    pub fn chain_id(&self) -> ChainId {
        self.chain_reference.clone().into()
    }
    pub fn chain_reference(&self) -> &XrpChainReference {
        &self.chain_reference
    }
    pub fn rpc(&self) -> &RpcConfig {
        &self.inner.rpc
    }
    pub fn max_retries(&self) -> u32 {
        self.inner.max_retries
    }
    pub fn retry_delay_ms(&self) -> u64 {
        self.inner.retry_delay_ms
    }
    pub fn validation_timeout_ms(&self) -> u64 {
        self.inner.validation_timeout_ms
    }
    pub fn ledger_offset(&self) -> u32 {
        self.inner.ledger_offset
    }
    pub fn queue_size(&self) -> u32 {
        self.inner.queue_size
    }
}

/// Configuration specific to the XRP Ledger.
///
/// The facilitator never holds a signing key for this rail: the client signs
/// the `Payment` transaction itself, and the facilitator only verifies and
/// submits the already-signed blob, so this config is limited to the
/// JSON-RPC endpoint and the submit/settle tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XrpChainConfigInner {
    /// JSON-RPC endpoint for the `rippled` server (or a compatible gateway).
    pub rpc: RpcConfig,
    /// How many times `settle` retries `submit` before giving up.
    #[serde(default = "xrp_chain_config::default_max_retries")]
    pub max_retries: u32,
    /// Delay between submit retries.
    #[serde(default = "xrp_chain_config::default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// How long `settle` polls `tx` for `validated: true` before timing out.
    #[serde(default = "xrp_chain_config::default_validation_timeout_ms")]
    pub validation_timeout_ms: u64,
    /// How many ledgers ahead of the current ledger `LastLedgerSequence` is
    /// allowed to be, both when the client builds the transaction and when
    /// the facilitator verifies it.
    #[serde(default = "xrp_chain_config::default_ledger_offset")]
    pub ledger_offset: u32,
    /// How far ahead of the account's next sequence number a submitted
    /// transaction's `Sequence` may be, to tolerate a small queue of
    /// in-flight transactions from the same account.
    #[serde(default = "xrp_chain_config::default_queue_size")]
    pub queue_size: u32,
}

mod xrp_chain_config {
    pub fn default_max_retries() -> u32 {
        3
    }
    pub fn default_retry_delay_ms() -> u64 {
        1000
    }
    pub fn default_validation_timeout_ms() -> u64 {
        20_000
    }
    pub fn default_ledger_offset() -> u32 {
        20
    }
    pub fn default_queue_size() -> u32 {
        4
    }
}

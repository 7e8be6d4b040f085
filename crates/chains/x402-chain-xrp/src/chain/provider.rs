#![cfg(feature = "facilitator")]

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use x402_types::chain::{ChainId, ChainProviderOps, FromConfig};

use crate::chain::config::XrpChainConfig;
use crate::chain::rpc::{XrplJsonRpcClient, XrplRpcClientLike};
use crate::chain::types::XrpChainReference;

/// Provider for interacting with the XRP Ledger.
///
/// Unlike the EVM/Solana providers, this one never holds a signing key: the
/// `exact` scheme on this rail has the client pre-sign the `Payment`
/// transaction, so the facilitator only ever submits and polls an
/// already-signed blob.
pub struct XrpChainProvider {
    chain: XrpChainReference,
    rpc_client: Arc<dyn XrplRpcClientLike>,
    max_retries: u32,
    retry_delay_ms: u64,
    validation_timeout_ms: u64,
    ledger_offset: u32,
    queue_size: u32,
}

impl Debug for XrpChainProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XrpChainProvider")
            .field("chain", &self.chain)
            .finish()
    }
}

impl XrpChainProvider {
    pub fn new(
        chain: XrpChainReference,
        rpc_client: Arc<dyn XrplRpcClientLike>,
        max_retries: u32,
        retry_delay_ms: u64,
        validation_timeout_ms: u64,
        ledger_offset: u32,
        queue_size: u32,
    ) -> Self {
        Self {
            chain,
            rpc_client,
            max_retries,
            retry_delay_ms,
            validation_timeout_ms,
            ledger_offset,
            queue_size,
        }
    }

    pub fn rpc_client(&self) -> Arc<dyn XrplRpcClientLike> {
        Arc::clone(&self.rpc_client)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
    pub fn retry_delay_ms(&self) -> u64 {
        self.retry_delay_ms
    }
    pub fn validation_timeout_ms(&self) -> u64 {
        self.validation_timeout_ms
    }
    pub fn ledger_offset(&self) -> u32 {
        self.ledger_offset
    }
    pub fn queue_size(&self) -> u32 {
        self.queue_size
    }
    pub fn chain(&self) -> &XrpChainReference {
        &self.chain
    }
}

#[async_trait::async_trait]
impl FromConfig<XrpChainConfig> for XrpChainProvider {
    async fn from_config(config: &XrpChainConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let url = config.rpc().http.clone();
        let rpc_client = Arc::new(XrplJsonRpcClient::new(url));
        Ok(Self::new(
            config.chain_reference().clone(),
            rpc_client,
            config.max_retries(),
            config.retry_delay_ms(),
            config.validation_timeout_ms(),
            config.ledger_offset(),
            config.queue_size(),
        ))
    }
}

impl ChainProviderOps for XrpChainProvider {
    fn signer_addresses(&self) -> Vec<String> {
        Vec::new()
    }

    fn chain_id(&self) -> ChainId {
        self.chain.clone().into()
    }
}

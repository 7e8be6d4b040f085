use serde::{Deserialize, Serialize};
use x402_types::chain::ChainId;

use crate::LIGHTNING_NAMESPACE;

#[derive(Debug, Clone)]
pub struct LightningChainConfig {
    pub chain_reference: String,
    pub inner: LightningChainConfigInner,
}

impl LightningChainConfig {
    pub fn chain_id(&self) -> ChainId {
        ChainId::new(LIGHTNING_NAMESPACE, self.chain_reference.clone())
    }
}

/// Configuration specific to the Lightning Network.
///
/// Empty today: the actual node integration (LND/CLN/LNbits) is supplied by
/// the embedder as an [`crate::exact::InvoiceLookup`] implementation, not
/// constructed from this config. This struct exists as the place per-node
/// settings (macaroon path, REST URL, ...) would go once a concrete
/// integration is wired in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightningChainConfigInner {}

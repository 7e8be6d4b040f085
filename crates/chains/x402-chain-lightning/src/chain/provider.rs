use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use x402_types::chain::{ChainId, ChainProviderOps};

use crate::exact::lookup::InvoiceLookup;

/// Provider for the Lightning rail. Holds no RPC endpoint of its own —
/// settlement is delegated entirely to whichever [`InvoiceLookup`]
/// implementation the embedder supplies for their node (LND/CLN/LNbits).
pub struct LightningChainProvider {
    chain_id: ChainId,
    lookup: Arc<dyn InvoiceLookup>,
}

impl Debug for LightningChainProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightningChainProvider")
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

impl LightningChainProvider {
    pub fn new(chain_id: ChainId, lookup: Arc<dyn InvoiceLookup>) -> Self {
        Self { chain_id, lookup }
    }

    pub fn lookup(&self) -> Arc<dyn InvoiceLookup> {
        Arc::clone(&self.lookup)
    }
}

impl ChainProviderOps for LightningChainProvider {
    fn signer_addresses(&self) -> Vec<String> {
        Vec::new()
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id.clone()
    }
}

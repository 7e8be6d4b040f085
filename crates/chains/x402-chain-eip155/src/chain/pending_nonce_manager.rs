//! Nonce manager that tracks the next nonce locally and resets to a fresh
//! on-chain (pending) lookup whenever a transaction fails.

use alloy_network::Network;
use alloy_primitives::Address;
use alloy_provider::Provider;
use alloy_provider::nonce::NonceManager;
use alloy_transport::TransportResult;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-address nonce cache, queried lazily against the pending block tag.
#[derive(Clone, Default)]
pub struct PendingNonceManager {
    nonces: Arc<Mutex<HashMap<Address, u64>>>,
}

impl PendingNonceManager {
    /// Drops the cached nonce for `address`, forcing a fresh pending-nonce
    /// query the next time it's needed.
    pub async fn reset_nonce(&self, address: Address) {
        self.nonces.lock().await.remove(&address);
    }
}

impl NonceManager for PendingNonceManager {
    async fn get_next_nonce<P, N>(&self, provider: &P, address: Address) -> TransportResult<u64>
    where
        P: Provider<N>,
        N: Network,
    {
        let mut nonces = self.nonces.lock().await;
        if let Some(nonce) = nonces.get(&address) {
            let next = *nonce;
            nonces.insert(address, next + 1);
            return Ok(next);
        }
        let onchain = provider.get_transaction_count(address).pending().await?;
        nonces.insert(address, onchain + 1);
        Ok(onchain)
    }
}

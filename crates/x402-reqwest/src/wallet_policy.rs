//! Spend caps enforced client-side before a payment candidate is ever signed.
//!
//! A server's `accepts` list is untrusted input: nothing stops a malicious or
//! misconfigured resource server from asking for far more than a caller
//! intends to pay. [`WalletPolicy`] lets a caller bound what [`X402Payments`](crate::X402Payments)
//! is willing to sign, per chain and per asset, before a [`PaymentSelector`]
//! ever sees a candidate.

use std::collections::HashMap;

use x402_types::chain::ChainId;
use x402_types::scheme::client::{PaymentCandidate, X402Error};

/// Per-network, per-asset maximum amount a client is willing to pay.
///
/// Candidates that exceed their chain/asset limit are dropped before
/// selection. A candidate for a chain/asset with no configured limit is
/// allowed through unchanged -- `WalletPolicy::default()` imposes no caps.
#[derive(Debug, Clone, Default)]
pub struct WalletPolicy {
    limits: HashMap<ChainId, HashMap<String, u128>>,
    /// Legacy single-cap mode: applied as a per-asset ceiling across every
    /// chain, matching the teacher's original `.max(MaxTokenAmount)` shape.
    global_asset_limits: HashMap<String, u128>,
}

impl WalletPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps spend for a specific `(chain, asset)` pair.
    pub fn max(mut self, chain_id: ChainId, asset: impl Into<String>, limit: u128) -> Self {
        self.limits
            .entry(chain_id)
            .or_default()
            .insert(asset.into(), limit);
        self
    }

    /// Caps spend for an asset regardless of which chain it's quoted on.
    ///
    /// Kept for parity with the teacher's original `X402Payments::max`,
    /// which only ever dealt with a single EVM network.
    pub fn max_asset(mut self, asset: impl Into<String>, limit: u128) -> Self {
        self.global_asset_limits.insert(asset.into(), limit);
        self
    }

    /// Returns the candidates that fall within policy, dropping the rest.
    pub fn filter(&self, candidates: Vec<PaymentCandidate>) -> Vec<PaymentCandidate> {
        candidates
            .into_iter()
            .filter(|c| self.allows(c))
            .collect()
    }

    fn allows(&self, candidate: &PaymentCandidate) -> bool {
        if let Some(per_chain) = self.limits.get(&candidate.chain_id) {
            if let Some(limit) = per_chain.get(&candidate.asset) {
                if candidate.amount > *limit {
                    return false;
                }
            }
        }
        if let Some(limit) = self.global_asset_limits.get(&candidate.asset) {
            if candidate.amount > *limit {
                return false;
            }
        }
        true
    }

    /// Checks a single candidate, returning an error describing the breach.
    pub fn check(&self, candidate: &PaymentCandidate) -> Result<(), X402Error> {
        if self.allows(candidate) {
            Ok(())
        } else {
            Err(X402Error::SigningError(format!(
                "payment amount {} for asset {} on {} exceeds configured wallet policy limit",
                candidate.amount, candidate.asset, candidate.chain_id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x402_types::scheme::client::PaymentCandidateSigner;

    struct NopSigner;

    #[async_trait::async_trait]
    impl PaymentCandidateSigner for NopSigner {
        async fn sign_payment(&self) -> Result<String, X402Error> {
            Ok(String::new())
        }
    }

    fn candidate(chain_id: ChainId, asset: &str, amount: u128) -> PaymentCandidate {
        PaymentCandidate {
            chain_id,
            asset: asset.to_string(),
            amount,
            scheme: "exact".to_string(),
            pay_to: "pay-to".to_string(),
            signer: Box::new(NopSigner),
        }
    }

    #[test]
    fn no_policy_allows_everything() {
        let policy = WalletPolicy::new();
        let chain_id = ChainId::new("eip155", "8453");
        assert!(policy.allows(&candidate(chain_id, "usdc", u128::MAX)));
    }

    #[test]
    fn per_chain_asset_limit_rejects_over_cap() {
        let chain_id = ChainId::new("eip155", "8453");
        let policy = WalletPolicy::new().max(chain_id.clone(), "usdc", 1_000);
        assert!(policy.allows(&candidate(chain_id.clone(), "usdc", 1_000)));
        assert!(!policy.allows(&candidate(chain_id, "usdc", 1_001)));
    }

    #[test]
    fn global_asset_limit_applies_across_chains() {
        let policy = WalletPolicy::new().max_asset("usdc", 500);
        let base = ChainId::new("eip155", "8453");
        let solana = ChainId::new("solana", "mainnet");
        assert!(!policy.allows(&candidate(base, "usdc", 600)));
        assert!(!policy.allows(&candidate(solana, "usdc", 600)));
    }

    #[test]
    fn filter_drops_only_over_cap_candidates() {
        let chain_id = ChainId::new("eip155", "8453");
        let policy = WalletPolicy::new().max(chain_id.clone(), "usdc", 100);
        let candidates = vec![
            candidate(chain_id.clone(), "usdc", 50),
            candidate(chain_id, "usdc", 500),
        ];
        let filtered = policy.filter(candidates);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].amount, 50);
    }
}

//! Client-side scheme plumbing: turning a `402 Payment Required` response
//! into one or more signed payment candidates, and picking one to pay with.

use crate::chain::ChainId;
use crate::proto::PaymentRequired;
use async_trait::async_trait;

/// A payment a client is able to make against one of a server's accepted
/// [`crate::proto::PaymentRequirements`].
pub struct PaymentCandidate {
    pub chain_id: ChainId,
    pub asset: String,
    pub amount: u128,
    pub scheme: String,
    pub pay_to: String,
    pub signer: Box<dyn PaymentCandidateSigner>,
}

/// Lazily produces the base64-encoded `X-Payment` header value for a
/// candidate. Signing is deferred until a candidate is actually selected,
/// since it usually means a fresh nonce and a fresh validity window.
#[async_trait]
pub trait PaymentCandidateSigner: Send + Sync {
    async fn sign_payment(&self) -> Result<String, X402Error>;
}

/// Implemented by each chain-specific client module (EVM, Solana, XRP,
/// Lightning exact-amount clients) to turn a `402` body into zero or more
/// candidates this client knows how to pay.
pub trait X402SchemeClient: Send + Sync {
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate>;
}

/// Chooses one candidate to pay with when a client has several (e.g. the
/// server accepts both USDC on Base and USDC on Solana).
pub trait PaymentSelector: Send + Sync {
    fn select(&self, candidates: Vec<PaymentCandidate>) -> Option<PaymentCandidate>;
}

/// Default selector: pays with whatever candidate appeared first in the
/// server's `accepts` list.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select(&self, mut candidates: Vec<PaymentCandidate>) -> Option<PaymentCandidate> {
        if candidates.is_empty() {
            None
        } else {
            Some(candidates.remove(0))
        }
    }
}

/// Picks the cheapest candidate by raw on-chain amount, ignoring that
/// amounts across different assets aren't directly comparable — useful only
/// when the server quotes the same asset across multiple chains.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheapestAmount;

impl PaymentSelector for CheapestAmount {
    fn select(&self, candidates: Vec<PaymentCandidate>) -> Option<PaymentCandidate> {
        candidates.into_iter().min_by_key(|c| c.amount)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    #[error("no matching payment candidate for this 402 response")]
    NoMatch,
    #[error("signing error: {0}")]
    SigningError(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

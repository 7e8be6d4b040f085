//! `facilitator-fees`: the server advertises one or more signed fee quotes a
//! facilitator will charge to settle a payment; the client expresses a
//! preference, and settlement echoes back the fee actually paid.
//!
//! Shape chosen per the *options + selectedQuoteId* design (documented in
//! this repository's design ledger): a 402 response can list several
//! fee-inclusive quotes side by side rather than a single implicit fee, and
//! the client's payload simply echoes which quote it paid against. This
//! matches the `extra`-bag enrichment style already used elsewhere
//! (`SchemeExtra::EvmDomain`, `SvmFeePayer`) rather than inventing a new
//! top-level protocol field.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{Extension, ExtensionContext, ExtensionError, ExtensionInfo};

/// How a facilitator's fee for a payment is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Flat,
    Bps,
    Tiered,
    Hybrid,
}

/// A single signed fee quote a facilitator offers for settling a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilitatorFeeQuote {
    #[serde(rename = "facilitatorId")]
    pub facilitator_id: String,
    pub kind: FeeKind,
    /// Flat fee in atomic units, or the bps rate (1/10000) for `Bps`/`Hybrid`.
    pub amount: u128,
    #[serde(rename = "minFee", default, skip_serializing_if = "Option::is_none")]
    pub min_fee: Option<u128>,
    #[serde(rename = "maxFee", default, skip_serializing_if = "Option::is_none")]
    pub max_fee: Option<u128>,
    /// Unix seconds after which the quote is no longer honored.
    pub expiry: u64,
    /// EIP-191 or ed25519 signature over the canonical JSON of the fields above.
    pub signature: String,
}

impl FacilitatorFeeQuote {
    /// Effective fee for a payment of `amount_paid` atomic units.
    ///
    /// `Bps`/`Hybrid` quotes compute `amount_paid * bps / 10000` and clamp it
    /// to `[min_fee, max_fee]`; `Flat`/`Tiered` quotes charge `amount` as-is.
    pub fn effective_fee(&self, amount_paid: u128) -> u128 {
        match self.kind {
            FeeKind::Flat | FeeKind::Tiered => self.amount,
            FeeKind::Bps | FeeKind::Hybrid => {
                let raw = amount_paid.saturating_mul(self.amount) / 10_000;
                let raw = self.min_fee.map_or(raw, |min| raw.max(min));
                self.max_fee.map_or(raw, |max| raw.min(max))
            }
        }
    }
}

/// Options a server advertises alongside `accepts` for a given resource.
pub struct FacilitatorFees {
    quotes: Vec<FacilitatorFeeQuote>,
}

impl FacilitatorFees {
    pub fn new(quotes: Vec<FacilitatorFeeQuote>) -> Self {
        Self { quotes }
    }
}

#[async_trait]
impl Extension for FacilitatorFees {
    fn key(&self) -> &'static str {
        "facilitator-fees"
    }

    async fn enrich_payment_required_response(
        &self,
        _context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        if self.quotes.is_empty() {
            return Ok(None);
        }
        Ok(Some(ExtensionInfo {
            info: json!({ "options": self.quotes }),
            schema: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quote(kind: FeeKind, amount: u128, min_fee: Option<u128>, max_fee: Option<u128>) -> FacilitatorFeeQuote {
        FacilitatorFeeQuote {
            facilitator_id: "facilitator-a".to_string(),
            kind,
            amount,
            min_fee,
            max_fee,
            expiry: 0,
            signature: "sig".to_string(),
        }
    }

    #[test]
    fn flat_fee_ignores_payment_amount() {
        let q = quote(FeeKind::Flat, 500, None, None);
        assert_eq!(q.effective_fee(1_000_000), 500);
    }

    #[test]
    fn bps_fee_is_clamped_to_min_and_max() {
        let q = quote(FeeKind::Bps, 50, Some(10), Some(20));
        // 50 bps of 1000 = 5, clamped up to min_fee 10
        assert_eq!(q.effective_fee(1_000), 10);
        // 50 bps of 1_000_000 = 5_000, clamped down to max_fee 20
        assert_eq!(q.effective_fee(1_000_000), 20);
    }
}

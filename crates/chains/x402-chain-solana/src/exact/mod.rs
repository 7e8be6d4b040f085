//! The `exact` payment scheme for Solana: a fixed-amount SPL Token
//! `TransferChecked` payment, pre-signed by the payer and co-signed/submitted
//! on-chain by the facilitator acting as fee payer.

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "facilitator")]
pub mod facilitator;
pub mod types;

use x402_types::chain::DeployedTokenAmount;
use x402_types::proto::{PriceTag, SchemeExtra};
use x402_types::scheme::X402SchemeId;

#[cfg(feature = "facilitator")]
pub use facilitator::SolanaExactFacilitator;
pub use types::{EXACT_SCHEME, ExactSolanaPayload, SolanaExactError};

use crate::chain::{Address, SolanaTokenDeployment};

pub struct SolanaExact;

impl SolanaExact {
    /// Builds a price tag for a fixed amount of an SPL token. The facilitator's
    /// fee payer address is not known until `GET /supported` is queried, so
    /// this registers an enricher that fills it in from there.
    pub fn price_tag<A: Into<Address>>(
        pay_to: A,
        asset: DeployedTokenAmount<u64, SolanaTokenDeployment>,
    ) -> PriceTag {
        let chain_id: x402_types::chain::ChainId = asset.token.chain_reference.into();
        PriceTag::new(
            EXACT_SCHEME,
            chain_id,
            pay_to.into().to_string(),
            asset.token.address.to_string(),
            asset.amount as u128,
        )
        .enriched_by(solana_fee_payer_enricher)
    }
}

fn solana_fee_payer_enricher(
    price_tag: &mut PriceTag,
    capabilities: &x402_types::proto::SupportedResponse,
) {
    if price_tag.extra.is_some() {
        return;
    }
    let extra = capabilities
        .kinds
        .iter()
        .find(|kind| kind.scheme == EXACT_SCHEME && kind.network == price_tag.network)
        .and_then(|kind| kind.extra.clone());
    if let Some(SchemeExtra::SvmFeePayer { .. }) = &extra {
        price_tag.extra = extra;
    }
}

impl X402SchemeId for SolanaExact {
    fn namespace(&self) -> &str {
        "solana"
    }
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }
}

//! The `exact` payment scheme for Lightning: a BOLT11 invoice, verified
//! structurally and settled via a pluggable node-specific [`InvoiceLookup`].

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "facilitator")]
pub mod facilitator;
pub mod lookup;
pub mod types;

use x402_types::proto::PriceTag;
use x402_types::scheme::X402SchemeId;
#[cfg(feature = "facilitator")]
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorBuilder};

#[cfg(feature = "facilitator")]
pub use facilitator::LightningExactFacilitator;
pub use lookup::{InvoiceLookup, InvoiceStatus, LookupError, UnverifiedInvoiceLookup};
pub use types::{EXACT_SCHEME, ExactLightningPayload, LightningExactError};

use x402_types::chain::ChainId;

#[cfg(feature = "facilitator")]
use crate::chain::LightningChainProvider;

pub struct LightningExact;

impl LightningExact {
    /// Builds a price tag for a fixed amount of msat on the given Lightning
    /// network reference. There is no contract address or payee account for
    /// this rail — the payee is whichever node's invoice is presented.
    pub fn price_tag(chain_id: ChainId, amount_msat: u128) -> PriceTag {
        PriceTag::new(EXACT_SCHEME, chain_id, String::new(), "msat".to_string(), amount_msat)
    }
}

impl X402SchemeId for LightningExact {
    fn namespace(&self) -> &str {
        "lightning"
    }
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }
}

#[cfg(feature = "facilitator")]
impl X402SchemeFacilitatorBuilder<std::sync::Arc<LightningChainProvider>> for LightningExact {
    fn build(
        &self,
        provider: std::sync::Arc<LightningChainProvider>,
        _config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        Ok(Box::new(LightningExactFacilitator::new(provider)))
    }
}

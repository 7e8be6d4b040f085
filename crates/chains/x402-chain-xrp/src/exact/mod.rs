//! The `exact` payment scheme for the XRP Ledger: a fixed-amount native
//! currency `Payment`, pre-signed by the payer and only verified/submitted
//! by the facilitator.

#[cfg(feature = "client")]
pub mod client;
pub mod codec;
#[cfg(feature = "facilitator")]
pub mod facilitator;
pub mod types;

use x402_types::proto::PriceTag;
use x402_types::scheme::X402SchemeId;
#[cfg(feature = "facilitator")]
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorBuilder};

#[cfg(feature = "facilitator")]
pub use facilitator::XrpExactFacilitator;
pub use types::{EXACT_SCHEME, ExactXrpPayload, XrpExactError};

use crate::chain::{NATIVE_ASSET, XrpChainReference};
#[cfg(feature = "facilitator")]
use crate::chain::XrpChainProvider;

pub struct XrpExact;

impl XrpExact {
    /// Builds a price tag for a fixed amount of native XRP, denominated in
    /// drops, on the given network.
    pub fn price_tag(
        pay_to: impl Into<String>,
        chain_reference: XrpChainReference,
        amount_drops: u128,
    ) -> PriceTag {
        PriceTag::new(
            EXACT_SCHEME,
            chain_reference.into(),
            pay_to.into(),
            NATIVE_ASSET.to_string(),
            amount_drops,
        )
    }
}

impl X402SchemeId for XrpExact {
    fn namespace(&self) -> &str {
        "xrp"
    }
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }
}

#[cfg(feature = "facilitator")]
impl X402SchemeFacilitatorBuilder<std::sync::Arc<XrpChainProvider>> for XrpExact {
    fn build(
        &self,
        provider: std::sync::Arc<XrpChainProvider>,
        _config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        Ok(Box::new(XrpExactFacilitator::new(provider)))
    }
}

//! The `exact` payment scheme for EIP-155 (EVM) chains: a fixed-amount
//! ERC-3009 `transferWithAuthorization` payment, authorized off-chain by the
//! payer and settled on-chain by the facilitator.

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "facilitator")]
pub mod facilitator;
pub mod types;

use alloy_primitives::U256;
use x402_types::chain::{ChainId, DeployedTokenAmount};
use x402_types::proto::{PriceTag, SchemeExtra};
#[cfg(feature = "facilitator")]
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorBuilder};
use x402_types::scheme::X402SchemeId;

#[cfg(feature = "facilitator")]
pub use facilitator::Eip155ExactFacilitator;
pub use types::{EXACT_SCHEME, Eip155ExactError, ExactEvmPayload, ExactEvmPayloadAuthorization};

#[cfg(feature = "facilitator")]
use crate::chain::Eip155MetaTransactionProvider;
use crate::chain::Eip155TokenDeployment;
#[cfg(feature = "facilitator")]
use crate::chain::ChainProviderOps;

pub struct Eip155Exact;

impl Eip155Exact {
    /// Builds a price tag for a fixed amount of a token deployed on an EVM
    /// chain, carrying the EIP-712 domain name/version in `extra` so
    /// clients don't need to query the token contract for them.
    pub fn price_tag<A: Into<crate::chain::ChecksummedAddress>>(
        pay_to: A,
        asset: DeployedTokenAmount<U256, Eip155TokenDeployment>,
    ) -> PriceTag {
        let chain_id: ChainId = asset.token.chain_reference.into();
        let extra = match asset.token.transfer_method {
            crate::chain::AssetTransferMethod::Eip3009 { name, version } => {
                Some(SchemeExtra::EvmDomain { name, version })
            }
            crate::chain::AssetTransferMethod::Permit2 => None,
        };
        let mut tag = PriceTag::new(
            EXACT_SCHEME,
            chain_id,
            pay_to.into().to_string(),
            asset.token.address.to_string(),
            asset.amount.to::<u128>(),
        );
        tag.extra = extra;
        tag
    }
}

impl X402SchemeId for Eip155Exact {
    fn namespace(&self) -> &str {
        "eip155"
    }
    fn scheme(&self) -> &str {
        EXACT_SCHEME
    }
}

#[cfg(feature = "facilitator")]
impl<P> X402SchemeFacilitatorBuilder<P> for Eip155Exact
where
    P: Eip155MetaTransactionProvider + ChainProviderOps + Send + Sync + 'static,
    P::Inner: alloy_provider::Provider + Clone,
    P::Error: std::fmt::Display,
{
    fn build(
        &self,
        provider: P,
        _config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        Ok(Box::new(Eip155ExactFacilitator::new(provider)))
    }
}

//! Scheme builder implementations for the x402 facilitator.
//!
//! This module provides [`X402SchemeFacilitatorBuilder`] implementations for all supported
//! payment schemes. These builders create scheme facilitators from the generic
//! [`ChainProvider`] enum by extracting the appropriate
//! chain-specific provider.
//!
//! # Supported Schemes
//!
//! | Scheme          | Chains        | Description                              |
//! |-----------------|---------------|-------------------------------------------|
//! | [`Eip155Exact`] | EIP-155 (EVM) | ERC-3009 exact-amount payment on EVM      |
//! | [`SolanaExact`] | Solana        | SPL Token exact-amount payment on Solana  |
//! | `XrpExact`      | XRP Ledger    | Native-currency payment on the XRP Ledger |
//! | `LightningExact`| Lightning     | BOLT11 invoice payment                    |
//!
//! # Example
//!
//! ```ignore
//! use x402_types::scheme::{SchemeBlueprints, X402SchemeFacilitatorBuilder};
//! use x402_chain_eip155::Eip155Exact;
//! use crate::chain::ChainProvider;
//!
//! // Register schemes
//! let blueprints = SchemeBlueprints::new()
//!     .and_register(Eip155Exact)
//!     .and_register(SolanaExact);
//! ```

#[allow(unused_imports)] // For when no chain features are enabled
use crate::chain::ChainProvider;
#[allow(unused_imports)] // For when no chain features are enabled
use std::sync::Arc;
#[allow(unused_imports)] // For when no chain features are enabled
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorBuilder};

#[cfg(feature = "chain-eip155")]
use x402_chain_eip155::Eip155Exact;
#[cfg(feature = "chain-lightning")]
use x402_chain_lightning::LightningExact;
#[cfg(feature = "chain-solana")]
use x402_chain_solana::SolanaExact;
#[cfg(feature = "chain-xrp")]
use x402_chain_xrp::XrpExact;

#[cfg(feature = "chain-solana")]
impl X402SchemeFacilitatorBuilder<&ChainProvider> for SolanaExact {
    fn build(
        &self,
        provider: &ChainProvider,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        #[allow(irrefutable_let_patterns)] // For when just chain-eip155 is enabled
        let solana_provider = if let ChainProvider::Solana(provider) = provider {
            Arc::clone(provider)
        } else {
            return Err("SolanaExact::build: provider must be a SolanaChainProvider".into());
        };
        self.build(solana_provider, config)
    }
}

#[cfg(feature = "chain-eip155")]
impl X402SchemeFacilitatorBuilder<&ChainProvider> for Eip155Exact {
    fn build(
        &self,
        provider: &ChainProvider,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        #[allow(irrefutable_let_patterns)] // For when just chain-solana is enabled
        let eip155_provider = if let ChainProvider::Eip155(provider) = provider {
            Arc::clone(provider)
        } else {
            return Err("Eip155Exact::build: provider must be an Eip155ChainProvider".into());
        };
        self.build(eip155_provider, config)
    }
}

#[cfg(feature = "chain-xrp")]
impl X402SchemeFacilitatorBuilder<&ChainProvider> for XrpExact {
    fn build(
        &self,
        provider: &ChainProvider,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        #[allow(irrefutable_let_patterns)] // For when just chain-xrp is enabled
        let xrp_provider = if let ChainProvider::Xrp(provider) = provider {
            Arc::clone(provider)
        } else {
            return Err("XrpExact::build: provider must be an XrpChainProvider".into());
        };
        self.build(xrp_provider, config)
    }
}

#[cfg(feature = "chain-lightning")]
impl X402SchemeFacilitatorBuilder<&ChainProvider> for LightningExact {
    fn build(
        &self,
        provider: &ChainProvider,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        #[allow(irrefutable_let_patterns)] // For when just chain-lightning is enabled
        let lightning_provider = if let ChainProvider::Lightning(provider) = provider {
            Arc::clone(provider)
        } else {
            return Err("LightningExact::build: provider must be a LightningChainProvider".into());
        };
        self.build(lightning_provider, config)
    }
}

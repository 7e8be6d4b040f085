//! Blockchain-specific types and providers for x402 payment processing.
//!
//! This module provides abstractions for interacting with different blockchain networks
//! in the x402 protocol. It supports multiple payment rails:
//!
//! - **EIP-155 (EVM)**: Ethereum and EVM-compatible chains like Base, Polygon, Avalanche
//! - **Solana**: The Solana blockchain
//! - **XRP Ledger**: Native currency payments
//! - **Lightning**: BOLT11 invoice payments
//!
//! # Architecture
//!
//! The module is organized around the concept of chain providers and chain identifiers:
//!
//! - [`ChainId`] - A CAIP-2 compliant chain identifier (e.g., `eip155:8453` for Base)
//! - [`ChainProvider`] - Enum wrapping chain-specific providers
//! - [`ChainRegistry`] - Registry of configured chain providers
//!
//! # Example
//!
//! ```ignore
//! use x402_types::chain::{ChainId, ChainIdPattern};
//!
//! // Create a specific chain ID
//! let base = ChainId::new("eip155", "8453");
//!
//! // Create a pattern that matches all EVM chains
//! let all_evm = ChainIdPattern::wildcard("eip155");
//! assert!(all_evm.matches(&base));
//!
//! // Create a pattern for specific chains
//! let mainnet_chains = ChainIdPattern::set("eip155", ["1", "8453", "137"].into_iter().map(String::from).collect());
//! assert!(mainnet_chains.matches(&base));
//! ```

use std::collections::HashMap;
#[cfg(any(
    feature = "chain-eip155",
    feature = "chain-solana",
    feature = "chain-xrp",
    feature = "chain-lightning"
))]
use std::sync::Arc;
#[cfg(feature = "chain-eip155")]
use x402_chain_eip155::chain as eip155;
#[cfg(feature = "chain-lightning")]
use x402_chain_lightning::chain as lightning;
#[cfg(feature = "chain-solana")]
use x402_chain_solana::chain as solana;
#[cfg(feature = "chain-xrp")]
use x402_chain_xrp::chain as xrp;
use x402_types::chain::{ChainId, ChainProviderOps, ChainRegistry, FromConfig};

use crate::config::{ChainConfig, ChainsConfig};

/// A blockchain provider that can interact with any of the supported payment rails.
///
/// This enum wraps chain-specific providers and provides a unified interface
/// for the facilitator to interact with different blockchain networks.
///
/// # Variants
///
/// - `Eip155` - Provider for EVM-compatible chains (Ethereum, Base, Polygon, etc.)
/// - `Solana` - Provider for the Solana blockchain
/// - `Xrp` - Provider for the XRP Ledger
/// - `Lightning` - Provider for the Lightning Network
#[derive(Debug, Clone)]
pub enum ChainProvider {
    /// EVM chain provider for EIP-155 compatible networks.
    #[cfg(feature = "chain-eip155")]
    Eip155(Arc<eip155::Eip155ChainProvider>),
    /// Solana chain provider.
    #[cfg(feature = "chain-solana")]
    Solana(Arc<solana::SolanaChainProvider>),
    /// XRP Ledger chain provider.
    #[cfg(feature = "chain-xrp")]
    Xrp(Arc<xrp::XrpChainProvider>),
    /// Lightning Network chain provider.
    #[cfg(feature = "chain-lightning")]
    Lightning(Arc<lightning::LightningChainProvider>),
}

/// Creates a new chain provider from configuration.
///
/// This factory method inspects the configuration type and creates the appropriate
/// chain-specific provider.
///
/// # Errors
///
/// Returns an error if:
/// - RPC connection fails
/// - Signer configuration is invalid
/// - Required configuration is missing
#[async_trait::async_trait]
impl FromConfig<ChainConfig> for ChainProvider {
    async fn from_config(chains: &ChainConfig) -> Result<Self, Box<dyn std::error::Error>> {
        #[allow(unused_variables)] // For when no chain features enabled
        let provider = match chains {
            #[cfg(feature = "chain-eip155")]
            ChainConfig::Eip155(config) => {
                let provider = eip155::Eip155ChainProvider::from_config(config).await?;
                ChainProvider::Eip155(Arc::new(provider))
            }
            #[cfg(feature = "chain-solana")]
            ChainConfig::Solana(config) => {
                let provider = solana::SolanaChainProvider::from_config(config).await?;
                ChainProvider::Solana(Arc::new(provider))
            }
            #[cfg(feature = "chain-xrp")]
            ChainConfig::Xrp(config) => {
                let provider = xrp::XrpChainProvider::from_config(config).await?;
                ChainProvider::Xrp(Arc::new(provider))
            }
            #[cfg(feature = "chain-lightning")]
            ChainConfig::Lightning(config) => {
                let lookup: Arc<dyn x402_chain_lightning::exact::InvoiceLookup> =
                    Arc::new(x402_chain_lightning::exact::UnverifiedInvoiceLookup);
                let provider = lightning::LightningChainProvider::new(config.chain_id(), lookup);
                ChainProvider::Lightning(Arc::new(provider))
            }
            #[allow(unreachable_patterns)] // For when no chain features enabled
            _ => unreachable!("ChainConfig variant not enabled in this build"),
        };
        #[allow(unreachable_code)] // For when no chain features enabled
        Ok(provider)
    }
}

impl ChainProviderOps for ChainProvider {
    fn signer_addresses(&self) -> Vec<String> {
        match self {
            #[cfg(feature = "chain-eip155")]
            ChainProvider::Eip155(provider) => provider.signer_addresses(),
            #[cfg(feature = "chain-solana")]
            ChainProvider::Solana(provider) => provider.signer_addresses(),
            #[cfg(feature = "chain-xrp")]
            ChainProvider::Xrp(provider) => provider.signer_addresses(),
            #[cfg(feature = "chain-lightning")]
            ChainProvider::Lightning(provider) => provider.signer_addresses(),
            #[allow(unreachable_patterns)] // For when no chain features enabled
            _ => unreachable!("ChainProvider variant not enabled in this build"),
        }
    }

    fn chain_id(&self) -> ChainId {
        match self {
            #[cfg(feature = "chain-eip155")]
            ChainProvider::Eip155(provider) => provider.chain_id(),
            #[cfg(feature = "chain-solana")]
            ChainProvider::Solana(provider) => provider.chain_id(),
            #[cfg(feature = "chain-xrp")]
            ChainProvider::Xrp(provider) => provider.chain_id(),
            #[cfg(feature = "chain-lightning")]
            ChainProvider::Lightning(provider) => provider.chain_id(),
            #[allow(unreachable_patterns)] // For when no chain features enabled
            _ => unreachable!("ChainProvider variant not enabled in this build"),
        }
    }
}

/// Creates a new chain registry from configuration.
///
/// Initializes providers for all configured chains. Each chain configuration
/// is processed and a corresponding provider is created and stored.
///
/// # Errors
///
/// Returns an error if any chain provider fails to initialize.
#[async_trait::async_trait]
impl FromConfig<ChainsConfig> for ChainRegistry<ChainProvider> {
    async fn from_config(chains: &ChainsConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let mut providers = HashMap::new();
        for chain in chains.iter() {
            let chain_provider = ChainProvider::from_config(chain).await?;
            providers.insert(chain_provider.chain_id(), chain_provider);
        }
        Ok(Self::new(providers))
    }
}

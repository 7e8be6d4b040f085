//! Lightning chain-reference and provider plumbing.

pub mod config;
#[cfg(feature = "facilitator")]
pub mod provider;

pub use config::LightningChainConfig;
#[cfg(feature = "facilitator")]
pub use provider::LightningChainProvider;

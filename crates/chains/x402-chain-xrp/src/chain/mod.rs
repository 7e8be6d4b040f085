//! XRP Ledger chain support for x402 payments.
//!
//! This module provides types and a provider for interacting with the XRP
//! Ledger in the x402 protocol. The `exact` scheme on this rail authorizes a
//! native-currency `Payment` transaction, signed by the payer and submitted
//! by the facilitator — there is no on-chain authorization step comparable to
//! ERC-3009 or an SPL Token instruction, just a pre-signed transaction blob.
//!
//! # Submodules
//!
//! - [`types`] - [`XrpChainReference`](types::XrpChainReference), [`Address`](types::Address)
//! - [`rpc`] - JSON-RPC transport to a `rippled` server
//! - [`config`] - facilitator-side chain configuration
//! - [`provider`] - the facilitator's XRPL provider

#[cfg(feature = "facilitator")]
pub mod config;

#[cfg(feature = "facilitator")]
pub mod provider;
#[cfg(feature = "facilitator")]
pub use provider::*;

pub mod rpc;

pub mod types;
pub use types::*;

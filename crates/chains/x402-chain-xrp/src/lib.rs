//! XRP Ledger chain support for the x402 payment protocol.
//!
//! This crate provides an implementation of the x402 payment protocol for the
//! XRP Ledger, with the "exact" payment scheme based on a pre-signed native
//! currency `Payment` transaction. Unlike the EVM/Solana rails, the
//! facilitator on this chain never holds a signing key: the client signs the
//! transaction itself, and the facilitator only verifies and submits it.
//!
//! # Architecture
//!
//! - [`chain`] - Core XRP Ledger types, JSON-RPC transport, and configuration
//! - [`exact`] - The "exact" payment scheme: client signing, facilitator verify/settle
//!
//! # Feature Flags
//!
//! - `client` - Client-side payment signing
//! - `facilitator` - Facilitator-side payment verification and settlement
//! - `telemetry` - OpenTelemetry tracing support
//!
//! # Usage Examples
//!
//! ## Server: Creating a Price Tag
//!
//! ```ignore
//! use x402_chain_xrp::{XrpExact, KnownNetworkXrp};
//! use x402_types::chain::ChainId;
//!
//! let chain: ChainId = x402_chain_xrp::chain::XrpChainReference::mainnet().into();
//! let price_tag = XrpExact::price_tag("rPT1Sjq2YGrBMTttX4GZHjKu9dyfzbpAYe", chain, 1_000_000);
//! ```
//!
//! ## Client: Signing a Payment
//!
//! ```ignore
//! use x402_chain_xrp::XrpExactClient;
//!
//! let client = XrpExactClient::new(seed, account, rpc_client);
//! let candidates = client.accept(&payment_required);
//! ```
//!
//! ## Facilitator: Verifying and Settling
//!
//! ```ignore
//! use x402_chain_xrp::{XrpExact, chain::XrpChainProvider};
//! use x402_types::chain::FromConfig;
//! use x402_types::scheme::X402SchemeFacilitatorBuilder;
//!
//! let provider = XrpChainProvider::from_config(&config).await?;
//! let facilitator = XrpExact.build(provider, None)?;
//!
//! let verify_response = facilitator.verify(&verify_request).await?;
//! let settle_response = facilitator.settle(&settle_request).await?;
//! ```

pub mod chain;
pub mod exact;

mod networks;
pub use networks::*;

pub use exact::XrpExact;

#[cfg(feature = "client")]
pub use exact::client::XrpExactClient;

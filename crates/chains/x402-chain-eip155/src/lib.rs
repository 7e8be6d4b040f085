//! EIP-155 (EVM) chain support for the x402 payment protocol.
//!
//! This crate provides implementations of the x402 payment protocol for EVM-compatible
//! blockchains using the EIP-155 chain ID standard, with the "exact" payment scheme
//! based on ERC-3009 `transferWithAuthorization`.
//!
//! # Features
//!
//! - **ERC-3009 Payments**: Gasless token transfers using `transferWithAuthorization`
//! - **Multiple Signers**: Round-robin signer selection for load distribution
//! - **Nonce Management**: Automatic nonce tracking with pending transaction awareness
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`chain`] - Core EVM chain types, providers, and configuration
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
//! use x402_chain_eip155::{Eip155Exact, KnownNetworkEip155};
//! use x402_types::networks::USDC;
//!
//! let usdc = USDC::base();
//! let price_tag = Eip155Exact::price_tag(
//!     "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
//!     usdc.amount(1_000_000u64),
//! );
//! ```
//!
//! ## Client: Signing a Payment
//!
//! ```ignore
//! use x402_chain_eip155::Eip155ExactClient;
//! use alloy_signer_local::PrivateKeySigner;
//!
//! let signer = PrivateKeySigner::random();
//! let client = Eip155ExactClient::new(signer);
//! let candidates = client.accept(&payment_required);
//! ```
//!
//! ## Facilitator: Verifying and Settling
//!
//! ```ignore
//! use x402_chain_eip155::{Eip155Exact, Eip155ChainProvider};
//! use x402_types::scheme::X402SchemeFacilitatorBuilder;
//!
//! let provider = Eip155ChainProvider::from_config(&config).await?;
//! let facilitator = Eip155Exact.build(provider, None)?;
//!
//! let verify_response = facilitator.verify(&verify_request).await?;
//! let settle_response = facilitator.settle(&settle_request).await?;
//! ```

pub mod chain;
pub mod exact;

mod networks;
pub use networks::*;

pub use exact::Eip155Exact;

#[cfg(feature = "client")]
pub use exact::client::Eip155ExactClient;

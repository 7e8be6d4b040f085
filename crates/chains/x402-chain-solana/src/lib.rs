#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Solana chain support for the x402 payment protocol.
//!
//! This crate provides implementations of the x402 payment protocol for the
//! Solana blockchain, with the "exact" payment scheme based on SPL Token /
//! Token-2022 `TransferChecked` with pre-signed transaction authorization.
//!
//! # Features
//!
//! - **SPL Token Payments**: Token transfers using pre-signed transaction authorization
//! - **Compute Budget Management**: Automatic compute unit limit and price configuration
//! - **WebSocket Support**: Optional pubsub for faster transaction confirmation
//! - **Balance Verification**: On-chain balance checks before settlement
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`chain`] - Core Solana chain types, providers, and configuration
//! - [`exact`] - The "exact" payment scheme: client signing, facilitator verify/settle
//!
//! # Feature Flags
//!
//! - `server` - Server-side price tag generation
//! - `client` - Client-side payment signing
//! - `facilitator` - Facilitator-side payment verification and settlement
//! - `telemetry` - OpenTelemetry tracing support
//!
//! # Usage Examples
//!
//! ## Server: Creating a Price Tag
//!
//! ```ignore
//! use x402_chain_solana::{SolanaExact, KnownNetworkSolana};
//! use x402_types::networks::USDC;
//!
//! let usdc = USDC::solana();
//! let price_tag = SolanaExact::price_tag(
//!     "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
//!     usdc.amount(1_000_000u64),
//! );
//! ```
//!
//! ## Client: Signing a Payment
//!
//! ```ignore
//! use x402_chain_solana::SolanaExactClient;
//! use solana_keypair::Keypair;
//!
//! let keypair = Keypair::new();
//! let client = SolanaExactClient::new(keypair, rpc_client);
//! let candidates = client.accept(&payment_required);
//! ```
//!
//! ## Facilitator: Verifying and Settling
//!
//! ```ignore
//! use x402_chain_solana::{SolanaExact, SolanaChainProvider};
//! use x402_types::scheme::X402SchemeFacilitatorBuilder;
//!
//! let provider = SolanaChainProvider::from_config(&config).await?;
//! let facilitator = SolanaExact.build(provider, None)?;
//!
//! let verify_response = facilitator.verify(&verify_request).await?;
//! let settle_response = facilitator.settle(&settle_request).await?;
//! ```

pub mod chain;
pub mod exact;

mod networks;
pub use networks::*;

pub use exact::SolanaExact;

#[cfg(feature = "client")]
pub use exact::client::SolanaExactClient;

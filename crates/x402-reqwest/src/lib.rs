#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Reqwest middleware for automatic [x402](https://www.x402.org) payment handling.
//!
//! This crate provides [`X402Payments`], a `reqwest` middleware that automatically
//! handles `402 Payment Required` responses. When a request receives a 402 response,
//! the middleware extracts payment requirements, signs a payment using a registered
//! scheme client, and retries the request with the `X-Payment` header.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use x402_reqwest::{ReqwestWithPayments, ReqwestWithPaymentsBuild, X402Payments};
//! use x402_chain_eip155::exact::client::Eip155ExactClient;
//! use alloy_signer_local::PrivateKeySigner;
//! use reqwest::Client;
//!
//! // Create x402 payments middleware and register scheme clients
//! let signer = "PRIVATE_KEY".parse::<PrivateKeySigner>().unwrap();
//! let x402_payments = X402Payments::new()
//!     .register(Eip155ExactClient::new(signer));
//!
//! // Build a reqwest client with x402 middleware
//! let http_client = Client::new()
//!     .with_payments(x402_payments)
//!     .build();
//!
//! // Use the client - payments are handled automatically
//! let response = http_client
//!     .get("https://api.example.com/protected")
//!     .send()
//!     .await?;
//! ```
//!
//! ## Registering Scheme Clients
//!
//! [`X402Payments`] uses a plugin architecture for supporting different payment
//! schemes and rails. Register one [`x402_types::scheme::client::X402SchemeClient`]
//! per chain/network you want to support -- `x402-chain-eip155`, `x402-chain-solana`,
//! `x402-chain-xrp` and `x402-chain-lightning` each expose one under `exact::client`.
//!
//! See [`X402Payments::register`] for more details.
//!
//! ## Payment Selection
//!
//! When multiple payment options are available, [`X402Payments`] uses a
//! [`x402_types::scheme::client::PaymentSelector`] to choose the best option. By
//! default it uses `FirstMatch`, which selects the first matching scheme. You can
//! implement custom selection logic by providing your own selector via
//! [`X402Payments::with_selector`].
//!
//! ## Wallet Policy
//!
//! [`WalletPolicy`] bounds what the middleware is willing to sign, per chain and
//! per asset, before a candidate is ever selected or signed. See
//! [`X402Payments::max`] and [`X402Payments::with_policy`].

mod builder;
mod client;
mod http_transport;
mod wallet_policy;

pub use builder::*;
pub use client::*;
pub use wallet_policy::WalletPolicy;

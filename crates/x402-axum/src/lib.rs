#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Axum middleware for enforcing [x402](https://www.x402.org) payments on protected routes.
//!
//! This middleware validates incoming payment headers using a configured x402 facilitator,
//! and settles valid payments either before or after request execution (configurable).
//!
//! Returns a `402 Payment Required` response if the request lacks a valid payment -- a JSON
//! body for API clients, or a paywall HTML page for browsers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum::response::IntoResponse;
//! use http::StatusCode;
//! use x402_types::chain::ChainId;
//! use x402_types::proto::PriceTag;
//! use x402_axum::X402Middleware;
//!
//! let x402 = X402Middleware::try_from("https://facilitator.x402.rs").unwrap();
//! let network = ChainId::new("eip155", "84532");
//! let price_tag = PriceTag::new("exact", network, "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", "0xUSDC", 10_000);
//!
//! let app: Router = Router::new().route(
//!     "/protected",
//!     get(my_handler).layer(x402.with_price_tag(vec![price_tag])),
//! );
//!
//! async fn my_handler() -> impl IntoResponse {
//!     (StatusCode::OK, "This is VIP content!")
//! }
//! ```
//!
//! See [`X402Middleware`] for full configuration options.
//! For low-level interaction with the facilitator, see [`facilitator_client::FacilitatorClient`].
//!
//! ## Dynamic Pricing
//!
//! For dynamic pricing based on request context, use [`paygate::DynamicPriceTags`] together
//! with [`paygate::Paygate`] directly rather than the static [`X402Middleware::with_price_tag`].
//!
//! ## Settlement Timing
//!
//! By default, settlement occurs **after** the request is processed. You can change this:
//!
//! - **[`X402Middleware::settle_before_execution`]** - Settle payment **before** request execution.
//!   This prevents issues where failed settlements need retry or authorization expires.
//! - **[`X402Middleware::settle_after_execution`]** - Settle payment **after** request execution (default).
//!   This allows processing the request before committing the payment on-chain.
//!
//! ## Configuration Notes
//!
//! - **[`X402Middleware::with_price_tag`]** sets the assets and amounts accepted for payment.
//! - **[`X402Middleware::with_base_url`]** sets the base URL for computing full resource URLs.
//!   If not set, defaults to `http://localhost/` (avoid in production).
//! - **[`X402Middleware::with_description`]** is optional but helps the payer understand what is being paid for.
//! - **[`X402Middleware::with_mime_type`]** sets the MIME type of the protected resource (default: `application/json`).
//! - **[`X402Middleware::with_resource`]** explicitly sets the full URI of the protected resource.

pub mod facilitator_client;
pub mod layer;
pub mod paygate;

pub use layer::{X402Middleware, X402MiddlewareService};
pub use paygate::{DynamicPriceTags, Paygate, PriceTagSource, SettlementTiming, StaticPriceTags};

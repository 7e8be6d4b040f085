//! Lightning Network (BOLT11) chain support for the x402 payment protocol.
//!
//! This crate provides an implementation of the x402 payment protocol for
//! the Lightning Network, with the "exact" payment scheme based on a BOLT11
//! invoice. Settlement is deliberately backend-agnostic: the facilitator
//! delegates to a pluggable [`exact::InvoiceLookup`] port rather than
//! embedding a specific node's RPC client, since LND/CLN/LNbits each expose
//! an incompatible wire format. Without a real node wired in,
//! [`exact::UnverifiedInvoiceLookup`] is available as a PoC-grade stand-in —
//! production deployments must supply a real implementation.
//!
//! # Architecture
//!
//! - [`chain`] - Lightning chain-reference and provider plumbing
//! - [`exact`] - The "exact" payment scheme: client payload assembly, facilitator verify/settle
//!
//! # Feature Flags
//!
//! - `client` - Client-side payment payload assembly
//! - `facilitator` - Facilitator-side payment verification and settlement
//! - `telemetry` - OpenTelemetry tracing support

pub mod chain;
pub mod exact;

mod networks;
pub use networks::*;

pub use exact::LightningExact;

#[cfg(feature = "client")]
pub use exact::client::LightningExactClient;

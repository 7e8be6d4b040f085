#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for the x402 payment protocol.
//!
//! This crate provides the foundational types used throughout the x402 ecosystem
//! for implementing HTTP 402 Payment Required flows. It is designed to be
//! blockchain-agnostic, with chain-specific implementations provided by separate crates.
//!
//! # Overview
//!
//! The x402 protocol enables micropayments over HTTP by leveraging the 402 Payment Required
//! status code. When a client requests a paid resource, the server responds with payment
//! requirements. The client signs a payment authorization, which is verified and settled
//! by a facilitator.
//!
//! # Modules
//!
//! - [`chain`] - Blockchain identifiers and provider abstractions (CAIP-2 chain IDs)
//! - [`config`] - Server configuration, CLI parsing, RPC config, and environment variable resolution
//! - [`extension`] - Optional hooks enriching payment declarations and responses
//! - [`facilitator`] - Core trait for payment verification and settlement
//! - [`networks`] - Registry of well-known blockchain networks
//! - [`proto`] - Wire format types for protocol messages
//! - [`scheme`] - Payment scheme system for extensible payment methods
//! - [`timestamp`] - Unix timestamp utilities for payment authorization windows
//! - [`util`] - Helper types (base64, money amounts)
//!
//! # Wire Protocol
//!
//! There is a single, CAIP-2-addressed wire shape ([`proto`]): networks are
//! identified as `namespace:reference` (e.g. `eip155:8453`), amounts are
//! decimal strings carrying a `u128`, and scheme-specific extras ride in an
//! untagged [`proto::SchemeExtra`] bag on [`proto::PaymentRequirements`].
//!
//! # Feature Flags
//!
//! - `cli` - Enables CLI argument parsing via clap for configuration loading
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod chain;
pub mod config;
pub mod extension;
pub mod facilitator;
pub mod networks;
pub mod proto;
pub mod scheme;
pub mod timestamp;
pub mod util;

//! Payment scheme implementations for x402.
//!
//! This module provides the extensible scheme system that allows different
//! payment methods to be plugged into the x402 protocol. Each scheme defines
//! how payments are authorized, verified, and settled.
//!
//! # Architecture
//!
//! The scheme system has three main components:
//!
//! 1. **Blueprints** ([`SchemeBlueprints`]) - factories that create scheme handlers
//! 2. **Handlers** ([`X402SchemeFacilitator`]) - process verify/settle requests
//! 3. **Registry** ([`SchemeRegistry`]) - maps chain+scheme combinations to handlers
//!
//! Blueprints are generic over the concrete chain provider type
//! ([`X402SchemeFacilitatorBuilder<P>`]), so this crate stays chain-agnostic:
//! the binary that owns a concrete `ChainProvider` enum (e.g. the facilitator)
//! implements the builder trait for each scheme against `&ChainProvider`,
//! extracting the right provider variant before delegating to the scheme's
//! own, chain-specific build method.
//!
//! # Implementing a Custom Scheme
//!
//! 1. Implement [`X402SchemeId`] to identify your scheme.
//! 2. Implement [`X402SchemeFacilitatorBuilder<P>`] for each provider type
//!    you want to support.
//! 3. Implement [`X402SchemeFacilitator`] for the actual verification/
//!    settlement logic.
//! 4. Register the blueprint with [`SchemeBlueprints::register`].

use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::ops::Deref;

use crate::chain::ChainId;
use crate::proto;
use crate::proto::{AsPaymentProblem, ErrorReason, PaymentProblem, PaymentVerificationError};

pub mod client;

/// Trait for scheme handlers that process payment verification and settlement.
#[async_trait::async_trait]
pub trait X402SchemeFacilitator: Send + Sync {
    /// Verifies a payment authorization without settling it.
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError>;

    /// Settles a verified payment on-chain.
    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError>;

    /// Returns the payment methods supported by this handler.
    async fn supported(&self) -> Result<proto::SupportedResponse, X402SchemeFacilitatorError>;
}

/// Marker trait for types that are both identifiable and buildable against
/// provider type `P`.
pub trait X402SchemeBlueprint<P>: X402SchemeId + X402SchemeFacilitatorBuilder<P> {}
impl<P, T> X402SchemeBlueprint<P> for T where T: X402SchemeId + X402SchemeFacilitatorBuilder<P> {}

/// Trait for identifying a payment scheme.
pub trait X402SchemeId {
    /// Returns the chain namespace (e.g. "eip155", "solana", "xrp", "lightning").
    fn namespace(&self) -> &str;
    /// Returns the scheme name (e.g. "exact").
    fn scheme(&self) -> &str;
    /// Returns the full scheme identifier (e.g. "eip155-exact").
    fn id(&self) -> String {
        format!("{}-{}", self.namespace(), self.scheme())
    }
}

/// Trait for building a scheme handler from a provider of type `P`.
///
/// Generic over the provider type so `x402-types` never needs to know about
/// concrete chain providers; a binary owning its own `ChainProvider` enum
/// implements this for `&ChainProvider` per scheme, extracting the variant
/// it needs and delegating to the scheme crate's own provider-specific
/// constructor.
pub trait X402SchemeFacilitatorBuilder<P> {
    fn build(
        &self,
        provider: P,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>>;
}

/// Errors that can occur during scheme operations.
#[derive(Debug, thiserror::Error)]
pub enum X402SchemeFacilitatorError {
    #[error(transparent)]
    PaymentVerification(#[from] PaymentVerificationError),
    #[error("Onchain error: {0}")]
    OnchainFailure(String),
}

impl AsPaymentProblem for X402SchemeFacilitatorError {
    fn as_payment_problem(&self) -> PaymentProblem {
        match self {
            X402SchemeFacilitatorError::PaymentVerification(e) => e.as_payment_problem(),
            X402SchemeFacilitatorError::OnchainFailure(e) => {
                PaymentProblem::new(ErrorReason::UnexpectedError, e.to_string())
            }
        }
    }
}

/// Configuration for a single scheme registration: whether it's enabled,
/// which chains it applies to, and any scheme-specific config blob.
#[derive(Debug, Clone)]
pub struct SchemeConfig {
    pub id: String,
    pub enabled: bool,
    pub chains: crate::chain::ChainIdPattern,
    pub config: Option<serde_json::Value>,
}

/// Registry of scheme blueprints (factories), generic over provider type `P`.
pub struct SchemeBlueprints<P>(HashMap<String, Box<dyn X402SchemeBlueprint<P>>>);

impl<P> Default for SchemeBlueprints<P> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<P> Debug for SchemeBlueprints<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slugs: Vec<String> = self.0.keys().cloned().collect();
        f.debug_tuple("SchemeBlueprints").field(&slugs).finish()
    }
}

impl<P> SchemeBlueprints<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and_register<B: X402SchemeBlueprint<P> + 'static>(mut self, blueprint: B) -> Self {
        self.register(blueprint);
        self
    }

    pub fn register<B: X402SchemeBlueprint<P> + 'static>(&mut self, blueprint: B) {
        self.0.insert(blueprint.id(), Box::new(blueprint));
    }

    pub fn get(&self, id: &str) -> Option<&dyn X402SchemeBlueprint<P>> {
        self.0.get(id).map(|v| v.deref())
    }
}

/// Unique identifier for a scheme handler instance: which chain, which
/// scheme name.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct SchemeHandlerSlug {
    pub chain_id: ChainId,
    pub x402_version: u8,
    pub name: String,
}

impl SchemeHandlerSlug {
    pub fn new(chain_id: ChainId, x402_version: u8, name: String) -> Self {
        Self {
            chain_id,
            x402_version,
            name,
        }
    }
}

impl Display for SchemeHandlerSlug {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:v{}:{}",
            self.chain_id, self.x402_version, self.name
        )
    }
}

/// Registry of active scheme handlers, built from blueprints and chain
/// providers based on configuration.
#[derive(Default)]
pub struct SchemeRegistry(HashMap<SchemeHandlerSlug, Box<dyn X402SchemeFacilitator>>);

impl Debug for SchemeRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let slugs: Vec<String> = self.0.keys().map(|s| s.to_string()).collect();
        f.debug_tuple("SchemeRegistry").field(&slugs).finish()
    }
}

impl SchemeRegistry {
    /// Builds a scheme registry from blueprints and configuration.
    ///
    /// For each enabled scheme in the config, finds the matching blueprint
    /// and every chain provider whose id matches the scheme's chain pattern,
    /// then builds a handler for each.
    pub fn build<P>(
        chains: &crate::chain::ChainRegistry<P>,
        blueprints: &SchemeBlueprints<P>,
        config: &[SchemeConfig],
    ) -> Self
    where
        P: crate::chain::ChainProviderOps + Clone,
    {
        let mut handlers = HashMap::with_capacity(config.len());
        for config in config {
            if !config.enabled {
                tracing::info!("Skipping disabled scheme {}", config.id);
                continue;
            }
            let blueprint = match blueprints.get(&config.id) {
                Some(blueprint) => blueprint,
                None => {
                    tracing::warn!("No scheme registered: {}", config.id);
                    continue;
                }
            };
            let chain_providers = chains.by_chain_id_pattern(&config.chains);
            if chain_providers.is_empty() {
                tracing::warn!("No chain provider found for {}", config.chains);
                continue;
            }
            for chain_provider in chain_providers {
                let chain_id = chain_provider.chain_id();
                let handler = match blueprint.build(chain_provider.clone(), config.config.clone())
                {
                    Ok(handler) => handler,
                    Err(err) => {
                        tracing::error!("Error building scheme handler for {}: {}", config.id, err);
                        continue;
                    }
                };
                let slug = SchemeHandlerSlug::new(chain_id.clone(), 1, blueprint.scheme().to_string());
                tracing::info!(chain_id = %chain_id, scheme = %blueprint.scheme(), id = blueprint.id(), "Registered scheme handler");
                handlers.insert(slug, handler);
            }
        }
        Self(handlers)
    }

    pub fn by_slug(&self, slug: &SchemeHandlerSlug) -> Option<&dyn X402SchemeFacilitator> {
        let handler = self.0.get(slug)?.deref();
        Some(handler)
    }

    pub fn values(&self) -> impl Iterator<Item = &dyn X402SchemeFacilitator> {
        self.0.values().map(|v| v.deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_handler_slug_display() {
        let slug = SchemeHandlerSlug::new(ChainId::new("eip155", "8453"), 1, "exact".into());
        assert_eq!(slug.to_string(), "eip155:8453:v1:exact");
    }
}

//! Extension framework: optional hooks that enrich payment declarations and
//! responses without touching the core verify/settle contract.
//!
//! Grounded on the permit2 authorization/witness shape
//! (`x402-chain-eip155::chain::permit2`), which already threads optional,
//! scheme-specific enrichment data alongside a payment requirement —
//! generalized here into a standing [`Extension`] trait with named hooks,
//! run in registration order by an [`ExtensionRegistry`] the resource-server
//! engine and facilitator both hold.
//!
//! A hook that errors is logged and simply contributes nothing; extension
//! failure never fails the payment flow.

pub mod eip2612_gas_sponsoring;
pub mod facilitator_fees;
pub mod offer_receipt;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proto::{PaymentRequirements, SettleResponse};

pub use eip2612_gas_sponsoring::Eip2612GasSponsoring;
pub use facilitator_fees::FacilitatorFees;
pub use offer_receipt::OfferReceipt;

/// Transport-level context available to extension hooks.
///
/// Extensions that need to correlate declaration-time state with
/// settlement-time state (e.g. an offer signed against a specific resource
/// URL) capture it themselves; this struct only carries what's common to
/// every hook invocation.
#[derive(Debug, Clone, Default)]
pub struct ExtensionContext {
    pub resource: String,
}

/// One extension's contribution to a response, merged under its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub info: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
#[error("extension hook failed: {0}")]
pub struct ExtensionError(pub String);

/// A named hook set enriching payment declarations and responses.
///
/// Every method defaults to a no-op so an extension only implements the
/// hooks it needs.
#[async_trait::async_trait]
pub trait Extension: Send + Sync {
    /// Key this extension's contributions are nested under in `extensions`.
    fn key(&self) -> &'static str;

    async fn enrich_declaration(
        &self,
        requirements: PaymentRequirements,
        _context: &ExtensionContext,
    ) -> Result<PaymentRequirements, ExtensionError> {
        Ok(requirements)
    }

    async fn enrich_payment_required_response(
        &self,
        _context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        Ok(None)
    }

    async fn enrich_settlement_response(
        &self,
        _settlement: &SettleResponse,
        _context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        Ok(None)
    }
}

/// Holds the registered extensions and runs their hooks in order.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: Arc<dyn Extension>) -> &mut Self {
        self.extensions.push(extension);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub async fn enrich_declaration(
        &self,
        mut requirements: PaymentRequirements,
        context: &ExtensionContext,
    ) -> PaymentRequirements {
        for ext in &self.extensions {
            match ext.enrich_declaration(requirements.clone(), context).await {
                Ok(enriched) => requirements = enriched,
                Err(err) => {
                    tracing::warn!(extension = ext.key(), error = %err, "extension declaration hook failed");
                }
            }
        }
        requirements
    }

    pub async fn enrich_payment_required(
        &self,
        context: &ExtensionContext,
    ) -> BTreeMap<String, ExtensionInfo> {
        let mut out = BTreeMap::new();
        for ext in &self.extensions {
            match ext.enrich_payment_required_response(context).await {
                Ok(Some(info)) => {
                    out.insert(ext.key().to_string(), info);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(extension = ext.key(), error = %err, "extension 402 hook failed");
                }
            }
        }
        out
    }

    pub async fn enrich_settlement(
        &self,
        settlement: &SettleResponse,
        context: &ExtensionContext,
    ) -> BTreeMap<String, ExtensionInfo> {
        let mut out = BTreeMap::new();
        for ext in &self.extensions {
            match ext
                .enrich_settlement_response(settlement, context)
                .await
            {
                Ok(Some(info)) => {
                    out.insert(ext.key().to_string(), info);
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(extension = ext.key(), error = %err, "extension settlement hook failed");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainId;

    struct Noop;

    #[async_trait::async_trait]
    impl Extension for Noop {
        fn key(&self) -> &'static str {
            "noop"
        }
    }

    fn sample_requirements() -> PaymentRequirements {
        PaymentRequirements {
            scheme: "exact".to_string(),
            network: ChainId::new("eip155", "8453"),
            max_amount_required: 1_000,
            resource: "https://example.com/resource".to_string(),
            description: "".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: "0xpayto".to_string(),
            max_timeout_seconds: 60,
            asset: "0xasset".to_string(),
            output_schema: None,
            extra: None,
        }
    }

    #[tokio::test]
    async fn empty_registry_passes_requirements_through_unchanged() {
        let registry = ExtensionRegistry::new();
        let context = ExtensionContext {
            resource: "https://example.com/resource".to_string(),
        };
        let requirements = sample_requirements();
        let enriched = registry
            .enrich_declaration(requirements.clone(), &context)
            .await;
        assert_eq!(enriched, requirements);
    }

    #[tokio::test]
    async fn noop_extension_contributes_nothing_to_402() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Arc::new(Noop));
        let context = ExtensionContext::default();
        let info = registry.enrich_payment_required(&context).await;
        assert!(info.is_empty());
    }
}

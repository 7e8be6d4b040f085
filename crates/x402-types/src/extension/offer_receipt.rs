//! `offer-receipt`: attaches a signed offer to each 402 requirement and a
//! signed receipt to settlement — the only extension in this crate that
//! produces an independently-verifiable, trustless settlement record.
//! Every other standard extension here is best-effort/advisory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::proto::SettleResponse;

use super::{Extension, ExtensionContext, ExtensionError, ExtensionInfo};

/// How a signed offer or receipt is produced.
#[derive(Clone)]
pub enum SigningMethod {
    /// JWS over the canonical JSON payload.
    Jws {
        key_id: String,
        algorithm: String,
        sign: std::sync::Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>,
    },
    /// EIP-712 typed-data signature.
    Eip712 {
        chain_id: u64,
        sign: std::sync::Arc<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>,
    },
}

impl std::fmt::Debug for SigningMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningMethod::Jws { key_id, algorithm, .. } => f
                .debug_struct("Jws")
                .field("key_id", key_id)
                .field("algorithm", algorithm)
                .finish(),
            SigningMethod::Eip712 { chain_id, .. } => {
                f.debug_struct("Eip712").field("chain_id", chain_id).finish()
            }
        }
    }
}

/// A signed offer attached to a single `PaymentRequirements` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedOffer {
    pub resource: String,
    pub signature: String,
}

/// A signed receipt attached to a settlement response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedReceipt {
    pub resource: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<String>,
    pub signature: String,
}

/// Signs offers and settlement receipts so either side can later prove the
/// server actually quoted a price and the facilitator actually settled it.
pub struct OfferReceipt {
    method: SigningMethod,
    /// Whether receipts include the on-chain transaction hash. Off by
    /// default: a receipt is often shared with third parties and the
    /// transaction hash links it to an on-chain identity.
    include_transaction_hash: bool,
}

impl OfferReceipt {
    pub fn new(method: SigningMethod) -> Self {
        Self {
            method,
            include_transaction_hash: false,
        }
    }

    pub fn with_transaction_hash(mut self, include: bool) -> Self {
        self.include_transaction_hash = include;
        self
    }

    fn sign(&self, payload: &[u8]) -> String {
        let bytes = match &self.method {
            SigningMethod::Jws { sign, .. } => sign(payload),
            SigningMethod::Eip712 { sign, .. } => sign(payload),
        };
        crate::util::Base64Bytes::encode(bytes).to_string()
    }
}

#[async_trait]
impl Extension for OfferReceipt {
    fn key(&self) -> &'static str {
        "offer-receipt"
    }

    async fn enrich_payment_required_response(
        &self,
        context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        let signature = self.sign(context.resource.as_bytes());
        let offer = SignedOffer {
            resource: context.resource.clone(),
            signature,
        };
        Ok(Some(ExtensionInfo {
            info: serde_json::to_value(offer)
                .map_err(|err| ExtensionError(err.to_string()))?,
            schema: None,
        }))
    }

    async fn enrich_settlement_response(
        &self,
        settlement: &SettleResponse,
        context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        let transaction = match settlement {
            SettleResponse::Success { transaction, .. } if self.include_transaction_hash => {
                Some(transaction.clone())
            }
            _ => None,
        };
        let payload = json!({ "resource": context.resource, "transaction": transaction });
        let signature = self.sign(
            serde_json::to_vec(&payload)
                .map_err(|err| ExtensionError(err.to_string()))?
                .as_slice(),
        );
        let receipt = SignedReceipt {
            resource: context.resource.clone(),
            transaction,
            signature,
        };
        Ok(Some(ExtensionInfo {
            info: serde_json::to_value(receipt)
                .map_err(|err| ExtensionError(err.to_string()))?,
            schema: None,
        }))
    }
}

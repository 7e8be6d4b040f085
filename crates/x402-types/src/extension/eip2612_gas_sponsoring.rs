//! `eip2612-gas-sponsoring`: the server declares it accepts gas-sponsored
//! payments; the client fills in an EIP-2612 `permit` alongside its payment
//! payload so the facilitator can route settlement through a Permit2 path
//! instead of requiring the payer to hold gas.
//!
//! Grounded on the Permit2 authorization shape already carried by the eip155
//! chain crate (`x402-chain-eip155::chain::permit2::Permit2Authorization`),
//! generalized here into a declaration-only hook: this extension only
//! advertises support, it doesn't validate the client's permit fields
//! itself — that happens in the eip155 scheme facilitator, which is the
//! component that actually knows how to route to the Permit2 proxy.

use async_trait::async_trait;
use serde_json::json;

use super::{Extension, ExtensionContext, ExtensionError, ExtensionInfo};

/// Advertises gas-sponsored EIP-2612 settlement as an option.
pub struct Eip2612GasSponsoring {
    spender: String,
}

impl Eip2612GasSponsoring {
    pub fn new(spender: impl Into<String>) -> Self {
        Self {
            spender: spender.into(),
        }
    }
}

#[async_trait]
impl Extension for Eip2612GasSponsoring {
    fn key(&self) -> &'static str {
        "eip2612-gas-sponsoring"
    }

    async fn enrich_payment_required_response(
        &self,
        _context: &ExtensionContext,
    ) -> Result<Option<ExtensionInfo>, ExtensionError> {
        Ok(Some(ExtensionInfo {
            info: json!({ "spender": self.spender }),
            schema: Some(json!({
                "type": "object",
                "required": ["from", "asset", "spender", "amount", "nonce", "deadline", "signature", "version"],
                "properties": {
                    "from": { "type": "string" },
                    "asset": { "type": "string" },
                    "spender": { "type": "string" },
                    "amount": { "type": "string" },
                    "nonce": { "type": "string" },
                    "deadline": { "type": "integer" },
                    "signature": { "type": "string" },
                    "version": { "type": "string" }
                }
            })),
        }))
    }
}

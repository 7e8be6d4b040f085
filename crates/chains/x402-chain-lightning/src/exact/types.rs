//! Wire payload for the Lightning "exact" scheme: a BOLT11 invoice, with an
//! optional node-specific invoice identifier for nodes that don't expose
//! payment-hash lookup directly.

use serde::{Deserialize, Serialize};
use x402_types::proto::PaymentVerificationError;

pub const EXACT_SCHEME: &str = "exact";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExactLightningPayload {
    pub bolt11: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LightningExactError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("bolt11 invoice is not well-formed: {0}")]
    InvalidInvoice(String),
    #[error("invoice has expired")]
    InvoiceExpired,
    #[error("invoice amount {invoiced} msat does not match required {required} msat")]
    AmountMismatch { invoiced: u64, required: u64 },
    #[error("invoice lookup failed: {0}")]
    LookupFailed(String),
    #[error("invoice is not settled")]
    NotSettled,
}

impl From<LightningExactError> for PaymentVerificationError {
    fn from(e: LightningExactError) -> Self {
        match e {
            LightningExactError::MalformedPayload(msg) => PaymentVerificationError::MissingParameters(msg),
            LightningExactError::InvalidInvoice(msg) => PaymentVerificationError::InvalidSignature(msg),
            LightningExactError::InvoiceExpired => PaymentVerificationError::Expired,
            LightningExactError::AmountMismatch { invoiced, required } => {
                PaymentVerificationError::InsufficientValue {
                    authorized: invoiced as u128,
                    required: required as u128,
                }
            }
            LightningExactError::LookupFailed(msg) => PaymentVerificationError::SubmitFailed(msg),
            LightningExactError::NotSettled => PaymentVerificationError::InsufficientFunds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_expired_maps_to_expired() {
        let mapped: PaymentVerificationError = LightningExactError::InvoiceExpired.into();
        assert!(matches!(mapped, PaymentVerificationError::Expired));
    }

    #[test]
    fn not_settled_maps_to_insufficient_funds() {
        let mapped: PaymentVerificationError = LightningExactError::NotSettled.into();
        assert!(matches!(mapped, PaymentVerificationError::InsufficientFunds));
    }

    #[test]
    fn amount_mismatch_carries_structured_values() {
        let mapped: PaymentVerificationError = LightningExactError::AmountMismatch {
            invoiced: 900,
            required: 1000,
        }
        .into();
        match mapped {
            PaymentVerificationError::InsufficientValue { authorized, required } => {
                assert_eq!(authorized, 900);
                assert_eq!(required, 1000);
            }
            _ => panic!("expected InsufficientValue"),
        }
    }
}

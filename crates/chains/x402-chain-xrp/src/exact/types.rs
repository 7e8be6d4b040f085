//! Wire payload for the XRP Ledger "exact" scheme: a pre-signed native
//! currency `Payment` transaction, submitted to the facilitator as a hex
//! string (the same encoding `rippled`'s `submit` RPC expects).

use serde::{Deserialize, Serialize};
use x402_types::proto::PaymentVerificationError;

pub const EXACT_SCHEME: &str = "exact";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactXrpPayload {
    /// Hex-encoded, fully-signed `Payment` transaction blob.
    pub transaction: String,
}

/// The fields of a signed `Payment` transaction the facilitator needs to
/// verify, decoded from the wire blob.
#[derive(Debug, Clone)]
pub struct DecodedPayment {
    pub account: String,
    pub destination: String,
    pub destination_tag: Option<u32>,
    pub amount_drops: u64,
    pub fee_drops: u64,
    pub sequence: u32,
    pub last_ledger_sequence: Option<u32>,
    pub signing_pub_key: String,
    pub txn_signature: String,
}

#[derive(Debug, thiserror::Error)]
pub enum XrpExactError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("could not decode signed transaction: {0}")]
    UndecodableTransaction(String),
    #[error("transaction is not a Payment: {0}")]
    WrongTransactionType(String),
    #[error("transaction signature is invalid")]
    InvalidSignature,
    #[error("destination mismatch: expected {expected}, got {actual}")]
    DestinationMismatch { expected: String, actual: String },
    #[error("authorized amount {authorized} drops is less than required {required} drops")]
    AmountInsufficient { authorized: u128, required: u128 },
    #[error("missing LastLedgerSequence")]
    MissingLastLedgerSequence,
    #[error("LastLedgerSequence {last_ledger_sequence} is not within the allowed window of current ledger {current_ledger}")]
    LedgerWindowInvalid {
        last_ledger_sequence: u32,
        current_ledger: u32,
    },
    #[error("sequence {actual} is outside the allowed window starting at {expected}")]
    SequenceOutOfWindow { expected: u32, actual: u32 },
    #[error("account balance after reserve is insufficient to cover amount + fee")]
    InsufficientBalance,
    #[error("submit failed: {0}")]
    SubmitFailed(String),
    #[error("timed out waiting for transaction validation")]
    ConfirmationTimedOut,
}

impl From<XrpExactError> for PaymentVerificationError {
    fn from(e: XrpExactError) -> Self {
        match e {
            XrpExactError::MalformedPayload(msg) => PaymentVerificationError::MissingParameters(msg),
            XrpExactError::UndecodableTransaction(msg) => {
                PaymentVerificationError::MissingParameters(msg)
            }
            XrpExactError::WrongTransactionType(msg) => PaymentVerificationError::Unexpected(msg),
            XrpExactError::InvalidSignature => {
                PaymentVerificationError::InvalidSignature("XRPL transaction signature verification failed".into())
            }
            XrpExactError::DestinationMismatch { expected, actual } => {
                PaymentVerificationError::RecipientMismatch { expected, actual }
            }
            XrpExactError::AmountInsufficient { authorized, required } => {
                PaymentVerificationError::InsufficientValue { authorized, required }
            }
            XrpExactError::MissingLastLedgerSequence => {
                PaymentVerificationError::MissingParameters("LastLedgerSequence".into())
            }
            XrpExactError::LedgerWindowInvalid { .. } => PaymentVerificationError::Expired,
            XrpExactError::SequenceOutOfWindow { .. } => {
                PaymentVerificationError::Unexpected(e.to_string())
            }
            XrpExactError::InsufficientBalance => PaymentVerificationError::InsufficientFunds,
            XrpExactError::SubmitFailed(msg) => PaymentVerificationError::SubmitFailed(msg),
            XrpExactError::ConfirmationTimedOut => PaymentVerificationError::ConfirmationTimedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_window_invalid_maps_to_expired() {
        let err = XrpExactError::LedgerWindowInvalid {
            last_ledger_sequence: 10,
            current_ledger: 100,
        };
        let mapped: PaymentVerificationError = err.into();
        assert!(matches!(mapped, PaymentVerificationError::Expired));
    }

    #[test]
    fn insufficient_balance_maps_to_insufficient_funds() {
        let mapped: PaymentVerificationError = XrpExactError::InsufficientBalance.into();
        assert!(matches!(mapped, PaymentVerificationError::InsufficientFunds));
    }

    #[test]
    fn invalid_signature_carries_a_message() {
        let mapped: PaymentVerificationError = XrpExactError::InvalidSignature.into();
        assert!(matches!(mapped, PaymentVerificationError::InvalidSignature(_)));
    }
}

//! Wire format types for the x402 protocol.
//!
//! This module defines the canonical JSON shapes exchanged between resource
//! servers, clients, and facilitators: `PaymentRequirements`, `PaymentPayload`,
//! `VerifyRequest`/`VerifyResponse`, `SettleRequest`/`SettleResponse`, and the
//! `SupportedResponse` capability document.
//!
//! Unlike earlier releases of this crate, there is a single wire shape here,
//! not a V1/V2 split — CAIP-2 `ChainId` is used everywhere a network is named,
//! and amounts are carried as decimal-string-encoded `u128` end to end.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chain::ChainId;
use crate::timestamp::UnixTimestamp;

/// Literal x402 protocol version marker. Serializes/deserializes as the
/// JSON number `1`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct X402Version;

impl Serialize for X402Version {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(1)
    }
}

impl<'de> Deserialize<'de> for X402Version {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = u8::deserialize(deserializer)?;
        if value != 1 {
            return Err(serde::de::Error::custom(format!(
                "unsupported x402Version {value}"
            )));
        }
        Ok(X402Version)
    }
}

impl fmt::Display for X402Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1")
    }
}

/// A tagged, forward-compatible carrier for scheme-specific `extra` data on
/// `PaymentRequirements`.
///
/// Unknown shapes still round-trip losslessly as `Opaque`, so a resource
/// server speaking a newer extra shape than a given client/facilitator
/// understands degrades gracefully rather than failing to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemeExtra {
    /// EIP-712 domain fields needed to sign an EVM `exact` authorization.
    EvmDomain { name: String, version: String },
    /// Fee payer address a Solana facilitator will cover compute/rent for.
    SvmFeePayer {
        #[serde(rename = "feePayer")]
        fee_payer: String,
    },
    /// Reserved for XRP Ledger specific extras.
    XrpExtra {},
    /// Reserved for Lightning specific extras.
    LightningExtra {},
    /// Anything not recognized above. Always matches last.
    Opaque(Value),
}

/// Payment requirements for a single accepted payment method.
///
/// One protected resource may return several of these in its 402 response,
/// one per scheme/network/asset combination it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequirements {
    pub scheme: String,
    pub network: ChainId,
    #[serde(rename = "maxAmountRequired", with = "amount_as_string")]
    pub max_amount_required: u128,
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(rename = "payTo")]
    pub pay_to: String,
    #[serde(rename = "maxTimeoutSeconds")]
    pub max_timeout_seconds: u64,
    pub asset: String,
    #[serde(
        rename = "outputSchema",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<SchemeExtra>,
}

mod amount_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A signed payment authorization sent back by the client on retry, either as
/// the `X-Payment` header value (base64) or the request body of a facilitator
/// `/verify` or `/settle` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    #[serde(rename = "x402Version")]
    pub x402_version: X402Version,
    pub scheme: String,
    pub network: ChainId,
    /// Scheme-specific payload; each scheme crate defines and validates its
    /// own shape, so it travels opaquely here.
    pub payload: Value,
}

/// The full 402 response body: what's required, and why payment is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequired {
    #[serde(rename = "x402Version")]
    pub x402_version: X402Version,
    pub error: String,
    pub accepts: Vec<PaymentRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    /// Per-extension contributions, keyed by extension name. Populated by an
    /// `ExtensionRegistry` (see [`crate::extension`]); empty/absent when no
    /// extensions are registered or none had anything to contribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<std::collections::BTreeMap<String, crate::extension::ExtensionInfo>>,
}

/// Request body for `POST /verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "x402Version")]
    pub x402_version: X402Version,
    #[serde(rename = "paymentPayload")]
    pub payment_payload: PaymentPayload,
    #[serde(rename = "paymentRequirements")]
    pub payment_requirements: PaymentRequirements,
}

impl VerifyRequest {
    /// The slug identifying which registered scheme handler should process
    /// this request: chain id plus scheme name.
    pub fn scheme_handler_slug(&self) -> crate::scheme::SchemeHandlerSlug {
        crate::scheme::SchemeHandlerSlug::new(
            self.payment_payload.network.clone(),
            1,
            self.payment_payload.scheme.clone(),
        )
    }
}

/// Request body for `POST /settle`. Identical shape to [`VerifyRequest`]:
/// settlement always re-verifies before submitting on-chain.
pub type SettleRequest = VerifyRequest;

/// Response body for `POST /verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "isValid")]
pub enum VerifyResponse {
    #[serde(rename = "true")]
    Valid { payer: String },
    #[serde(rename = "false")]
    Invalid {
        #[serde(rename = "invalidReason")]
        reason: ErrorReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        payer: Option<String>,
    },
}

impl VerifyResponse {
    pub fn valid(payer: impl Into<String>) -> Self {
        VerifyResponse::Valid {
            payer: payer.into(),
        }
    }

    pub fn invalid(reason: ErrorReason, payer: Option<String>) -> Self {
        VerifyResponse::Invalid { reason, payer }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResponse::Valid { .. })
    }
}

/// Response body for `POST /settle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "success")]
pub enum SettleResponse {
    #[serde(rename = "true")]
    Success {
        payer: String,
        transaction: String,
        network: ChainId,
    },
    #[serde(rename = "false")]
    Error {
        #[serde(rename = "errorReason")]
        reason: ErrorReason,
        network: ChainId,
    },
}

/// One payment method/kind a facilitator is willing to verify and settle,
/// as advertised by `GET /supported`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedPaymentKind {
    pub scheme: String,
    pub network: ChainId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<SchemeExtra>,
}

/// Response body for `GET /supported`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportedResponse {
    pub kinds: Vec<SupportedPaymentKind>,
}

/// Reasons verification or settlement can fail, shared across every scheme.
///
/// This is the single taxonomy for the whole crate: earlier releases kept a
/// small `ErrorReason` here and a separate, richer one in the facilitator
/// trait module; those have been merged so there is exactly one source of
/// truth for `invalidReason`/`errorReason` wire strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    // General
    MissingParameters,
    UnexpectedError,
    UnsupportedScheme,
    UnexpectedVerifyError,
    UnexpectedSettleError,

    // Transaction state
    InvalidTransactionState,
    TransactionFailed,

    // Balance / funds
    InsufficientFunds,

    // Signatures
    InvalidSignature,
    ExpiredSignature,

    // EVM (eip155) exact
    MissingEip712Domain,
    InvalidExactEvmPayloadSignature,
    InvalidExactEvmPayloadRecipientMismatch,
    InvalidExactEvmPayloadAuthorizationValidBefore,
    InvalidExactEvmPayloadAuthorizationValidAfter,
    InvalidExactEvmPayloadAuthorizationValue,

    // Solana (svm) exact
    InvalidExactSvmPayloadTransactionAmountMismatch,
    InvalidExactSvmPayloadTransaction,
    InvalidExactSvmPayloadTransactionSimulationFailed,
    SettleExactSvmBlockHeightExceeded,
    SettleExactSvmTransactionConfirmationTimedOut,
    InvalidExactSvmPayloadMissingFeePayer,
    FeePayerNotManagedByFacilitator,
    InvalidExactSvmPayloadTransactionCouldNotBeDecoded,
    InvalidExactSvmPayloadTransactionInstructionsLength,
    InvalidExactSvmPayloadNoTransferInstruction,
    InvalidExactSvmPayloadTransactionFeePayerTransferringFunds,
    InvalidExactSvmPayloadMintMismatch,
    InvalidExactSvmPayloadRecipientMismatch,
    InvalidExactSvmPayloadAmountInsufficient,

    // XRP Ledger exact
    InvalidExactXrpPayloadTransaction,
    InvalidExactXrpPayloadCurrencyMismatch,
    InvalidExactXrpPayloadDestinationMismatch,
    InvalidExactXrpPayloadAmountInsufficient,
    SettleExactXrpSubmitFailed,
    SettleExactXrpTransactionConfirmationTimedOut,

    // Lightning (BOLT11)
    InvalidLightningInvoice,
    LightningInvoiceExpired,
    LightningInvoiceAmountMismatch,
    SettleLightningPaymentFailed,
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{}", json.trim_matches('"'))
    }
}

/// A structured problem raised by verification/settlement, carrying both the
/// machine-readable [`ErrorReason`] and a human-readable detail string for
/// logs.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentProblem {
    pub reason: ErrorReason,
    pub details: String,
}

impl PaymentProblem {
    pub fn new(reason: ErrorReason, details: impl Into<String>) -> Self {
        Self {
            reason,
            details: details.into(),
        }
    }
}

impl fmt::Display for PaymentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.details)
    }
}

/// Converts an error type into the `ErrorReason` + details pair the wire
/// protocol expects, so every layer's own error enum can still surface a
/// client-facing `invalidReason`.
pub trait AsPaymentProblem {
    fn as_payment_problem(&self) -> PaymentProblem;
}

/// Errors raised while processing a `/verify` or `/settle` request, before
/// a scheme-specific handler is even reached (missing handler, malformed
/// request, clock errors, etc).
#[derive(Debug, thiserror::Error)]
pub enum PaymentVerificationError {
    #[error("No scheme handler registered for {0}")]
    UnsupportedScheme(crate::scheme::SchemeHandlerSlug),
    #[error("Missing required parameters: {0}")]
    MissingParameters(String),
    #[error("Payment authorization has expired")]
    Expired,
    #[error("Payment authorization is not yet valid")]
    NotYetValid,
    #[error("Signature is invalid: {0}")]
    InvalidSignature(String),
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Authorized value {authorized} is less than required {required}")]
    InsufficientValue { authorized: u128, required: u128 },
    #[error("Recipient mismatch: expected {expected}, got {actual}")]
    RecipientMismatch { expected: String, actual: String },
    #[error("Asset mismatch: expected {expected}, got {actual}")]
    AssetMismatch { expected: String, actual: String },
    #[error("Network mismatch: expected {expected}, got {actual}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },
    #[error("Transaction submission failed: {0}")]
    SubmitFailed(String),
    #[error("Transaction simulation failed: {0}")]
    SimulationFailed(String),
    #[error("Timed out waiting for confirmation")]
    ConfirmationTimedOut,
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AsPaymentProblem for PaymentVerificationError {
    fn as_payment_problem(&self) -> PaymentProblem {
        let reason = match self {
            PaymentVerificationError::UnsupportedScheme(_) => ErrorReason::UnsupportedScheme,
            PaymentVerificationError::MissingParameters(_) => ErrorReason::MissingParameters,
            PaymentVerificationError::Expired => ErrorReason::ExpiredSignature,
            PaymentVerificationError::NotYetValid => {
                ErrorReason::InvalidExactEvmPayloadAuthorizationValidAfter
            }
            PaymentVerificationError::InvalidSignature(_) => ErrorReason::InvalidSignature,
            PaymentVerificationError::InsufficientFunds => ErrorReason::InsufficientFunds,
            PaymentVerificationError::InsufficientValue { .. } => {
                ErrorReason::InvalidExactEvmPayloadAuthorizationValue
            }
            PaymentVerificationError::RecipientMismatch { .. } => {
                ErrorReason::InvalidExactEvmPayloadRecipientMismatch
            }
            PaymentVerificationError::AssetMismatch { .. } => {
                ErrorReason::InvalidExactSvmPayloadMintMismatch
            }
            PaymentVerificationError::NetworkMismatch { .. } => ErrorReason::UnsupportedScheme,
            PaymentVerificationError::SubmitFailed(_) => ErrorReason::TransactionFailed,
            PaymentVerificationError::SimulationFailed(_) => {
                ErrorReason::InvalidExactSvmPayloadTransactionSimulationFailed
            }
            PaymentVerificationError::ConfirmationTimedOut => {
                ErrorReason::SettleExactSvmTransactionConfirmationTimedOut
            }
            PaymentVerificationError::Unexpected(_) => ErrorReason::UnexpectedError,
        };
        PaymentProblem::new(reason, self.to_string())
    }
}

/// A single unix-timestamp-bounded authorization window, shared shape across
/// schemes that use a valid-after/valid-before envelope (EVM exact, XRP
/// exact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    #[serde(rename = "validAfter")]
    pub valid_after: UnixTimestamp,
    #[serde(rename = "validBefore")]
    pub valid_before: UnixTimestamp,
}

impl ValidityWindow {
    pub fn is_active_at(&self, now: UnixTimestamp) -> bool {
        now.as_secs() >= self.valid_after.as_secs() && now.as_secs() < self.valid_before.as_secs()
    }
}

/// A builder for a single accepted payment offer, used by resource-server
/// integrations (`x402-axum`) to construct [`PaymentRequirements`] without
/// repeating boilerplate field-by-field.
#[derive(Clone)]
pub struct PriceTag {
    pub scheme: String,
    pub pay_to: String,
    pub asset: String,
    pub network: ChainId,
    pub amount: u128,
    pub max_timeout_seconds: u64,
    pub extra: Option<SchemeExtra>,
    enricher: Option<Enricher>,
}

type Enricher = Arc<dyn Fn(&mut PriceTag, &SupportedResponse) + Send + Sync>;

impl fmt::Debug for PriceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceTag")
            .field("scheme", &self.scheme)
            .field("pay_to", &self.pay_to)
            .field("asset", &self.asset)
            .field("network", &self.network)
            .field("amount", &self.amount)
            .field("max_timeout_seconds", &self.max_timeout_seconds)
            .field("extra", &self.extra)
            .finish()
    }
}

impl PriceTag {
    pub fn new(
        scheme: impl Into<String>,
        network: ChainId,
        pay_to: impl Into<String>,
        asset: impl Into<String>,
        amount: u128,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            pay_to: pay_to.into(),
            asset: asset.into(),
            network,
            amount,
            max_timeout_seconds: 300,
            extra: None,
            enricher: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.max_timeout_seconds = seconds;
        self
    }

    /// Registers a hook run against `GET /supported` capabilities before the
    /// price tag is turned into `PaymentRequirements` — used e.g. to fill in
    /// a Solana fee payer address advertised by the facilitator.
    pub fn enriched_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut PriceTag, &SupportedResponse) + Send + Sync + 'static,
    {
        self.enricher = Some(Arc::new(f));
        self
    }

    pub fn enrich(&mut self, supported: &SupportedResponse) {
        if let Some(enricher) = self.enricher.clone() {
            enricher(self, supported);
        }
    }

    pub fn into_requirements(
        self,
        resource: impl Into<String>,
        description: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> PaymentRequirements {
        PaymentRequirements {
            scheme: self.scheme,
            network: self.network,
            max_amount_required: self.amount,
            resource: resource.into(),
            description: description.into(),
            mime_type: mime_type.into(),
            pay_to: self.pay_to,
            max_timeout_seconds: self.max_timeout_seconds,
            asset: self.asset,
            output_schema: None,
            extra: self.extra,
        }
    }
}

/// Raw, unparsed JSON carried alongside a typed value — used when a layer
/// needs to forward the exact bytes it received (e.g. for signature
/// verification over the canonical JSON encoding) without re-serializing.
#[derive(Debug, Clone)]
pub struct OriginalJson(pub Arc<str>);

impl OriginalJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x402_version_round_trips() {
        let json = serde_json::to_string(&X402Version).unwrap();
        assert_eq!(json, "1");
        let parsed: X402Version = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, X402Version);
        assert!(serde_json::from_str::<X402Version>("2").is_err());
    }

    #[test]
    fn payment_requirements_amount_is_decimal_string_on_wire() {
        let req = PaymentRequirements {
            scheme: "exact".into(),
            network: ChainId::new("eip155", "8453"),
            max_amount_required: 10_000,
            resource: "https://example.com/resource".into(),
            description: "".into(),
            mime_type: "application/json".into(),
            pay_to: "0xabc".into(),
            max_timeout_seconds: 60,
            asset: "0xusdc".into(),
            output_schema: None,
            extra: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["maxAmountRequired"], "10000");
    }

    #[test]
    fn verify_response_wire_shape() {
        let valid = VerifyResponse::valid("0xabc");
        let json = serde_json::to_value(&valid).unwrap();
        assert_eq!(json["isValid"], "true");
        assert_eq!(json["payer"], "0xabc");

        let invalid = VerifyResponse::invalid(ErrorReason::InsufficientFunds, None);
        let json = serde_json::to_value(&invalid).unwrap();
        assert_eq!(json["isValid"], "false");
        assert_eq!(json["invalidReason"], "insufficient_funds");
    }

    #[test]
    fn error_reason_display_is_snake_case() {
        assert_eq!(
            ErrorReason::InsufficientFunds.to_string(),
            "insufficient_funds"
        );
        assert_eq!(
            ErrorReason::InvalidExactSvmPayloadMintMismatch.to_string(),
            "invalid_exact_svm_payload_mint_mismatch"
        );
    }

    #[test]
    fn validity_window_active_range() {
        let window = ValidityWindow {
            valid_after: UnixTimestamp::from_secs(100),
            valid_before: UnixTimestamp::from_secs(200),
        };
        assert!(!window.is_active_at(UnixTimestamp::from_secs(99)));
        assert!(window.is_active_at(UnixTimestamp::from_secs(150)));
        assert!(!window.is_active_at(UnixTimestamp::from_secs(200)));
    }
}

//! Wire payload for the EIP-155 "exact" scheme: an ERC-3009
//! `transferWithAuthorization` authorization plus its EIP-712 signature.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::sol;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use x402_types::timestamp::UnixTimestamp;

pub const EXACT_SCHEME: &str = "exact";

fn serialize_u256_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_string())
}

fn deserialize_u256_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let s: String = Deserialize::deserialize(deserializer)?;
    U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
}

/// Full payload required to authorize an ERC-3009 transfer: the EIP-712
/// signature plus the structured authorization data that was signed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayload {
    /// EOA signature (64-65 bytes, r/s/v). Smart-wallet signature schemes
    /// (EIP-1271/6492) are not implemented here.
    pub signature: Bytes,
    pub authorization: ExactEvmPayloadAuthorization,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExactEvmPayloadAuthorization {
    pub from: Address,
    pub to: Address,
    #[serde(
        serialize_with = "serialize_u256_decimal",
        deserialize_with = "deserialize_u256_decimal"
    )]
    pub value: U256,
    pub valid_after: UnixTimestamp,
    pub valid_before: UnixTimestamp,
    pub nonce: B256,
}

sol!(
    /// EIP-712 struct mirroring ERC-3009's `transferWithAuthorization`
    /// parameters, used to reconstruct the signing hash when verifying.
    #[derive(Serialize, Deserialize)]
    struct TransferWithAuthorization {
        address from;
        address to;
        uint256 value;
        uint256 validAfter;
        uint256 validBefore;
        bytes32 nonce;
    }
);

#[derive(Debug, thiserror::Error)]
pub enum Eip155ExactError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error(transparent)]
    PaymentVerification(#[from] x402_types::proto::PaymentVerificationError),
    #[error("contract call failed: {0}")]
    ContractCall(String),
}

impl From<Eip155ExactError> for x402_types::scheme::X402SchemeFacilitatorError {
    fn from(e: Eip155ExactError) -> Self {
        match e {
            Eip155ExactError::PaymentVerification(e) => e.into(),
            other => x402_types::scheme::X402SchemeFacilitatorError::OnchainFailure(other.to_string()),
        }
    }
}

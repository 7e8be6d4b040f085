//! Wire format types for XRP Ledger chain interactions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use x402_types::chain::ChainId;

/// The CAIP-2 namespace for the XRP Ledger.
pub const XRP_NAMESPACE: &str = "xrp";

/// The asset identifier used for the native XRP currency (as opposed to an
/// issued IOU), carried in `PaymentRequirements.asset`. There is no contract
/// address on the XRP Ledger for the native currency, so a fixed symbol is
/// used instead.
pub const NATIVE_ASSET: &str = "drops";

/// A CAIP-2 reference for the XRP Ledger (`mainnet` or `testnet`, matching
/// the rows already registered in `x402_types::networks`).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct XrpChainReference(String);

impl XrpChainReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn mainnet() -> Self {
        Self("mainnet".to_string())
    }

    pub fn testnet() -> Self {
        Self("testnet".to_string())
    }

    pub fn inner(&self) -> &str {
        &self.0
    }
}

impl Display for XrpChainReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<XrpChainReference> for ChainId {
    fn from(value: XrpChainReference) -> Self {
        ChainId::new(XRP_NAMESPACE, value.0)
    }
}

impl From<&XrpChainReference> for ChainId {
    fn from(value: &XrpChainReference) -> Self {
        ChainId::new(XRP_NAMESPACE, value.0.clone())
    }
}

impl TryFrom<&ChainId> for XrpChainReference {
    type Error = XrpChainReferenceFormatError;

    fn try_from(value: &ChainId) -> Result<Self, Self::Error> {
        if value.namespace != XRP_NAMESPACE {
            return Err(XrpChainReferenceFormatError::InvalidNamespace(
                value.namespace.clone(),
            ));
        }
        Ok(XrpChainReference(value.reference.clone()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum XrpChainReferenceFormatError {
    #[error("Invalid namespace {0}, expected xrp")]
    InvalidNamespace(String),
}

/// An XRP Ledger classic address (base58check, `r`-prefixed).
///
/// Validation here is limited to the shape rippled itself requires of the
/// wire format (prefix and length); full base58check/checksum validation is
/// deferred to the `xrpl` crate at the point a transaction is actually built
/// or decoded, where a malformed address will surface as a codec error.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('r') || s.len() < 25 || s.len() > 35 {
            return Err(AddressFormatError::InvalidFormat(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddressFormatError {
    #[error("invalid XRP Ledger classic address: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_classic_address() {
        let addr: Address = "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY".parse().unwrap();
        assert_eq!(addr.as_str(), "rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY");
    }

    #[test]
    fn rejects_non_r_prefixed_string() {
        let result: Result<Address, _> = "xPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY".parse();
        assert!(result.is_err());
    }

    #[test]
    fn chain_reference_round_trips_through_chain_id() {
        let chain = XrpChainReference::mainnet();
        let chain_id: ChainId = chain.clone().into();
        assert_eq!(chain_id.to_string(), "xrp:mainnet");
        let back = XrpChainReference::try_from(&chain_id).unwrap();
        assert_eq!(back, chain);
    }
}

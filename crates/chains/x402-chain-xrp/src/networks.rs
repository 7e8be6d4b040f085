use x402_types::chain::ChainId;

use crate::chain::XrpChainReference;

/// Trait providing convenient methods to get instances for well-known XRP
/// Ledger networks (`xrp` namespace).
///
/// There is no per-chain token deployment table for this rail, unlike
/// `KnownNetworkEip155`/`KnownNetworkSolana` — `exact` payments move the
/// native XRP currency, which has no contract address to look up.
#[allow(dead_code)]
pub trait KnownNetworkXrp<A> {
    /// Returns the instance for XRP Ledger mainnet (xrp:mainnet)
    fn xrp() -> A;
    /// Returns the instance for the public XRPL testnet (xrp:testnet)
    fn xrp_testnet() -> A;
}

impl KnownNetworkXrp<ChainId> for ChainId {
    fn xrp() -> ChainId {
        XrpChainReference::mainnet().into()
    }

    fn xrp_testnet() -> ChainId {
        XrpChainReference::testnet().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_network_lookups_match_caip2() {
        assert_eq!(ChainId::xrp().to_string(), "xrp:mainnet");
        assert_eq!(ChainId::xrp_testnet().to_string(), "xrp:testnet");
    }
}

use x402_types::chain::ChainId;

pub const LIGHTNING_NAMESPACE: &str = "lightning";

/// Trait providing convenient methods to get instances for well-known
/// Lightning Network references (`lightning` namespace).
#[allow(dead_code)]
pub trait KnownNetworkLightning<A> {
    /// Returns the instance for Lightning mainnet (lightning:mainnet)
    fn lightning() -> A;
    /// Returns the instance for the public signet test network (lightning:signet)
    fn lightning_signet() -> A;
}

impl KnownNetworkLightning<ChainId> for ChainId {
    fn lightning() -> ChainId {
        ChainId::new(LIGHTNING_NAMESPACE, "mainnet")
    }

    fn lightning_signet() -> ChainId {
        ChainId::new(LIGHTNING_NAMESPACE, "signet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_network_lookups_match_caip2() {
        assert_eq!(ChainId::lightning().to_string(), "lightning:mainnet");
        assert_eq!(ChainId::lightning_signet().to_string(), "lightning:signet");
    }
}

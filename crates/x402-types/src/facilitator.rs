//! The `Facilitator` trait: the interface a resource server's paygate talks
//! to, whether it is backed by a remote HTTP facilitator service or an
//! in-process [`crate::scheme::SchemeRegistry`].

use crate::proto::{SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse};

/// Verifies and settles x402 payments.
///
/// Implemented both by `facilitator_client::FacilitatorClient` (talks to a
/// remote facilitator over HTTP) and by any in-process facilitator that
/// dispatches directly to a [`crate::scheme::SchemeRegistry`].
#[async_trait::async_trait]
pub trait Facilitator {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Verifies a payment payload against the given requirements without
    /// moving funds.
    async fn verify(&self, request: &VerifyRequest) -> Result<VerifyResponse, Self::Error>;

    /// Settles a previously verified payment.
    async fn settle(&self, request: &SettleRequest) -> Result<SettleResponse, Self::Error>;

    /// Lists the scheme/network combinations this facilitator supports.
    async fn supported(&self) -> Result<SupportedResponse, Self::Error>;
}

//! Client-side x402 payment handling for reqwest.
//!
//! This module provides [`X402Payments`], which orchestrates registered
//! scheme clients, a [`WalletPolicy`] spend cap, and payment selection for
//! automatic 402 handling.

use http::{Extensions, HeaderValue, StatusCode};
use reqwest::{Request, Response};
use reqwest_middleware as rqm;
use std::sync::Arc;
use x402_types::proto::PaymentRequired;
use x402_types::scheme::client::{FirstMatch, PaymentCandidate, PaymentSelector, X402Error, X402SchemeClient};

use crate::http_transport::parse_payment_required;
use crate::wallet_policy::WalletPolicy;

#[cfg(feature = "telemetry")]
use tracing::{debug, info, instrument, trace};

/// The x402 payment header name the resource server expects the signed
/// candidate in.
const PAYMENT_HEADER: &str = "X-Payment";

/// Middleware that automatically handles `402 Payment Required` responses by
/// selecting a registered scheme client, signing a payment, and retrying the
/// request with the `X-Payment` header attached.
///
/// ## Creating an X402Payments middleware
///
/// ```rust,no_run
/// use x402_reqwest::X402Payments;
///
/// let payments = X402Payments::new();
/// ```
///
/// ## Registering Scheme Clients
///
/// To handle payments on different chains, register scheme clients from the
/// chain crates (e.g. `x402-chain-eip155`, `x402-chain-solana`):
///
/// ```rust,ignore
/// use x402_reqwest::X402Payments;
/// use x402_chain_eip155::exact::client::Eip155ExactClient;
/// use alloy_signer_local::PrivateKeySigner;
///
/// let signer = "PRIVATE_KEY".parse::<PrivateKeySigner>().unwrap();
/// let payments = X402Payments::new()
///     .register(Eip155ExactClient::new(signer));
/// ```
///
/// ## Using with Reqwest
///
/// See [`crate::ReqwestWithPayments`] for integrating with reqwest.
pub struct X402Payments<TSelector = FirstMatch> {
    schemes: ClientSchemes,
    selector: TSelector,
    policy: WalletPolicy,
}

impl X402Payments<FirstMatch> {
    /// Creates a new [`X402Payments`] with default settings: [`FirstMatch`]
    /// selection and no wallet policy (no spend caps).
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for X402Payments<FirstMatch> {
    fn default() -> Self {
        Self {
            schemes: ClientSchemes::default(),
            selector: FirstMatch,
            policy: WalletPolicy::default(),
        }
    }
}

impl<TSelector> X402Payments<TSelector> {
    /// Registers a scheme client for specific chains or networks.
    ///
    /// Scheme clients handle the actual payment signing for specific
    /// protocols. You can register multiple clients for different chains or
    /// schemes.
    pub fn register<S>(mut self, scheme: S) -> Self
    where
        S: X402SchemeClient + 'static,
    {
        self.schemes.push(scheme);
        self
    }

    /// Sets a custom payment selector.
    ///
    /// By default [`FirstMatch`] is used, which pays with whatever candidate
    /// came first in the server's `accepts` list.
    pub fn with_selector<P: PaymentSelector + 'static>(self, selector: P) -> X402Payments<P> {
        X402Payments {
            selector,
            schemes: self.schemes,
            policy: self.policy,
        }
    }

    /// Caps spend for a `(chain, asset)` pair. Candidates exceeding the cap
    /// are dropped before selection.
    pub fn max(mut self, chain_id: x402_types::chain::ChainId, asset: impl Into<String>, limit: u128) -> Self {
        self.policy = self.policy.max(chain_id, asset, limit);
        self
    }

    /// Caps spend for an asset across every chain it's quoted on. Kept for
    /// parity with the original single-network `.max(MaxTokenAmount)` shape.
    pub fn max_asset(mut self, asset: impl Into<String>, limit: u128) -> Self {
        self.policy = self.policy.max_asset(asset, limit);
        self
    }

    /// Replaces the wallet policy wholesale.
    pub fn with_policy(mut self, policy: WalletPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<TSelector> X402Payments<TSelector>
where
    TSelector: PaymentSelector,
{
    /// Extracts the payment requirements from a 402 response, selects a
    /// candidate within policy, signs it, and returns the header value to
    /// attach to the retried request.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.make_payment_header", skip_all, err))]
    pub async fn make_payment_header(&self, res: Response) -> Result<HeaderValue, X402Error> {
        let payment_required = parse_payment_required(res)
            .await
            .ok_or(X402Error::SigningError("invalid 402 response body".to_string()))?;
        let candidates = self.schemes.candidates(&payment_required);
        let candidates = self.policy.filter(candidates);

        let selected = self.selector.select(candidates).ok_or(X402Error::NoMatch)?;

        #[cfg(feature = "telemetry")]
        debug!(
            scheme = %selected.scheme,
            chain_id = %selected.chain_id,
            asset = %selected.asset,
            "Selected payment candidate"
        );

        let signed_payload = selected.signer.sign_payment().await?;
        HeaderValue::from_str(&signed_payload)
            .map_err(|e| X402Error::SigningError(format!("invalid header value: {e}")))
    }
}

/// Internal collection of registered scheme clients.
#[derive(Default)]
struct ClientSchemes(Vec<Arc<dyn X402SchemeClient>>);

impl ClientSchemes {
    fn push<T: X402SchemeClient + 'static>(&mut self, client: T) {
        self.0.push(Arc::new(client));
    }

    fn candidates(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        let mut candidates = vec![];
        for client in self.0.iter() {
            candidates.extend(client.accept(payment_required));
        }
        candidates
    }
}

#[async_trait::async_trait]
impl<TSelector> rqm::Middleware for X402Payments<TSelector>
where
    TSelector: PaymentSelector + Send + Sync + 'static,
{
    /// Handles a request, automatically handling 402 responses.
    ///
    /// When a 402 response is received, this middleware:
    /// 1. Extracts payment requirements from the response
    /// 2. Signs a payment using a registered scheme client
    /// 3. Retries the request with the `X-Payment` header
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.reqwest.handle", skip_all, err))]
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: rqm::Next<'_>,
    ) -> rqm::Result<Response> {
        let retry_req = req.try_clone();
        let res = next.clone().run(req, extensions).await?;

        if res.status() != StatusCode::PAYMENT_REQUIRED {
            #[cfg(feature = "telemetry")]
            trace!(status = ?res.status(), "No payment required, returning response");
            return Ok(res);
        }

        #[cfg(feature = "telemetry")]
        info!(url = ?res.url(), "Received 402 Payment Required, processing payment");

        let header = self
            .make_payment_header(res)
            .await
            .map_err(|e| rqm::Error::Middleware(e.into()))?;

        let mut retry = retry_req.ok_or_else(|| {
            rqm::Error::Middleware(
                X402Error::SigningError("request body is not cloneable, cannot retry with payment".to_string()).into(),
            )
        })?;
        retry.headers_mut().insert(PAYMENT_HEADER, header);
        retry.headers_mut().insert(
            "Access-Control-Expose-Headers",
            HeaderValue::from_static("X-Payment-Response"),
        );

        #[cfg(feature = "telemetry")]
        trace!(url = ?retry.url(), "Retrying request with payment header");

        next.run(retry, extensions).await
    }
}

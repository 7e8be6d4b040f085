//! Payment gate implementation shared by the axum middleware.
//!
//! This module provides [`Paygate`], which handles the core payment
//! lifecycle for a protected route:
//! - Extracting the `X-Payment` header from a request
//! - Verifying the payment with a facilitator
//! - Settling the payment on-chain, before or after the inner handler runs
//! - Returning a `402 Payment Required` response when payment is missing or invalid
//!
//! ## Example
//!
//! ```ignore
//! use x402_axum::paygate::{Paygate, SettlementTiming};
//!
//! let paygate = Paygate {
//!     facilitator,
//!     settlement_timing: SettlementTiming::After,
//!     accepts: Arc::new(price_tags),
//!     resource: ResourceInfoBuilder::default().as_resource_info(&base_url, &req),
//!     extensions: Arc::new(x402_types::extension::ExtensionRegistry::new()),
//! };
//!
//! let response = paygate.handle_request(inner, request).await;
//! ```

use axum_core::body::Body;
use axum_core::extract::Request;
use axum_core::response::{IntoResponse, Response};
use http::{HeaderMap, HeaderValue, StatusCode, Uri};
use serde_json::json;
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tower::Service;
use url::Url;
use x402_types::facilitator::Facilitator;
use x402_types::proto;
use x402_types::proto::PriceTag;

#[cfg(feature = "telemetry")]
use tracing::Instrument;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use x402_types::util::Base64Bytes;

/// The header name carrying the base64-encoded payment payload.
pub const PAYMENT_HEADER_NAME: &str = "X-Payment";

/// Controls whether a [`Paygate`] settles a payment before or after the
/// inner handler runs.
///
/// Selected per-route rather than globally: some handlers want the payment
/// committed before doing expensive or irreversible work, others want to
/// avoid paying for a request the handler itself rejects.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum SettlementTiming {
    /// Settle after the inner handler returns a non-error response (default).
    #[default]
    After,
    /// Settle before the inner handler runs.
    Before,
}

// ============================================================================
// Resource info
// ============================================================================

/// Per-request resource description attached to every [`proto::PaymentRequirements`]
/// built for that request.
#[derive(Debug, Clone, Default)]
pub struct ResourceInfo {
    pub url: String,
    pub description: String,
    pub mime_type: String,
}

/// Builder for [`ResourceInfo`], computing the resource URL either statically
/// or dynamically from the request and an optional base URL.
#[derive(Debug, Clone)]
pub struct ResourceInfoBuilder {
    pub description: String,
    pub mime_type: String,
    pub url: Option<String>,
}

impl Default for ResourceInfoBuilder {
    fn default() -> Self {
        Self {
            description: "".to_string(),
            mime_type: "application/json".to_string(),
            url: None,
        }
    }
}

impl ResourceInfoBuilder {
    /// Determines the resource URL (static or dynamic) for the given request.
    pub fn as_resource_info(&self, base_url: Option<&Url>, req: &Request) -> ResourceInfo {
        let url = self.url.clone().unwrap_or_else(|| {
            let mut url = base_url.cloned().unwrap_or_else(|| {
                let host = req
                    .headers()
                    .get("host")
                    .and_then(|h| h.to_str().ok())
                    .unwrap_or("localhost");
                let origin = format!("http://{}", host);
                let url =
                    Url::parse(&origin).unwrap_or_else(|_| Url::parse("http://localhost").unwrap());
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    "X402Middleware base_url is not configured; using {url} as origin for resource resolution"
                );
                url
            });
            let request_uri = req.uri();
            url.set_path(request_uri.path());
            url.set_query(request_uri.query());
            url.to_string()
        });
        ResourceInfo {
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
            url,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while extracting or verifying a payment.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("{0} header is required")]
    PaymentHeaderRequired(&'static str),
    #[error("Invalid or malformed payment header")]
    InvalidPaymentHeader,
    #[error("Unable to find matching payment requirements")]
    NoPaymentMatching,
    #[error("Verification failed: {0}")]
    VerificationFailed(String),
}

/// Paygate error type that wraps verification and settlement errors.
#[derive(Debug, thiserror::Error)]
pub enum PaygateError {
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("Settlement failed: {0}")]
    Settlement(String),
}

/// Renders a [`PaygateError`] as a `402 Payment Required` response.
///
/// Responds with a paywall HTML page when the request looks like it came
/// from a browser (`Accept: text/html` plus a browser-like `User-Agent`),
/// and a JSON [`proto::PaymentRequired`] body otherwise.
pub fn error_into_response(
    err: PaygateError,
    accepts: &[PriceTag],
    resource: &ResourceInfo,
    wants_html: bool,
    extensions: std::collections::BTreeMap<String, x402_types::extension::ExtensionInfo>,
) -> Response {
    match err {
        PaygateError::Verification(err) => {
            let payment_required = proto::PaymentRequired {
                x402_version: proto::X402Version,
                error: err.to_string(),
                accepts: accepts
                    .iter()
                    .map(|pt| {
                        pt.clone()
                            .into_requirements(resource.url.clone(), resource.description.clone(), resource.mime_type.clone())
                    })
                    .collect(),
                payer: None,
                extensions: (!extensions.is_empty()).then_some(extensions),
            };
            if wants_html {
                paywall_response(&payment_required)
            } else {
                let body = Body::from(
                    serde_json::to_vec(&payment_required).expect("serialization failed"),
                );
                Response::builder()
                    .status(StatusCode::PAYMENT_REQUIRED)
                    .header("Content-Type", "application/json")
                    .body(body)
                    .expect("Fail to construct response")
            }
        }
        PaygateError::Settlement(err) => {
            let body = Body::from(
                json!({
                    "error": "Settlement failed",
                    "details": err.to_string()
                })
                .to_string(),
            );
            Response::builder()
                .status(StatusCode::PAYMENT_REQUIRED)
                .header("Content-Type", "application/json")
                .body(body)
                .expect("Fail to construct response")
        }
    }
}

/// Minimal paywall page shown to browsers hitting a protected resource
/// directly instead of an x402-aware client.
fn paywall_response(payment_required: &proto::PaymentRequired) -> Response {
    let accepts_html = payment_required
        .accepts
        .iter()
        .map(|r| {
            format!(
                "<li>{} {} on {} &rarr; {}</li>",
                r.max_amount_required, r.asset, r.network, r.pay_to
            )
        })
        .collect::<String>();
    let html = format!(
        "<!doctype html><html><head><title>Payment Required</title></head><body>\
         <h1>Payment Required</h1><p>{}</p><ul>{}</ul></body></html>",
        payment_required.error, accepts_html
    );
    Response::builder()
        .status(StatusCode::PAYMENT_REQUIRED)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(html))
        .expect("Fail to construct response")
}

/// Sniffs whether the incoming request prefers an HTML paywall page over a
/// JSON 402 body: an `Accept: text/html` header plus a browser-looking
/// `User-Agent` (the same Mozilla-prefix heuristic browsers themselves use).
pub fn wants_html(headers: &HeaderMap) -> bool {
    let accepts_html = headers
        .get(http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);
    let looks_like_browser = headers
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Mozilla/"))
        .unwrap_or(false);
    accepts_html && looks_like_browser
}

// ============================================================================
// Paygate
// ============================================================================

/// Payment gate wrapping an inner `tower::Service`, enforcing x402 payment
/// verification and settlement around it.
pub struct Paygate<TFacilitator> {
    /// The facilitator for verifying and settling payments.
    pub facilitator: Arc<TFacilitator>,
    /// Whether to settle before or after request execution.
    pub settlement_timing: SettlementTiming,
    /// Accepted payment price tags for this route.
    pub accepts: Arc<Vec<PriceTag>>,
    /// Resource information for the protected endpoint.
    pub resource: ResourceInfo,
    /// Registered extensions enriching declarations and responses.
    pub extensions: Arc<x402_types::extension::ExtensionRegistry>,
}

impl<TFacilitator> Paygate<TFacilitator> {
    /// Calls the inner service with proper telemetry instrumentation.
    async fn call_inner<ReqBody, ResBody, S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>>(
        mut inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<http::Response<ResBody>, S::Error>
    where
        S::Future: Send,
    {
        #[cfg(feature = "telemetry")]
        {
            inner.call(req).instrument(tracing::info_span!("inner")).await
        }
        #[cfg(not(feature = "telemetry"))]
        {
            inner.call(req).await
        }
    }

    fn extension_context(&self) -> x402_types::extension::ExtensionContext {
        x402_types::extension::ExtensionContext {
            resource: self.resource.url.clone(),
        }
    }

    async fn built_requirements(&self) -> Vec<proto::PaymentRequirements> {
        let context = self.extension_context();
        let mut out = Vec::with_capacity(self.accepts.len());
        for pt in self.accepts.iter() {
            let requirements = pt.clone().into_requirements(
                self.resource.url.clone(),
                self.resource.description.clone(),
                self.resource.mime_type.clone(),
            );
            out.push(self.extensions.enrich_declaration(requirements, &context).await);
        }
        out
    }
}

impl<TFacilitator> Paygate<TFacilitator>
where
    TFacilitator: Facilitator,
{
    /// Handles an incoming request, processing payment if required.
    ///
    /// Returns a 402 response if payment fails, or the inner service's
    /// response otherwise.
    #[cfg_attr(feature = "telemetry", instrument(name = "x402.handle_request", skip_all))]
    pub async fn handle_request<ReqBody, ResBody, S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>>(
        self,
        inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<Response, Infallible>
    where
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        let wants_html = wants_html(req.headers());
        match self.handle_request_fallible(inner, req).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let extension_info = self
                    .extensions
                    .enrich_payment_required(&self.extension_context())
                    .await;
                Ok(error_into_response(err, &self.accepts, &self.resource, wants_html, extension_info))
            }
        }
    }

    /// Enriches accepted price tags with facilitator capabilities (e.g. a
    /// Solana fee payer address), fetched fresh from `supported()`.
    pub async fn enrich_accepts(&mut self) {
        let capabilities = self.facilitator.supported().await.unwrap_or_default();
        let accepts = self
            .accepts
            .iter()
            .map(|pt| {
                let mut pt = pt.clone();
                pt.enrich(&capabilities);
                pt
            })
            .collect::<Vec<_>>();
        self.accepts = Arc::new(accepts);
    }

    /// Handles an incoming request, returning errors as [`PaygateError`]
    /// instead of converting them into a 402 response.
    pub async fn handle_request_fallible<ReqBody, ResBody, S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>>(
        &self,
        inner: S,
        req: http::Request<ReqBody>,
    ) -> Result<Response, PaygateError>
    where
        S::Response: IntoResponse,
        S::Error: IntoResponse,
        S::Future: Send,
    {
        let header = extract_payment_header(req.headers())
            .ok_or(VerificationError::PaymentHeaderRequired(PAYMENT_HEADER_NAME))?;
        let payment_payload =
            extract_payment_payload(header).ok_or(VerificationError::InvalidPaymentHeader)?;

        let requirements = self.built_requirements().await;
        let selected = requirements
            .iter()
            .find(|requirement| {
                requirement.scheme == payment_payload.scheme && requirement.network == payment_payload.network
            })
            .cloned()
            .ok_or(VerificationError::NoPaymentMatching)?;

        let verify_request = proto::VerifyRequest {
            x402_version: payment_payload.x402_version,
            payment_payload,
            payment_requirements: selected,
        };

        match self.settlement_timing {
            SettlementTiming::Before => {
                #[cfg(feature = "telemetry")]
                tracing::debug!("Settling payment before request execution");

                let settlement = self.settle_payment(&verify_request).await?;
                let header_value = settlement_to_header(settlement)?;

                let response = match Self::call_inner(inner, req).await {
                    Ok(response) => response,
                    Err(err) => return Ok(err.into_response()),
                };

                let mut res = response;
                res.headers_mut().insert("X-Payment-Response", header_value);
                Ok(res.into_response())
            }
            SettlementTiming::After => {
                #[cfg(feature = "telemetry")]
                tracing::debug!("Settling payment after request execution");

                let verify_response = self.verify_payment(&verify_request).await?;
                validate_verify_response(verify_response)?;

                let response = match Self::call_inner(inner, req).await {
                    Ok(response) => response,
                    Err(err) => return Ok(err.into_response()),
                };

                if response.status().is_client_error() || response.status().is_server_error() {
                    return Ok(response.into_response());
                }

                let settlement = self.settle_payment(&verify_request).await?;
                let header_value = settlement_to_header(settlement)?;

                let mut res = response;
                res.headers_mut().insert("X-Payment-Response", header_value);
                Ok(res.into_response())
            }
        }
    }

    /// Verifies a payment with the facilitator.
    pub async fn verify_payment(&self, verify_request: &proto::VerifyRequest) -> Result<proto::VerifyResponse, VerificationError> {
        self.facilitator
            .verify(verify_request)
            .await
            .map_err(|e| VerificationError::VerificationFailed(format!("{e}")))
    }

    /// Settles a payment with the facilitator.
    pub async fn settle_payment(&self, settle_request: &proto::SettleRequest) -> Result<proto::SettleResponse, PaygateError> {
        self.facilitator
            .settle(settle_request)
            .await
            .map_err(|e| PaygateError::Settlement(format!("{e}")))
    }
}

fn validate_verify_response(verify_response: proto::VerifyResponse) -> Result<(), VerificationError> {
    match verify_response {
        proto::VerifyResponse::Valid { .. } => Ok(()),
        proto::VerifyResponse::Invalid { reason, .. } => {
            Err(VerificationError::VerificationFailed(reason.to_string()))
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn extract_payment_header(header_map: &HeaderMap) -> Option<&[u8]> {
    header_map.get(PAYMENT_HEADER_NAME).map(|h| h.as_bytes())
}

fn extract_payment_payload(header_bytes: &[u8]) -> Option<proto::PaymentPayload> {
    let base64 = Base64Bytes::from(header_bytes).decode().ok()?;
    serde_json::from_slice(base64.as_ref()).ok()
}

fn settlement_to_header(settlement: proto::SettleResponse) -> Result<HeaderValue, PaygateError> {
    let json = serde_json::to_vec(&settlement).map_err(|err| PaygateError::Settlement(err.to_string()))?;
    let payment_header = Base64Bytes::encode(json);
    HeaderValue::from_bytes(payment_header.as_ref()).map_err(|err| PaygateError::Settlement(err.to_string()))
}

// ============================================================================
// PriceTagSource Trait and Implementations
// ============================================================================

/// Provides the [`PriceTag`]s accepted for a request: either a fixed set or
/// one computed per-request.
pub trait PriceTagSource {
    fn resolve(
        &self,
        headers: &HeaderMap,
        uri: &Uri,
        base_url: Option<&Url>,
    ) -> impl Future<Output = Vec<PriceTag>> + Send;
}

/// Static price tag source: returns the same price tags for every request.
#[derive(Clone, Debug)]
pub struct StaticPriceTags {
    tags: Arc<Vec<PriceTag>>,
}

impl StaticPriceTags {
    pub fn new(tags: Vec<PriceTag>) -> Self {
        Self { tags: Arc::new(tags) }
    }

    pub fn tags(&self) -> &[PriceTag] {
        &self.tags
    }

    pub fn with_price_tag(mut self, tag: PriceTag) -> Self {
        let mut tags = (*self.tags).clone();
        tags.push(tag);
        self.tags = Arc::new(tags);
        self
    }
}

impl PriceTagSource for StaticPriceTags {
    async fn resolve(&self, _headers: &HeaderMap, _uri: &Uri, _base_url: Option<&Url>) -> Vec<PriceTag> {
        (*self.tags).clone()
    }
}

/// Internal type alias for the boxed dynamic pricing callback.
type BoxedDynamicPriceCallback =
    dyn for<'a> Fn(&'a HeaderMap, &'a Uri, Option<&'a Url>) -> Pin<Box<dyn Future<Output = Vec<PriceTag>> + Send + 'a>>
        + Send
        + Sync;

/// Dynamic price tag source: computes price tags per-request via callback.
///
/// ```ignore
/// use x402_axum::paygate::DynamicPriceTags;
///
/// let source = DynamicPriceTags::new(|headers, _uri, _base_url| async move {
///     let is_premium = headers.get("X-User-Tier").and_then(|v| v.to_str().ok()) == Some("premium");
///     vec![/* ... */]
/// });
/// ```
pub struct DynamicPriceTags {
    callback: Arc<BoxedDynamicPriceCallback>,
}

impl Clone for DynamicPriceTags {
    fn clone(&self) -> Self {
        Self { callback: self.callback.clone() }
    }
}

impl std::fmt::Debug for DynamicPriceTags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicPriceTags").field("callback", &"<callback>").finish()
    }
}

impl DynamicPriceTags {
    pub fn new<F, Fut>(callback: F) -> Self
    where
        F: Fn(&HeaderMap, &Uri, Option<&Url>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<PriceTag>> + Send + 'static,
    {
        Self {
            callback: Arc::new(move |headers, uri, base_url| Box::pin(callback(headers, uri, base_url))),
        }
    }
}

impl PriceTagSource for DynamicPriceTags {
    async fn resolve(&self, headers: &HeaderMap, uri: &Uri, base_url: Option<&Url>) -> Vec<PriceTag> {
        (self.callback)(headers, uri, base_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(accept: Option<&str>, user_agent: Option<&str>) -> HeaderMap {
        let mut h = HeaderMap::new();
        if let Some(accept) = accept {
            h.insert(http::header::ACCEPT, HeaderValue::from_str(accept).unwrap());
        }
        if let Some(ua) = user_agent {
            h.insert(http::header::USER_AGENT, HeaderValue::from_str(ua).unwrap());
        }
        h
    }

    #[test]
    fn browser_with_html_accept_wants_html() {
        let h = headers(
            Some("text/html,application/xhtml+xml"),
            Some("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15"),
        );
        assert!(wants_html(&h));
    }

    #[test]
    fn api_client_with_json_accept_does_not_want_html() {
        let h = headers(Some("application/json"), Some("Mozilla/5.0"));
        assert!(!wants_html(&h));
    }

    #[test]
    fn non_browser_user_agent_does_not_want_html_even_with_html_accept() {
        let h = headers(Some("text/html"), Some("curl/8.4.0"));
        assert!(!wants_html(&h));
    }

    #[test]
    fn missing_headers_do_not_want_html() {
        let h = headers(None, None);
        assert!(!wants_html(&h));
    }

    #[test]
    fn settlement_timing_defaults_to_after() {
        assert_eq!(SettlementTiming::default(), SettlementTiming::After);
    }

    #[test]
    fn static_price_tags_resolve_returns_configured_tags() {
        let network = x402_types::chain::ChainId::new("eip155", "84532");
        let tag = PriceTag::new("exact", network, "0xpayto", "0xasset", 1_000);
        let source = StaticPriceTags::new(vec![tag.clone()]);
        assert_eq!(source.tags().len(), 1);
    }
}

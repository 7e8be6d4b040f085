//! Axum middleware for enforcing [x402](https://www.x402.org) payments on protected routes.
//!
//! This middleware validates incoming `X-Payment` headers using a configured x402 facilitator,
//! and settles valid payments either before or after the inner handler runs (configurable
//! per route via [`SettlementTiming`]).
//!
//! Returns a `402 Payment Required` response if the request lacks a valid payment -- JSON for
//! API clients, a paywall HTML page for browsers.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, Json};
//! use axum::response::IntoResponse;
//! use http::StatusCode;
//! use serde_json::json;
//! use x402_types::chain::ChainId;
//! use x402_types::proto::PriceTag;
//! use x402_axum::layer::X402Middleware;
//!
//! let x402 = X402Middleware::try_from("https://facilitator.x402.rs/").unwrap();
//! let network = ChainId::new("eip155", "84532");
//! let price_tag = PriceTag::new("exact", network, "0xADDRESS", "0xUSDC", 25_000);
//!
//! let app: Router = Router::new().route(
//!     "/protected",
//!     get(my_handler).layer(
//!         x402.with_description("Access to /protected")
//!             .with_price_tag(price_tag)
//!     ),
//! );
//!
//! async fn my_handler() -> impl IntoResponse {
//!     (StatusCode::OK, Json(json!({ "hello": "world" })))
//! }
//! ```
//!
//! ## Configuration Notes
//!
//! - **[`X402Middleware::with_price_tag`]** sets the assets and amounts accepted for payment.
//! - **[`X402Middleware::with_description`]** and **[`X402Middleware::with_mime_type`]** are optional but help the payer understand what is being paid for.
//! - **[`X402Middleware::with_resource`]** explicitly sets the full URI of the protected resource.
//!   This avoids recomputing [`proto::PaymentRequirements`] on every request and should be preferred when possible.
//! - If `with_resource` is **not** used, the middleware will compute the resource URI dynamically from the request
//!   and a base URL set via **[`X402Middleware::with_base_url`]**.
//! - If no base URL is provided, the default is `http://localhost/` (avoid this in production).
//! - **[`X402Middleware::settle_before_execution`]** / **[`X402Middleware::settle_after_execution`]** choose
//!   [`SettlementTiming`] for the route (default: after execution).

use axum_core::{
    extract::Request,
    response::{IntoResponse, Response},
};
use std::fmt::Debug;
use std::sync::Arc;
use std::{
    convert::Infallible,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};
use url::Url;
use x402_types::extension::{Extension, ExtensionRegistry};
use x402_types::facilitator::Facilitator;
use x402_types::proto::PriceTag;

use crate::facilitator_client::{FacilitatorClient, FacilitatorClientError};
use crate::paygate::{Paygate, ResourceInfoBuilder, SettlementTiming};

/// Middleware layer that enforces x402 payment verification and settlement.
///
/// Wraps an Axum service, intercepts incoming HTTP requests, verifies the payment
/// using the configured facilitator, and performs settlement before or after the
/// inner handler runs depending on [`SettlementTiming`].
#[derive(Clone)]
pub struct X402Middleware<F> {
    facilitator: Arc<F>,
    resource: ResourceInfoBuilder,
    base_url: Option<Url>,
    price_tag: Vec<PriceTag>,
    max_timeout_seconds: u64,
    settlement_timing: SettlementTiming,
    extensions: Arc<ExtensionRegistry>,
}

impl<F: Debug> Debug for X402Middleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X402Middleware")
            .field("facilitator", &self.facilitator)
            .field("base_url", &self.base_url)
            .field("price_tag", &self.price_tag.len())
            .field("settlement_timing", &self.settlement_timing)
            .finish()
    }
}

impl TryFrom<&str> for X402Middleware<FacilitatorClient> {
    type Error = FacilitatorClientError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let facilitator = FacilitatorClient::try_from(value)?;
        Ok(X402Middleware::new(facilitator))
    }
}

impl TryFrom<String> for X402Middleware<FacilitatorClient> {
    type Error = FacilitatorClientError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        X402Middleware::try_from(value.as_str())
    }
}

impl<F> X402Middleware<F>
where
    F: Clone,
{
    pub fn new(facilitator: F) -> Self {
        Self {
            facilitator: Arc::new(facilitator),
            resource: ResourceInfoBuilder::default(),
            base_url: None,
            price_tag: Vec::new(),
            max_timeout_seconds: 300,
            settlement_timing: SettlementTiming::After,
            extensions: Arc::new(ExtensionRegistry::new()),
        }
    }

    pub fn base_url(&self) -> Url {
        self.base_url.clone().unwrap_or(Url::parse("http://localhost/").unwrap())
    }

    /// Sets the description field on all generated payment requirements.
    pub fn with_description(&self, description: &str) -> Self {
        let mut this = self.clone();
        this.resource.description = description.to_string();
        this
    }

    /// Sets the MIME type of the protected resource.
    pub fn with_mime_type(&self, mime: &str) -> Self {
        let mut this = self.clone();
        this.resource.mime_type = mime.to_string();
        this
    }

    /// Sets the resource URL directly, avoiding fragile auto-detection from the request.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn with_resource(&self, resource: Url) -> Self {
        let mut this = self.clone();
        this.resource.url = Some(resource.to_string());
        this
    }

    /// Sets the base URL used to construct resource URLs dynamically.
    ///
    /// Ignored once [`with_resource`] is used. If neither is set, defaults to `http://localhost/`.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn with_base_url(&self, base_url: Url) -> Self {
        let mut this = self.clone();
        this.base_url = Some(base_url);
        this
    }

    /// Sets the maximum allowed payment timeout, in seconds.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn with_max_timeout_seconds(&self, seconds: u64) -> Self {
        let mut this = self.clone();
        this.max_timeout_seconds = seconds;
        this.price_tag = this
            .price_tag
            .into_iter()
            .map(|pt| pt.with_timeout(seconds))
            .collect();
        this
    }

    /// Replaces all price tags with the provided value(s).
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn with_price_tag<T: Into<Vec<PriceTag>>>(&self, price_tag: T) -> Self {
        let mut this = self.clone();
        this.price_tag = price_tag.into();
        this
    }

    /// Adds new price tags to the existing list.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn or_price_tag<T: Into<Vec<PriceTag>>>(&self, price_tag: T) -> Self {
        let mut this = self.clone();
        this.price_tag.extend(price_tag.into());
        this
    }

    /// Settles payment before the inner handler runs.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn settle_before_execution(&self) -> Self {
        let mut this = self.clone();
        this.settlement_timing = SettlementTiming::Before;
        this
    }

    /// Settles payment after the inner handler runs (default).
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn settle_after_execution(&self) -> Self {
        let mut this = self.clone();
        this.settlement_timing = SettlementTiming::After;
        this
    }

    /// Registers an extension, enriching payment declarations and responses
    /// on every request this middleware handles.
    #[allow(dead_code)] // Public for consumption by downstream crates.
    pub fn with_extension(&self, extension: impl Extension + 'static) -> Self {
        let mut this = self.clone();
        let mut registry = (*this.extensions).clone();
        registry.register(Arc::new(extension));
        this.extensions = Arc::new(registry);
        this
    }
}

impl X402Middleware<FacilitatorClient> {
    pub fn facilitator_url(&self) -> &Url {
        self.facilitator.base_url()
    }
}

/// Wraps a cloned inner Axum service and augments it with payment enforcement logic.
#[derive(Clone)]
pub struct X402MiddlewareService<F> {
    facilitator: Arc<F>,
    resource: ResourceInfoBuilder,
    base_url: Option<Url>,
    price_tag: Arc<Vec<PriceTag>>,
    settlement_timing: SettlementTiming,
    extensions: Arc<ExtensionRegistry>,
    inner: BoxCloneSyncService<Request, Response, Infallible>,
}

impl<S, F> Layer<S> for X402Middleware<F>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    S::Future: Send + 'static,
    F: Facilitator + Clone,
{
    type Service = X402MiddlewareService<F>;

    fn layer(&self, inner: S) -> Self::Service {
        if self.base_url.is_none() && self.resource.url.is_none() {
            #[cfg(feature = "telemetry")]
            tracing::warn!(
                "X402Middleware base_url is not configured; defaulting to http://localhost/ for resource resolution"
            );
        }
        X402MiddlewareService {
            facilitator: self.facilitator.clone(),
            resource: self.resource.clone(),
            base_url: self.base_url.clone(),
            price_tag: Arc::new(self.price_tag.clone()),
            settlement_timing: self.settlement_timing,
            extensions: self.extensions.clone(),
            inner: BoxCloneSyncService::new(inner),
        }
    }
}

impl<F> Service<Request> for X402MiddlewareService<F>
where
    F: Facilitator + Clone + Send + Sync + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let resource = self.resource.as_resource_info(self.base_url.as_ref(), &req);
        let gate = Paygate {
            facilitator: self.facilitator.clone(),
            settlement_timing: self.settlement_timing,
            accepts: self.price_tag.clone(),
            resource,
            extensions: self.extensions.clone(),
        };
        let inner = self.inner.clone();
        Box::pin(async move { gate.handle_request(inner, req).await })
    }
}

//! Parses a `402 Payment Required` response body into [`PaymentRequired`].

use x402_types::proto::PaymentRequired;

/// Reads and decodes a 402 response body as JSON.
///
/// Returns `None` if the response isn't a well-formed `PaymentRequired` body
/// (e.g. the server returned a plain-text 402 with no payload).
pub async fn parse_payment_required(response: reqwest::Response) -> Option<PaymentRequired> {
    let bytes = response.bytes().await.ok()?;
    serde_json::from_slice(&bytes).ok()
}

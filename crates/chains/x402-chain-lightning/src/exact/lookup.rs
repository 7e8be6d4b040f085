//! The pluggable "invoice lookup" port: the facilitator never embeds a
//! specific Lightning node's RPC client, since LND/CLN/LNbits all expose
//! incompatible wire formats. Deployments implement [`InvoiceLookup`] against
//! whichever node they run and hand it to [`crate::exact::LightningExact`].

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct InvoiceStatus {
    pub settled: bool,
    pub amount_msat: u64,
}

#[async_trait]
pub trait InvoiceLookup: Send + Sync {
    async fn lookup(
        &self,
        invoice_id: Option<&str>,
        bolt11: &str,
    ) -> Result<InvoiceStatus, LookupError>;
}

#[derive(Debug, thiserror::Error)]
#[error("invoice lookup error: {0}")]
pub struct LookupError(pub String);

/// PoC-grade stand-in used when no real node integration is wired up.
/// Always reports the invoice as settled for the amount the invoice itself
/// declares — good enough to exercise the scheme end to end, but it trusts
/// the payload's own `bolt11` amount rather than confirming payment with a
/// node. A production deployment must supply a real [`InvoiceLookup`].
pub struct UnverifiedInvoiceLookup;

#[async_trait]
impl InvoiceLookup for UnverifiedInvoiceLookup {
    async fn lookup(
        &self,
        _invoice_id: Option<&str>,
        bolt11: &str,
    ) -> Result<InvoiceStatus, LookupError> {
        let invoice: lightning_invoice::Bolt11Invoice = bolt11
            .parse()
            .map_err(|e: lightning_invoice::ParseOrSemanticError| LookupError(e.to_string()))?;
        let amount_msat = invoice.amount_milli_satoshis().unwrap_or(0);
        Ok(InvoiceStatus {
            settled: true,
            amount_msat,
        })
    }
}

#![cfg(feature = "client")]

//! Client-side payload assembly for the Lightning "exact" scheme.
//!
//! Unlike the on-chain rails, there is nothing to sign here: the BOLT11
//! invoice to pay is the server's own `payTo`, issued ahead of time. The
//! client's job is to pay it through whatever wallet it has and hand back
//! the same invoice (plus whatever identifier its wallet assigns) as proof.

use async_trait::async_trait;
use x402_types::proto::PaymentRequired;
use x402_types::scheme::X402SchemeId;
use x402_types::scheme::client::{PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient};

use crate::exact::LightningExact;
use crate::exact::types::{EXACT_SCHEME, ExactLightningPayload};

/// Pays a BOLT11 invoice through whatever wallet/node the client has access
/// to, returning a wallet-specific identifier for the payment if one exists.
#[async_trait]
pub trait InvoicePayer: Send + Sync {
    async fn pay(&self, bolt11: &str) -> Result<Option<String>, X402Error>;
}

pub struct LightningExactClient<W> {
    payer: W,
}

impl<W> LightningExactClient<W> {
    pub fn new(payer: W) -> Self {
        Self { payer }
    }
}

impl<W> X402SchemeId for LightningExactClient<W> {
    fn namespace(&self) -> &str {
        LightningExact.namespace()
    }
    fn scheme(&self) -> &str {
        LightningExact.scheme()
    }
}

impl<W> X402SchemeClient for LightningExactClient<W>
where
    W: InvoicePayer + Clone + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter(|r| r.scheme == EXACT_SCHEME && r.network.namespace == "lightning")
            .map(|requirements| PaymentCandidate {
                chain_id: requirements.network.clone(),
                asset: requirements.asset.clone(),
                amount: requirements.max_amount_required,
                scheme: EXACT_SCHEME.to_string(),
                pay_to: requirements.pay_to.clone(),
                signer: Box::new(PayloadSigner {
                    payer: self.payer.clone(),
                    bolt11: requirements.pay_to.clone(),
                    network: requirements.network.clone(),
                }),
            })
            .collect()
    }
}

struct PayloadSigner<W> {
    payer: W,
    bolt11: String,
    network: x402_types::chain::ChainId,
}

#[async_trait]
impl<W: InvoicePayer> PaymentCandidateSigner for PayloadSigner<W> {
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let invoice_id = self.payer.pay(&self.bolt11).await?;

        let payload = ExactLightningPayload {
            bolt11: self.bolt11.clone(),
            invoice_id,
        };
        let payload_value = serde_json::to_value(&payload)?;
        let envelope = x402_types::proto::PaymentPayload {
            x402_version: x402_types::proto::X402Version,
            scheme: EXACT_SCHEME.to_string(),
            network: self.network.clone(),
            payload: payload_value,
        };
        let json = serde_json::to_vec(&envelope)?;
        Ok(x402_types::util::Base64Bytes::encode(&json).to_string())
    }
}

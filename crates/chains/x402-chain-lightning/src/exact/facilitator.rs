//! Verification and settlement of the Lightning "exact" scheme. `verify` is
//! deliberately structural-only — decoding the BOLT11 invoice and checking it
//! hasn't expired — since confirming a Lightning payment actually landed
//! requires a node round-trip, which only `settle` performs.

use std::sync::Arc;

use x402_types::chain::ChainProviderOps;
use x402_types::proto;
use x402_types::proto::PaymentVerificationError;
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorError};

use crate::chain::LightningChainProvider;
use crate::exact::types::{EXACT_SCHEME, ExactLightningPayload, LightningExactError};

pub struct LightningExactFacilitator {
    provider: Arc<LightningChainProvider>,
}

impl LightningExactFacilitator {
    pub fn new(provider: Arc<LightningChainProvider>) -> Self {
        Self { provider }
    }
}

fn decode_and_check_structure(
    payload: &ExactLightningPayload,
) -> Result<lightning_invoice::Bolt11Invoice, LightningExactError> {
    if payload.bolt11.is_empty() || !payload.bolt11.to_lowercase().starts_with("ln") {
        return Err(LightningExactError::InvalidInvoice(
            "not an ln-prefixed BOLT11 string".into(),
        ));
    }
    let invoice: lightning_invoice::Bolt11Invoice = payload
        .bolt11
        .parse()
        .map_err(|e: lightning_invoice::ParseOrSemanticError| LightningExactError::InvalidInvoice(e.to_string()))?;
    if invoice.is_expired() {
        return Err(LightningExactError::InvoiceExpired);
    }
    Ok(invoice)
}

#[async_trait::async_trait]
impl X402SchemeFacilitator for LightningExactFacilitator {
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        let payload: ExactLightningPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| PaymentVerificationError::from(LightningExactError::MalformedPayload(e.to_string())))?;

        match decode_and_check_structure(&payload) {
            Ok(_invoice) => Ok(proto::VerifyResponse::valid("")),
            Err(e) => {
                let problem: PaymentVerificationError = e.into();
                let problem = x402_types::proto::AsPaymentProblem::as_payment_problem(&problem);
                Ok(proto::VerifyResponse::invalid(problem.reason, None))
            }
        }
    }

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        let payload: ExactLightningPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| PaymentVerificationError::from(LightningExactError::MalformedPayload(e.to_string())))?;
        let requirements = &request.payment_requirements;

        decode_and_check_structure(&payload).map_err(PaymentVerificationError::from)?;

        let status = self
            .provider
            .lookup()
            .lookup(payload.invoice_id.as_deref(), &payload.bolt11)
            .await
            .map_err(|e| PaymentVerificationError::from(LightningExactError::LookupFailed(e.0)))?;

        if !status.settled {
            return Err(PaymentVerificationError::from(LightningExactError::NotSettled).into());
        }
        let required = requirements.max_amount_required as u64;
        if status.amount_msat < required {
            return Err(PaymentVerificationError::from(LightningExactError::AmountMismatch {
                invoiced: status.amount_msat,
                required,
            })
            .into());
        }

        Ok(proto::SettleResponse::Success {
            payer: String::new(),
            transaction: payload.invoice_id.unwrap_or(payload.bolt11),
            network: requirements.network.clone(),
        })
    }

    async fn supported(&self) -> Result<proto::SupportedResponse, X402SchemeFacilitatorError> {
        Ok(proto::SupportedResponse {
            kinds: vec![proto::SupportedPaymentKind {
                scheme: EXACT_SCHEME.to_string(),
                network: self.provider.chain_id(),
                extra: None,
            }],
        })
    }
}

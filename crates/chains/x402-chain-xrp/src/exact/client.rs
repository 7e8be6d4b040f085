#![cfg(feature = "client")]

//! Client-side transaction building and signing for the XRP Ledger "exact"
//! scheme: a pre-signed native-currency `Payment` transaction, with the
//! account sequence, fee, and `LastLedgerSequence` window filled in from the
//! current ledger state.

use async_trait::async_trait;
use x402_types::proto::PaymentRequired;
use x402_types::scheme::X402SchemeId;
use x402_types::scheme::client::{PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient};

use crate::chain::rpc::XrplRpcClientLike;
use crate::exact::XrpExact;
use crate::exact::codec;
use crate::exact::types::{EXACT_SCHEME, ExactXrpPayload, XrpExactError};

impl From<XrpExactError> for X402Error {
    fn from(e: XrpExactError) -> Self {
        X402Error::SigningError(e.to_string())
    }
}

/// Builds and signs a `Payment` transaction paying `amount_drops` to
/// `destination`, with `Sequence`/`Fee`/`LastLedgerSequence` filled in from
/// the current ledger state.
pub async fn build_signed_payment_transaction<R: XrplRpcClientLike>(
    seed: &str,
    account: &str,
    rpc_client: &R,
    destination: &str,
    destination_tag: Option<u32>,
    amount_drops: u64,
    ledger_offset: u32,
) -> Result<String, XrpExactError> {
    let account_info = rpc_client
        .account_info(account)
        .await
        .map_err(|e| XrpExactError::SubmitFailed(e.to_string()))?;
    let fee_info = rpc_client
        .fee()
        .await
        .map_err(|e| XrpExactError::SubmitFailed(e.to_string()))?;
    let current_ledger = rpc_client
        .ledger_current()
        .await
        .map_err(|e| XrpExactError::SubmitFailed(e.to_string()))?;

    codec::build_signed_payment(
        seed,
        account,
        destination,
        destination_tag,
        amount_drops,
        fee_info.base_fee_drops,
        account_info.sequence,
        current_ledger + ledger_offset,
        None,
    )
}

pub struct XrpExactClient<R> {
    seed: String,
    account: String,
    rpc_client: R,
    ledger_offset: u32,
}

impl<R> XrpExactClient<R> {
    pub fn new(seed: impl Into<String>, account: impl Into<String>, rpc_client: R) -> Self {
        Self {
            seed: seed.into(),
            account: account.into(),
            rpc_client,
            ledger_offset: 20,
        }
    }

    pub fn with_ledger_offset(mut self, ledger_offset: u32) -> Self {
        self.ledger_offset = ledger_offset;
        self
    }
}

impl<R> X402SchemeId for XrpExactClient<R> {
    fn namespace(&self) -> &str {
        XrpExact.namespace()
    }
    fn scheme(&self) -> &str {
        XrpExact.scheme()
    }
}

impl<R> X402SchemeClient for XrpExactClient<R>
where
    R: XrplRpcClientLike + Clone + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter(|r| r.scheme == EXACT_SCHEME && r.network.namespace == "xrp")
            .map(|requirements| PaymentCandidate {
                chain_id: requirements.network.clone(),
                asset: requirements.asset.clone(),
                amount: requirements.max_amount_required,
                scheme: EXACT_SCHEME.to_string(),
                pay_to: requirements.pay_to.clone(),
                signer: Box::new(PayloadSigner {
                    seed: self.seed.clone(),
                    account: self.account.clone(),
                    rpc_client: self.rpc_client.clone(),
                    ledger_offset: self.ledger_offset,
                    requirements: requirements.clone(),
                }),
            })
            .collect()
    }
}

struct PayloadSigner<R> {
    seed: String,
    account: String,
    rpc_client: R,
    ledger_offset: u32,
    requirements: x402_types::proto::PaymentRequirements,
}

#[async_trait]
impl<R: XrplRpcClientLike> PaymentCandidateSigner for PayloadSigner<R> {
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let amount_drops: u64 = self
            .requirements
            .max_amount_required
            .try_into()
            .map_err(|_| X402Error::SigningError("amount does not fit in a u64 drop count".into()))?;

        let transaction = build_signed_payment_transaction(
            &self.seed,
            &self.account,
            &self.rpc_client,
            &self.requirements.pay_to,
            None,
            amount_drops,
            self.ledger_offset,
        )
        .await?;

        let payload = ExactXrpPayload { transaction };
        let payload_value = serde_json::to_value(&payload)?;
        let envelope = x402_types::proto::PaymentPayload {
            x402_version: x402_types::proto::X402Version,
            scheme: EXACT_SCHEME.to_string(),
            network: self.requirements.network.clone(),
            payload: payload_value,
        };
        let json = serde_json::to_vec(&envelope)?;
        Ok(x402_types::util::Base64Bytes::encode(&json).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_converts_to_signing_error() {
        let err: X402Error = XrpExactError::InvalidSignature.into();
        assert!(matches!(err, X402Error::SigningError(_)));
    }
}

//! Verification and settlement of the XRP Ledger "exact" scheme: checks a
//! pre-signed native-currency `Payment` transaction against requirements and
//! account state, then submits it and waits for ledger validation.

use std::sync::Arc;
use std::time::Duration;

use x402_types::chain::ChainProviderOps;
use x402_types::proto;
use x402_types::proto::PaymentVerificationError;
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorError};

use crate::chain::XrpChainProvider;
use crate::exact::codec;
use crate::exact::types::{DecodedPayment, EXACT_SCHEME, ExactXrpPayload, XrpExactError};

/// Mainnet reserve requirements, used to approximate "balance after reserve"
/// when the facilitator has no `server_info` call wired up. Conservative
/// for test networks, where reserves are usually lower.
const BASE_RESERVE_DROPS: u64 = 10_000_000;
const OWNER_RESERVE_DROPS: u64 = 2_000_000;

pub struct XrpExactFacilitator {
    provider: Arc<XrpChainProvider>,
}

impl XrpExactFacilitator {
    pub fn new(provider: Arc<XrpChainProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl X402SchemeFacilitator for XrpExactFacilitator {
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        let payload: ExactXrpPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| PaymentVerificationError::from(XrpExactError::MalformedPayload(e.to_string())))?;
        let requirements = &request.payment_requirements;

        match assert_valid_payment(&self.provider, &payload, requirements).await {
            Ok(decoded) => Ok(proto::VerifyResponse::valid(decoded.account)),
            Err(e) => {
                let account = codec::decode_signed_payment(&payload.transaction)
                    .ok()
                    .map(|d| d.account);
                let problem: PaymentVerificationError = e.into();
                let problem = x402_types::proto::AsPaymentProblem::as_payment_problem(&problem);
                Ok(proto::VerifyResponse::invalid(problem.reason, account))
            }
        }
    }

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        let payload: ExactXrpPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| PaymentVerificationError::from(XrpExactError::MalformedPayload(e.to_string())))?;
        let requirements = &request.payment_requirements;

        let decoded: DecodedPayment = assert_valid_payment(&self.provider, &payload, requirements)
            .await
            .map_err(PaymentVerificationError::from)?;

        let rpc = self.provider.rpc_client();
        let mut last_error = String::new();
        let mut tx_hash = None;
        for attempt in 0..=self.provider.max_retries() {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_millis(self.provider.retry_delay_ms())).await;
            }
            match rpc.submit(&payload.transaction).await {
                Ok(result) if result.accepted => {
                    tx_hash = result.tx_hash;
                    break;
                }
                Ok(result) => {
                    last_error = format!("{}: {}", result.engine_result, result.engine_result_message);
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
        }
        let tx_hash =
            tx_hash.ok_or_else(|| PaymentVerificationError::from(XrpExactError::SubmitFailed(last_error)))?;

        let deadline = Duration::from_millis(self.provider.validation_timeout_ms());
        let poll_interval = Duration::from_millis(1000);
        let start = std::time::Instant::now();
        loop {
            if let Ok(status) = rpc.tx(&tx_hash).await {
                if status.validated {
                    if !status.successful {
                        return Err(X402SchemeFacilitatorError::from(PaymentVerificationError::from(
                            XrpExactError::SubmitFailed("transaction validated but not successful".into()),
                        )));
                    }
                    break;
                }
            }
            if start.elapsed() >= deadline {
                return Err(X402SchemeFacilitatorError::from(PaymentVerificationError::from(
                    XrpExactError::ConfirmationTimedOut,
                )));
            }
            tokio::time::sleep(poll_interval).await;
        }

        Ok(proto::SettleResponse::Success {
            payer: decoded.account,
            transaction: tx_hash,
            network: requirements.network.clone(),
        })
    }

    async fn supported(&self) -> Result<proto::SupportedResponse, X402SchemeFacilitatorError> {
        let chain_id = self.provider.chain_id();
        Ok(proto::SupportedResponse {
            kinds: vec![proto::SupportedPaymentKind {
                scheme: EXACT_SCHEME.to_string(),
                network: chain_id,
                extra: None,
            }],
        })
    }
}

async fn assert_valid_payment(
    provider: &XrpChainProvider,
    payload: &ExactXrpPayload,
    requirements: &proto::PaymentRequirements,
) -> Result<DecodedPayment, XrpExactError> {
    let decoded = codec::decode_signed_payment(&payload.transaction)?;
    codec::verify_signature(&payload.transaction)?;

    let derived = codec::classic_address_from_public_key(&decoded.signing_pub_key)?;
    if derived != decoded.account {
        return Err(XrpExactError::InvalidSignature);
    }

    if decoded.destination != requirements.pay_to {
        return Err(XrpExactError::DestinationMismatch {
            expected: requirements.pay_to.clone(),
            actual: decoded.destination.clone(),
        });
    }

    if (decoded.amount_drops as u128) < requirements.max_amount_required {
        return Err(XrpExactError::AmountInsufficient {
            authorized: decoded.amount_drops as u128,
            required: requirements.max_amount_required,
        });
    }

    let current_ledger = provider
        .rpc_client()
        .ledger_current()
        .await
        .map_err(|e| XrpExactError::SubmitFailed(e.to_string()))?;
    let last_ledger_sequence = decoded
        .last_ledger_sequence
        .ok_or(XrpExactError::MissingLastLedgerSequence)?;
    if last_ledger_sequence <= current_ledger
        || last_ledger_sequence > current_ledger + provider.ledger_offset()
    {
        return Err(XrpExactError::LedgerWindowInvalid {
            last_ledger_sequence,
            current_ledger,
        });
    }

    let account_info = provider
        .rpc_client()
        .account_info(&decoded.account)
        .await
        .map_err(|e| XrpExactError::SubmitFailed(e.to_string()))?;
    if decoded.sequence < account_info.sequence
        || decoded.sequence > account_info.sequence + provider.queue_size()
    {
        return Err(XrpExactError::SequenceOutOfWindow {
            expected: account_info.sequence,
            actual: decoded.sequence,
        });
    }

    let reserve = BASE_RESERVE_DROPS + OWNER_RESERVE_DROPS * account_info.owner_count as u64;
    let required = decoded.amount_drops.saturating_add(decoded.fee_drops);
    if account_info.balance_drops < reserve.saturating_add(required) {
        return Err(XrpExactError::InsufficientBalance);
    }

    Ok(decoded)
}

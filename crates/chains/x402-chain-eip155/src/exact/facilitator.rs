//! Verification and settlement of the EIP-155 "exact" scheme: recovers the
//! signer from the EIP-712 authorization, checks it against requirements and
//! on-chain balance, then submits `transferWithAuthorization`.

use alloy_primitives::{Address, U256};
use alloy_provider::Provider;
use alloy_sol_types::{Eip712Domain, SolCall, SolStruct, eip712_domain};
use std::collections::HashMap;
use x402_types::chain::ChainProviderOps;
use x402_types::proto;
use x402_types::proto::PaymentVerificationError;
use x402_types::scheme::{X402SchemeFacilitator, X402SchemeFacilitatorError};
use x402_types::timestamp::UnixTimestamp;

use crate::chain::ieip3009::IEIP3009;
use crate::chain::provider::MetaTransaction;
use crate::chain::{Eip155ChainReference, Eip155MetaTransactionProvider};
use crate::exact::types::{
    Eip155ExactError, EXACT_SCHEME, ExactEvmPayload, ExactEvmPayloadAuthorization,
    TransferWithAuthorization,
};

pub struct Eip155ExactFacilitator<P> {
    provider: P,
}

impl<P> Eip155ExactFacilitator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P> X402SchemeFacilitator for Eip155ExactFacilitator<P>
where
    P: Eip155MetaTransactionProvider + ChainProviderOps + Send + Sync,
    P::Inner: Provider + Clone,
    P::Error: std::fmt::Display,
{
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        let payload: ExactEvmPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| Eip155ExactError::MalformedPayload(e.to_string()))?;
        let requirements = &request.payment_requirements;

        match assert_valid_payment(self.provider.inner(), self.provider.chain(), &payload, requirements)
            .await
        {
            Ok(()) => Ok(proto::VerifyResponse::valid(payload.authorization.from.to_string())),
            Err(e) => {
                let problem = x402_types::proto::AsPaymentProblem::as_payment_problem(&e);
                Ok(proto::VerifyResponse::invalid(
                    problem.reason,
                    Some(payload.authorization.from.to_string()),
                ))
            }
        }
    }

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        let payload: ExactEvmPayload = serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| Eip155ExactError::MalformedPayload(e.to_string()))?;
        let requirements = &request.payment_requirements;

        assert_valid_payment(self.provider.inner(), self.provider.chain(), &payload, requirements).await?;

        let contract = IEIP3009::new(
            str_to_address(&requirements.asset)?,
            self.provider.inner().clone(),
        );
        let auth = &payload.authorization;
        let (v, r, s) = split_signature(&payload.signature)
            .map_err(Eip155ExactError::MalformedPayload)?;
        let call = contract.transferWithAuthorization_0(
            auth.from,
            auth.to,
            auth.value,
            U256::from(auth.valid_after.as_secs()),
            U256::from(auth.valid_before.as_secs()),
            auth.nonce,
            v,
            r,
            s,
        );
        let calldata = call.calldata().clone();
        let tx = MetaTransaction {
            to: str_to_address(&requirements.asset)?,
            calldata,
            confirmations: 1,
        };
        let receipt = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| Eip155ExactError::ContractCall(e.to_string()))?;

        Ok(proto::SettleResponse::Success {
            payer: auth.from.to_string(),
            transaction: receipt.transaction_hash.to_string(),
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

fn str_to_address(s: &str) -> Result<Address, Eip155ExactError> {
    s.parse()
        .map_err(|_| Eip155ExactError::MalformedPayload(format!("invalid address {s}")))
}

/// Splits a 65-byte EOA signature into its (v, r, s) components as expected
/// by the standard ERC-3009 `transferWithAuthorization` overload.
fn split_signature(sig: &[u8]) -> Result<(u8, [u8; 32], [u8; 32]), String> {
    if sig.len() != 65 {
        return Err(format!("expected a 65-byte EOA signature, got {} bytes", sig.len()));
    }
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig[0..32]);
    s.copy_from_slice(&sig[32..64]);
    let v = sig[64];
    Ok((v, r, s))
}

async fn assert_valid_payment<P: Provider>(
    provider: P,
    chain: &Eip155ChainReference,
    payload: &ExactEvmPayload,
    requirements: &proto::PaymentRequirements,
) -> Result<(), PaymentVerificationError> {
    let chain_id: x402_types::chain::ChainId = chain.into();
    if requirements.network != chain_id {
        return Err(PaymentVerificationError::NetworkMismatch {
            expected: requirements.network.clone(),
            actual: chain_id,
        });
    }
    let auth = &payload.authorization;
    if auth.to.to_string() != requirements.pay_to {
        return Err(PaymentVerificationError::RecipientMismatch {
            expected: requirements.pay_to.clone(),
            actual: auth.to.to_string(),
        });
    }
    let now = UnixTimestamp::now();
    if now < auth.valid_after {
        return Err(PaymentVerificationError::NotYetValid);
    }
    if now >= auth.valid_before {
        return Err(PaymentVerificationError::Expired);
    }
    if auth.value < U256::from(requirements.max_amount_required) {
        return Err(PaymentVerificationError::InsufficientValue {
            authorized: auth.value.to::<u128>(),
            required: requirements.max_amount_required,
        });
    }

    let asset_address =
        str_to_address(&requirements.asset).map_err(|e| PaymentVerificationError::Unexpected(e.to_string()))?;
    let contract = IEIP3009::new(asset_address, &provider);

    let (name, version) = domain_name_version(requirements);
    let domain = eip712_domain! {
        name: name,
        version: version,
        chain_id: Eip155ChainReference::try_from(&requirements.network)
            .map_err(|e| PaymentVerificationError::Unexpected(e.to_string()))?
            .inner(),
        verifying_contract: asset_address,
    };
    let recovered = recover_signer(&domain, auth, &payload.signature)
        .map_err(PaymentVerificationError::InvalidSignature)?;
    if recovered != auth.from {
        return Err(PaymentVerificationError::InvalidSignature(
            "signature does not match authorization.from".to_string(),
        ));
    }

    let balance = contract
        .balanceOf(auth.from)
        .call()
        .await
        .map_err(|e| PaymentVerificationError::Unexpected(e.to_string()))?;
    if balance < auth.value {
        return Err(PaymentVerificationError::InsufficientFunds);
    }
    Ok(())
}

fn domain_name_version(requirements: &proto::PaymentRequirements) -> (String, String) {
    match &requirements.extra {
        Some(proto::SchemeExtra::EvmDomain { name, version }) => (name.clone(), version.clone()),
        _ => (String::new(), String::new()),
    }
}

fn recover_signer(
    domain: &Eip712Domain,
    auth: &ExactEvmPayloadAuthorization,
    signature: &[u8],
) -> Result<Address, String> {
    let (v, r, s) = split_signature(signature)?;
    let struct_hash = TransferWithAuthorization {
        from: auth.from,
        to: auth.to,
        value: auth.value,
        validAfter: U256::from(auth.valid_after.as_secs()),
        validBefore: U256::from(auth.valid_before.as_secs()),
        nonce: auth.nonce,
    };
    let hash = struct_hash.eip712_signing_hash(domain);
    let y_parity = v >= 27 && (v - 27) == 1 || v == 1;
    let signature = alloy_primitives::Signature::new(
        U256::from_be_bytes(r),
        U256::from_be_bytes(s),
        y_parity,
    );
    signature
        .recover_address_from_prehash(&hash)
        .map_err(|e| e.to_string())
}

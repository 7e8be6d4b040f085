//! Client-side signing for the EIP-155 "exact" scheme.

use alloy_primitives::{Address, FixedBytes, Signature as AlloySignature, U256};
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::{SolStruct, eip712_domain};
use async_trait::async_trait;
use rand::{Rng, rng};
use std::sync::Arc;
use x402_types::proto::{PaymentRequired, SchemeExtra};
use x402_types::scheme::X402SchemeId;
use x402_types::scheme::client::{
    PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient,
};
use x402_types::timestamp::UnixTimestamp;

use crate::chain::Eip155ChainReference;
use crate::exact::Eip155Exact;
use crate::exact::types::{
    EXACT_SCHEME, ExactEvmPayload, ExactEvmPayloadAuthorization, TransferWithAuthorization,
};

/// Abstracts over owned and `Arc`-shared signers, since Alloy's `Signer`
/// trait isn't implemented for `Arc<T>`.
#[async_trait]
pub trait SignerLike: Send + Sync {
    fn address(&self) -> Address;
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<AlloySignature, alloy_signer::Error>;
}

#[async_trait]
impl SignerLike for PrivateKeySigner {
    fn address(&self) -> Address {
        PrivateKeySigner::address(self)
    }
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<AlloySignature, alloy_signer::Error> {
        alloy_signer::Signer::sign_hash(self, hash).await
    }
}

#[async_trait]
impl<T: SignerLike> SignerLike for Arc<T> {
    fn address(&self) -> Address {
        (**self).address()
    }
    async fn sign_hash(&self, hash: &FixedBytes<32>) -> Result<AlloySignature, alloy_signer::Error> {
        (**self).sign_hash(hash).await
    }
}

pub struct Eip155ExactClient<S> {
    signer: S,
}

impl<S> Eip155ExactClient<S> {
    pub fn new(signer: S) -> Self {
        Self { signer }
    }
}

impl<S> X402SchemeId for Eip155ExactClient<S> {
    fn namespace(&self) -> &str {
        Eip155Exact.namespace()
    }
    fn scheme(&self) -> &str {
        Eip155Exact.scheme()
    }
}

impl<S> X402SchemeClient for Eip155ExactClient<S>
where
    S: SignerLike + Clone + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter(|r| r.scheme == EXACT_SCHEME && r.network.namespace == "eip155")
            .filter_map(|requirements| {
                let chain_reference = Eip155ChainReference::try_from(&requirements.network).ok()?;
                Some(PaymentCandidate {
                    chain_id: requirements.network.clone(),
                    asset: requirements.asset.clone(),
                    amount: requirements.max_amount_required,
                    scheme: EXACT_SCHEME.to_string(),
                    pay_to: requirements.pay_to.clone(),
                    signer: Box::new(PayloadSigner {
                        signer: self.signer.clone(),
                        chain_reference,
                        requirements: requirements.clone(),
                    }),
                })
            })
            .collect()
    }
}

struct PayloadSigner<S> {
    signer: S,
    chain_reference: Eip155ChainReference,
    requirements: x402_types::proto::PaymentRequirements,
}

#[async_trait]
impl<S: SignerLike> PaymentCandidateSigner for PayloadSigner<S> {
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let pay_to: Address = self
            .requirements
            .pay_to
            .parse()
            .map_err(|_| X402Error::SigningError("invalid pay_to address".into()))?;
        let asset_address: Address = self
            .requirements
            .asset
            .parse()
            .map_err(|_| X402Error::SigningError("invalid asset address".into()))?;
        let (name, version) = match &self.requirements.extra {
            Some(SchemeExtra::EvmDomain { name, version }) => (name.clone(), version.clone()),
            _ => (String::new(), String::new()),
        };

        let domain = eip712_domain! {
            name: name,
            version: version,
            chain_id: self.chain_reference.inner(),
            verifying_contract: asset_address,
        };

        let now = UnixTimestamp::now();
        let valid_after = UnixTimestamp::from_secs(now.as_secs().saturating_sub(10 * 60));
        let valid_before = now + self.requirements.max_timeout_seconds;
        let nonce = FixedBytes(rng().random::<[u8; 32]>());

        let authorization = ExactEvmPayloadAuthorization {
            from: self.signer.address(),
            to: pay_to,
            value: U256::from(self.requirements.max_amount_required),
            valid_after,
            valid_before,
            nonce,
        };

        let struct_hash = TransferWithAuthorization {
            from: authorization.from,
            to: authorization.to,
            value: authorization.value,
            validAfter: U256::from(authorization.valid_after.as_secs()),
            validBefore: U256::from(authorization.valid_before.as_secs()),
            nonce: authorization.nonce,
        };
        let hash = struct_hash.eip712_signing_hash(&domain);
        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| X402Error::SigningError(e.to_string()))?;

        let payload = ExactEvmPayload {
            signature: signature.as_bytes().into(),
            authorization,
        };
        let payload_value =
            serde_json::to_value(&payload).map_err(|e| X402Error::SigningError(e.to_string()))?;
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

impl<S> Eip155ExactClient<S> {
    pub fn with_random_signer() -> Eip155ExactClient<PrivateKeySigner> {
        Eip155ExactClient::new(PrivateKeySigner::random())
    }
}

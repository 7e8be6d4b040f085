#![cfg(feature = "client")]

//! Client-side transaction building and signing for the Solana "exact"
//! scheme: a pre-signed SPL Token `TransferChecked` transaction, with compute
//! budget and priority fee instructions sized from simulation.

use async_trait::async_trait;
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_message::v0::Message as MessageV0;
use solana_message::{Hash, VersionedMessage};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Instruction;
use solana_transaction::versioned::VersionedTransaction;
use spl_token::solana_program::program_pack::Pack;
use x402_types::proto::PaymentRequired;
use x402_types::scheme::X402SchemeId;
use x402_types::scheme::client::{
    PaymentCandidate, PaymentCandidateSigner, X402Error, X402SchemeClient,
};
use x402_types::util::Base64Bytes;

use crate::chain::Address;
use crate::chain::rpc::RpcClientLike;
use crate::exact::SolanaExact;
use crate::exact::types::{ATA_PROGRAM_PUBKEY, EXACT_SCHEME, ExactSolanaPayload, MEMO_PROGRAM_PUBKEY, TransactionInt};

/// Mint information for an SPL token.
#[derive(Debug)]
pub enum Mint {
    Token { decimals: u8, token_program: Pubkey },
    Token2022 { decimals: u8, token_program: Pubkey },
}

impl Mint {
    pub fn token_program(&self) -> &Pubkey {
        match self {
            Mint::Token { token_program, .. } => token_program,
            Mint::Token2022 { token_program, .. } => token_program,
        }
    }
}

pub async fn fetch_mint<R: RpcClientLike>(
    mint_address: &Address,
    rpc_client: &R,
) -> Result<Mint, X402Error> {
    let mint_pubkey = mint_address.pubkey();
    let account = rpc_client
        .get_account(mint_pubkey)
        .await
        .map_err(|e| X402Error::SigningError(format!("failed to fetch mint {mint_pubkey}: {e}")))?;
    if account.owner == spl_token::id() {
        let mint = spl_token::state::Mint::unpack(&account.data).map_err(|e| {
            X402Error::SigningError(format!("failed to unpack mint {mint_pubkey}: {e}"))
        })?;
        Ok(Mint::Token {
            decimals: mint.decimals,
            token_program: spl_token::id(),
        })
    } else if account.owner == spl_token_2022::id() {
        let mint = spl_token_2022::state::Mint::unpack(&account.data).map_err(|e| {
            X402Error::SigningError(format!("failed to unpack mint {mint_pubkey}: {e}"))
        })?;
        Ok(Mint::Token2022 {
            decimals: mint.decimals,
            token_program: spl_token_2022::id(),
        })
    } else {
        Err(X402Error::SigningError(format!(
            "failed to unpack mint {mint_pubkey}: unknown owner"
        )))
    }
}

pub fn build_message_to_simulate(
    fee_payer: Pubkey,
    transfer_instructions: &[Instruction],
    priority_micro_lamports: u64,
    recent_blockhash: Hash,
) -> Result<(MessageV0, Vec<Instruction>), X402Error> {
    let set_price = ComputeBudgetInstruction::set_compute_unit_price(priority_micro_lamports);

    let mut ixs = Vec::with_capacity(1 + transfer_instructions.len());
    ixs.push(set_price);
    ixs.extend(transfer_instructions.to_owned());

    let with_cu_limit = {
        let mut ixs_mod = ixs.clone();
        update_or_append_set_compute_unit_limit(&mut ixs_mod, 1e5 as u32);
        ixs_mod
    };
    let message = MessageV0::try_compile(&fee_payer, &with_cu_limit, &[], recent_blockhash)
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;
    Ok((message, ixs))
}

pub async fn estimate_compute_units<S: RpcClientLike>(
    rpc_client: &S,
    message: &MessageV0,
) -> Result<u32, X402Error> {
    let message = VersionedMessage::V0(message.clone());
    let num_required_signatures = message.header().num_required_signatures;
    let tx = VersionedTransaction {
        signatures: vec![Signature::default(); num_required_signatures as usize],
        message,
    };

    let sim = rpc_client
        .simulate_transaction_with_config(
            &tx,
            RpcSimulateTransactionConfig {
                sig_verify: false,
                replace_recent_blockhash: true,
                ..RpcSimulateTransactionConfig::default()
            },
        )
        .await
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;
    let units = sim
        .value
        .units_consumed
        .ok_or_else(|| X402Error::SigningError("simulation returned no units_consumed".to_string()))?;
    Ok(units as u32)
}

pub async fn get_priority_fee_micro_lamports<S: RpcClientLike>(
    rpc_client: &S,
    writeable_accounts: &[Pubkey],
) -> Result<u64, X402Error> {
    let recent_fees = rpc_client
        .get_recent_prioritization_fees(writeable_accounts)
        .await
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;
    let fee = recent_fees
        .iter()
        .filter_map(|e| (e.prioritization_fee > 0).then_some(e.prioritization_fee))
        .min()
        .unwrap_or(1);
    Ok(fee)
}

pub fn update_or_append_set_compute_unit_limit(ixs: &mut Vec<Instruction>, units: u32) {
    let target_program = solana_compute_budget_interface::ID;
    let new_ix = ComputeBudgetInstruction::set_compute_unit_limit(units);

    let ix = ixs
        .iter_mut()
        .find(|ix| ix.program_id == target_program && ix.data.is_empty());
    if let Some(ix) = ix {
        *ix = new_ix;
    } else {
        ixs.push(new_ix);
    }
}

/// Builds a memo instruction with a random nonce, preventing duplicate
/// transaction attacks by ensuring each transaction has a unique message.
/// The SPL Memo program requires valid UTF-8 data, so the bytes are
/// base64-encoded first.
fn build_random_memo_ix() -> Instruction {
    let nonce: [u8; 16] = rand::random();
    let memo_data = Base64Bytes::encode(nonce).to_string();
    Instruction::new_with_bytes(MEMO_PROGRAM_PUBKEY, memo_data.as_bytes(), Vec::new())
}

/// Builds and signs a Solana SPL token transfer transaction, returning the
/// base64-encoded signed transaction ready to hand to a facilitator.
pub async fn build_signed_transfer_transaction<S: Signer, R: RpcClientLike>(
    signer: &S,
    rpc_client: &R,
    fee_payer: &Pubkey,
    pay_to: &Address,
    asset: &Address,
    amount: u64,
) -> Result<String, X402Error> {
    let mint = fetch_mint(asset, rpc_client).await?;

    let (destination_ata, _) = Pubkey::find_program_address(
        &[pay_to.as_ref(), mint.token_program().as_ref(), asset.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );

    let client_pubkey = signer.pubkey();
    let (source_ata, _) = Pubkey::find_program_address(
        &[client_pubkey.as_ref(), mint.token_program().as_ref(), asset.as_ref()],
        &ATA_PROGRAM_PUBKEY,
    );

    let transfer_instruction = match mint {
        Mint::Token { decimals, token_program } => spl_token::instruction::transfer_checked(
            &token_program,
            &source_ata,
            asset.pubkey(),
            &destination_ata,
            &client_pubkey,
            &[],
            amount,
            decimals,
        )
        .map_err(|e| X402Error::SigningError(format!("{e}")))?,
        Mint::Token2022 { decimals, token_program } => spl_token_2022::instruction::transfer_checked(
            &token_program,
            &source_ata,
            asset.pubkey(),
            &destination_ata,
            &client_pubkey,
            &[],
            amount,
            decimals,
        )
        .map_err(|e| X402Error::SigningError(format!("{e}")))?,
    };

    let recent_blockhash = rpc_client
        .get_latest_blockhash()
        .await
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;

    let fee = get_priority_fee_micro_lamports(rpc_client, &[*fee_payer, destination_ata, source_ata]).await?;

    let memo_ix = build_random_memo_ix();
    let full_transfer_instructions = vec![transfer_instruction, memo_ix];
    let (msg_to_sim, instructions) =
        build_message_to_simulate(*fee_payer, &full_transfer_instructions, fee, recent_blockhash)?;

    let estimated_cu = estimate_compute_units(rpc_client, &msg_to_sim).await?;

    let cu_ix = ComputeBudgetInstruction::set_compute_unit_limit(estimated_cu);
    let msg = {
        let mut final_instructions = Vec::with_capacity(instructions.len() + 2);
        final_instructions.push(cu_ix);
        final_instructions.extend(instructions);
        MessageV0::try_compile(fee_payer, &final_instructions, &[], recent_blockhash)
            .map_err(|e| X402Error::SigningError(format!("{e:?}")))?
    };

    let tx = VersionedTransaction {
        signatures: vec![],
        message: VersionedMessage::V0(msg),
    };

    let tx = TransactionInt::new(tx);
    let signed = tx
        .sign_with_keypair(signer)
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))?;
    signed
        .as_base64()
        .map_err(|e| X402Error::SigningError(format!("{e:?}")))
}

pub struct SolanaExactClient<S, R> {
    signer: S,
    rpc_client: R,
}

impl<S, R> SolanaExactClient<S, R> {
    pub fn new(signer: S, rpc_client: R) -> Self {
        Self { signer, rpc_client }
    }
}

impl<S, R> X402SchemeId for SolanaExactClient<S, R> {
    fn namespace(&self) -> &str {
        SolanaExact.namespace()
    }
    fn scheme(&self) -> &str {
        SolanaExact.scheme()
    }
}

impl<S, R> X402SchemeClient for SolanaExactClient<S, R>
where
    S: Signer + Send + Sync + Clone + 'static,
    R: RpcClientLike + Send + Sync + Clone + 'static,
{
    fn accept(&self, payment_required: &PaymentRequired) -> Vec<PaymentCandidate> {
        payment_required
            .accepts
            .iter()
            .filter(|r| r.scheme == EXACT_SCHEME && r.network.namespace == "solana")
            .map(|requirements| PaymentCandidate {
                chain_id: requirements.network.clone(),
                asset: requirements.asset.clone(),
                amount: requirements.max_amount_required,
                scheme: EXACT_SCHEME.to_string(),
                pay_to: requirements.pay_to.clone(),
                signer: Box::new(PayloadSigner {
                    signer: self.signer.clone(),
                    rpc_client: self.rpc_client.clone(),
                    requirements: requirements.clone(),
                }),
            })
            .collect()
    }
}

struct PayloadSigner<S, R> {
    signer: S,
    rpc_client: R,
    requirements: x402_types::proto::PaymentRequirements,
}

#[async_trait]
impl<S: Signer + Sync, R: RpcClientLike + Sync> PaymentCandidateSigner for PayloadSigner<S, R> {
    async fn sign_payment(&self) -> Result<String, X402Error> {
        let fee_payer: Address = match &self.requirements.extra {
            Some(x402_types::proto::SchemeExtra::SvmFeePayer { fee_payer }) => fee_payer
                .parse()
                .map_err(|_| X402Error::SigningError("invalid fee payer address".to_string()))?,
            _ => return Err(X402Error::SigningError("missing fee_payer in extra".to_string())),
        };
        let pay_to: Address = self
            .requirements
            .pay_to
            .parse()
            .map_err(|_| X402Error::SigningError("invalid pay_to address".to_string()))?;
        let asset: Address = self
            .requirements
            .asset
            .parse()
            .map_err(|_| X402Error::SigningError("invalid asset address".to_string()))?;
        let amount = u64::try_from(self.requirements.max_amount_required)
            .map_err(|_| X402Error::SigningError("amount does not fit in u64".to_string()))?;

        let tx_b64 = build_signed_transfer_transaction(
            &self.signer,
            &self.rpc_client,
            fee_payer.pubkey(),
            &pay_to,
            &asset,
            amount,
        )
        .await?;

        let payload = ExactSolanaPayload { transaction: tx_b64 };
        let payload_value = serde_json::to_value(&payload)?;
        let envelope = x402_types::proto::PaymentPayload {
            x402_version: x402_types::proto::X402Version,
            scheme: EXACT_SCHEME.to_string(),
            network: self.requirements.network.clone(),
            payload: payload_value,
        };
        let json = serde_json::to_vec(&envelope)?;
        Ok(Base64Bytes::encode(&json).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_or_append_set_compute_unit_limit_appends_when_absent() {
        let mut ixs = vec![Instruction::new_with_bytes(Pubkey::new_unique(), &[1, 2, 3], Vec::new())];
        update_or_append_set_compute_unit_limit(&mut ixs, 100_000);
        assert_eq!(ixs.len(), 2);
        assert_eq!(ixs[1].program_id, solana_compute_budget_interface::ID);
    }

    #[test]
    fn memo_instruction_targets_memo_program() {
        let ix = build_random_memo_ix();
        assert_eq!(ix.program_id, MEMO_PROGRAM_PUBKEY);
        assert!(ix.accounts.is_empty());
        assert!(!ix.data.is_empty());
    }

    #[test]
    fn mint_token_program_matches_variant() {
        let token = Mint::Token { decimals: 6, token_program: spl_token::id() };
        let token_2022 = Mint::Token2022 { decimals: 9, token_program: spl_token_2022::id() };
        assert_eq!(*token.token_program(), spl_token::id());
        assert_eq!(*token_2022.token_program(), spl_token_2022::id());
    }
}

#![cfg(feature = "facilitator")]

//! Verification and settlement of the Solana "exact" scheme: validates the
//! SPL `TransferChecked` instruction embedded in a pre-signed transaction,
//! simulates it, then co-signs and submits it as the fee payer.

use serde::{Deserialize, Serialize};
use solana_client::rpc_config::RpcSimulateTransactionConfig;
use solana_client::rpc_response::{TransactionError, UiTransactionError};
use solana_commitment_config::CommitmentConfig;
use solana_compute_budget_interface::ID as ComputeBudgetInstructionId;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;
use x402_types::chain::ChainProviderOps;
use x402_types::proto;
use x402_types::proto::{PaymentVerificationError, SchemeExtra};
use x402_types::scheme::{
    X402SchemeFacilitator, X402SchemeFacilitatorBuilder, X402SchemeFacilitatorError,
};
use x402_types::util::Base64Bytes;

#[cfg(feature = "telemetry")]
use tracing_core::Level;

use crate::SolanaExact;
use crate::chain::Address;
use crate::chain::provider::{SolanaChainProviderError, SolanaChainProviderLike};
use crate::exact::types::{
    ATA_PROGRAM_PUBKEY, EXACT_SCHEME, ExactSolanaPayload, PHANTOM_LIGHTHOUSE_PROGRAM,
    SolanaExactError, TransactionInt, TransferCheckedInstruction, TransferRequirement,
    VerifyTransferResult,
};

impl<P> X402SchemeFacilitatorBuilder<P> for SolanaExact
where
    P: SolanaChainProviderLike + ChainProviderOps + Send + Sync + 'static,
{
    fn build(
        &self,
        provider: P,
        config: Option<serde_json::Value>,
    ) -> Result<Box<dyn X402SchemeFacilitator>, Box<dyn std::error::Error>> {
        let config = config
            .map(serde_json::from_value::<SolanaExactFacilitatorConfig>)
            .transpose()?
            .unwrap_or_default();

        Ok(Box::new(SolanaExactFacilitator::new(provider, config)))
    }
}

pub struct SolanaExactFacilitator<P> {
    provider: P,
    config: SolanaExactFacilitatorConfig,
}

impl<P> SolanaExactFacilitator<P> {
    pub fn new(provider: P, config: SolanaExactFacilitatorConfig) -> Self {
        Self { provider, config }
    }
}

#[async_trait::async_trait]
impl<P> X402SchemeFacilitator for SolanaExactFacilitator<P>
where
    P: SolanaChainProviderLike + ChainProviderOps + Send + Sync,
{
    async fn verify(
        &self,
        request: &proto::VerifyRequest,
    ) -> Result<proto::VerifyResponse, X402SchemeFacilitatorError> {
        let verification = verify_transfer(&self.provider, request, &self.config).await?;
        Ok(proto::VerifyResponse::valid(verification.payer.to_string()))
    }

    async fn settle(
        &self,
        request: &proto::SettleRequest,
    ) -> Result<proto::SettleResponse, X402SchemeFacilitatorError> {
        let network = request.payment_requirements.network.clone();
        let verification = verify_transfer(&self.provider, request, &self.config).await?;
        let payer = verification.payer.to_string();
        let tx_sig = settle_transaction(&self.provider, verification).await?;
        Ok(proto::SettleResponse::Success {
            payer,
            transaction: tx_sig.to_string(),
            network,
        })
    }

    async fn supported(&self) -> Result<proto::SupportedResponse, X402SchemeFacilitatorError> {
        let chain_id = self.provider.chain_id();
        let fee_payer = self.provider.fee_payer();
        Ok(proto::SupportedResponse {
            kinds: vec![proto::SupportedPaymentKind {
                scheme: EXACT_SCHEME.to_string(),
                network: chain_id,
                extra: Some(SchemeExtra::SvmFeePayer {
                    fee_payer: fee_payer.to_string(),
                }),
            }],
        })
    }
}

pub fn verify_compute_limit_instruction(
    transaction: &VersionedTransaction,
    instruction_index: usize,
) -> Result<u32, SolanaExactError> {
    let instructions = transaction.message.instructions();
    let instruction = instructions
        .get(instruction_index)
        .ok_or(SolanaExactError::NoInstructionAtIndex(instruction_index))?;
    let account = instruction.program_id(transaction.message.static_account_keys());
    let data = instruction.data.as_slice();

    if ComputeBudgetInstructionId.ne(account) || data.first().cloned().unwrap_or(0) != 2 || data.len() != 5
    {
        return Err(SolanaExactError::InvalidComputeLimitInstruction);
    }

    let mut buf = [0u8; 4];
    buf.copy_from_slice(&data[1..5]);
    Ok(u32::from_le_bytes(buf))
}

pub fn verify_compute_price_instruction(
    max_compute_unit_price: u64,
    transaction: &VersionedTransaction,
    instruction_index: usize,
) -> Result<(), SolanaExactError> {
    let instructions = transaction.message.instructions();
    let instruction = instructions
        .get(instruction_index)
        .ok_or(SolanaExactError::NoInstructionAtIndex(instruction_index))?;
    let account = instruction.program_id(transaction.message.static_account_keys());
    let compute_budget = solana_compute_budget_interface::ID;
    let data = instruction.data.as_slice();
    if compute_budget.ne(account) || data.first().cloned().unwrap_or(0) != 3 || data.len() != 9 {
        return Err(SolanaExactError::InvalidComputePriceInstruction);
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[1..]);
    let microlamports = u64::from_le_bytes(buf);
    if microlamports > max_compute_unit_price {
        return Err(SolanaExactError::MaxComputeUnitPriceExceeded);
    }
    Ok(())
}

/// Validates the instruction structure of the transaction.
///
/// Required structure:
/// - Index 0: `SetComputeUnitLimit`
/// - Index 1: `SetComputeUnitPrice`
/// - Index 2: `TransferChecked` (Token or Token-2022)
/// - Index 3+: additional instructions, only if `allow_additional_instructions` is set.
///
/// `CreateATA` is not supported — the destination ATA must already exist.
pub fn validate_instructions(
    transaction: &VersionedTransaction,
    config: &SolanaExactFacilitatorConfig,
) -> Result<(), SolanaExactError> {
    let instructions = transaction.message.instructions();

    if instructions.len() < 3 {
        return Err(SolanaExactError::TooFewInstructions);
    }
    if instructions.len() > config.max_instruction_count {
        return Err(SolanaExactError::InstructionCountExceedsMax(
            config.max_instruction_count,
        ));
    }

    let ix2_program = get_program_id(transaction, 2);
    if ix2_program == Some(ATA_PROGRAM_PUBKEY) {
        return Err(SolanaExactError::CreateATANotSupported);
    }

    if instructions.len() > 3 {
        if !config.allow_additional_instructions {
            return Err(SolanaExactError::AdditionalInstructionsNotAllowed);
        }
        for i in 3..instructions.len() {
            if let Some(program_id) = get_program_id(transaction, i) {
                if config.is_blocked(&program_id) {
                    return Err(SolanaExactError::BlockedProgram(program_id));
                }
                if !config.is_allowed(&program_id) {
                    return Err(SolanaExactError::ProgramNotAllowed(program_id));
                }
            }
        }
    }

    Ok(())
}

fn get_program_id(transaction: &VersionedTransaction, index: usize) -> Option<Pubkey> {
    let instruction = transaction.message.instructions().get(index)?;
    let account_keys = transaction.message.static_account_keys();
    Some(*instruction.program_id(account_keys))
}

pub async fn verify_transfer<P: SolanaChainProviderLike + ChainProviderOps>(
    provider: &P,
    request: &proto::VerifyRequest,
    config: &SolanaExactFacilitatorConfig,
) -> Result<VerifyTransferResult, PaymentVerificationError> {
    let chain_id = provider.chain_id();
    let payload_chain_id = request.payment_payload.network.clone();
    if payload_chain_id != chain_id {
        return Err(PaymentVerificationError::NetworkMismatch {
            expected: chain_id.clone(),
            actual: payload_chain_id,
        });
    }
    let requirements_chain_id = request.payment_requirements.network.clone();
    if requirements_chain_id != chain_id {
        return Err(PaymentVerificationError::NetworkMismatch {
            expected: chain_id,
            actual: requirements_chain_id,
        });
    }

    let payload: ExactSolanaPayload =
        serde_json::from_value(request.payment_payload.payload.clone())
            .map_err(|e| SolanaExactError::MalformedPayload(e.to_string()))?;
    let requirements = &request.payment_requirements;
    let asset: Address = requirements
        .asset
        .parse()
        .map_err(|_| SolanaExactError::MalformedPayload(format!("invalid asset {}", requirements.asset)))?;
    let pay_to: Address = requirements
        .pay_to
        .parse()
        .map_err(|_| SolanaExactError::MalformedPayload(format!("invalid pay_to {}", requirements.pay_to)))?;
    let amount = u64::try_from(requirements.max_amount_required)
        .map_err(|_| SolanaExactError::MalformedPayload("amount does not fit in u64".to_string()))?;
    let transfer_requirement = TransferRequirement {
        pay_to: &pay_to,
        asset: &asset,
        amount,
    };
    verify_transaction(provider, payload.transaction, &transfer_requirement, config).await
}

pub async fn verify_transaction<P: SolanaChainProviderLike>(
    provider: &P,
    transaction_b64_string: String,
    transfer_requirement: &TransferRequirement<'_>,
    config: &SolanaExactFacilitatorConfig,
) -> Result<VerifyTransferResult, PaymentVerificationError> {
    let bytes = Base64Bytes::from(transaction_b64_string.as_bytes())
        .decode()
        .map_err(|e| SolanaExactError::MalformedPayload(e.to_string()))?;
    let transaction = bincode::deserialize::<VersionedTransaction>(bytes.as_slice())
        .map_err(|e| SolanaExactError::MalformedPayload(e.to_string()))?;

    let compute_units = verify_compute_limit_instruction(&transaction, 0)?;
    if compute_units > provider.max_compute_unit_limit() {
        return Err(SolanaExactError::MaxComputeUnitLimitExceeded.into());
    }
    #[cfg(feature = "telemetry")]
    tracing::debug!(compute_units = compute_units, "Verified compute unit limit");
    verify_compute_price_instruction(provider.max_compute_unit_price(), &transaction, 1)?;

    validate_instructions(&transaction, config)?;

    let transfer_instruction =
        verify_transfer_instruction(provider, &transaction, 2, transfer_requirement).await?;

    if config.require_fee_payer_not_in_instructions {
        let fee_payer_pubkey = provider.pubkey();
        for instruction in transaction.message.instructions().iter() {
            for account_idx in instruction.accounts.iter() {
                let account = transaction
                    .message
                    .static_account_keys()
                    .get(*account_idx as usize)
                    .ok_or(SolanaExactError::NoAccountAtIndex(*account_idx))?;
                if *account == fee_payer_pubkey {
                    return Err(SolanaExactError::FeePayerIncludedInInstructionAccounts.into());
                }
            }
        }
    }

    let tx = TransactionInt::new(transaction.clone()).sign(provider)?;
    let cfg = RpcSimulateTransactionConfig {
        sig_verify: false,
        replace_recent_blockhash: false,
        commitment: Some(CommitmentConfig::confirmed()),
        encoding: None,
        accounts: None,
        inner_instructions: false,
        min_context_slot: None,
    };
    provider
        .simulate_transaction_with_config(tx.inner(), cfg)
        .await?;
    let payer: Address = transfer_instruction.authority.into();
    Ok(VerifyTransferResult { payer, transaction })
}

pub async fn verify_transfer_instruction<P: SolanaChainProviderLike>(
    provider: &P,
    transaction: &VersionedTransaction,
    instruction_index: usize,
    transfer_requirement: &TransferRequirement<'_>,
) -> Result<TransferCheckedInstruction, PaymentVerificationError> {
    let tx = TransactionInt::new(transaction.clone());
    let instruction = tx.instruction(instruction_index)?;
    instruction.assert_not_empty()?;
    let program_id = instruction.program_id();
    let transfer_checked_instruction = if spl_token::ID.eq(&program_id) {
        let token_instruction =
            spl_token::instruction::TokenInstruction::unpack(instruction.data_slice())
                .map_err(|_| SolanaExactError::InvalidTokenInstruction)?;
        let amount = match token_instruction {
            spl_token::instruction::TokenInstruction::TransferChecked { amount, decimals: _ } => amount,
            _ => return Err(SolanaExactError::InvalidTokenInstruction.into()),
        };
        TransferCheckedInstruction {
            amount,
            source: instruction.account(0)?,
            mint: instruction.account(1)?,
            destination: instruction.account(2)?,
            authority: instruction.account(3)?,
            token_program: spl_token::ID,
        }
    } else if spl_token_2022::ID.eq(&program_id) {
        let token_instruction =
            spl_token_2022::instruction::TokenInstruction::unpack(instruction.data_slice())
                .map_err(|_| SolanaExactError::InvalidTokenInstruction)?;
        let amount = match token_instruction {
            spl_token_2022::instruction::TokenInstruction::TransferChecked { amount, decimals: _ } => amount,
            _ => return Err(SolanaExactError::InvalidTokenInstruction.into()),
        };
        TransferCheckedInstruction {
            amount,
            source: instruction.account(0)?,
            mint: instruction.account(1)?,
            destination: instruction.account(2)?,
            authority: instruction.account(3)?,
            token_program: spl_token_2022::ID,
        }
    } else {
        return Err(SolanaExactError::InvalidTokenInstruction.into());
    };

    let fee_payer_pubkey = provider.pubkey();
    if transfer_checked_instruction.authority == fee_payer_pubkey {
        return Err(SolanaExactError::FeePayerTransferringFunds.into());
    }

    if Address::new(transfer_checked_instruction.mint) != *transfer_requirement.asset {
        return Err(PaymentVerificationError::AssetMismatch {
            expected: transfer_requirement.asset.to_string(),
            actual: Address::new(transfer_checked_instruction.mint).to_string(),
        });
    }

    let token_program = transfer_checked_instruction.token_program;
    let (ata, _) = Pubkey::find_program_address(
        &[
            transfer_requirement.pay_to.as_ref(),
            token_program.as_ref(),
            transfer_requirement.asset.as_ref(),
        ],
        &ATA_PROGRAM_PUBKEY,
    );
    if transfer_checked_instruction.destination != ata {
        return Err(PaymentVerificationError::RecipientMismatch {
            expected: Address::new(ata).to_string(),
            actual: Address::new(transfer_checked_instruction.destination).to_string(),
        });
    }
    let accounts = provider
        .get_multiple_accounts(&[transfer_checked_instruction.source, ata])
        .await?;
    let is_sender_missing = accounts.first().cloned().is_none_or(|a| a.is_none());
    if is_sender_missing {
        return Err(SolanaExactError::MissingSenderAccount.into());
    }
    let is_receiver_missing = accounts.get(1).cloned().is_none_or(|a| a.is_none());
    if is_receiver_missing {
        return Err(PaymentVerificationError::RecipientMismatch {
            expected: Address::new(ata).to_string(),
            actual: "missing account".to_string(),
        });
    }
    let instruction_amount = transfer_checked_instruction.amount;
    if instruction_amount != transfer_requirement.amount {
        return Err(PaymentVerificationError::InsufficientValue {
            authorized: instruction_amount as u128,
            required: transfer_requirement.amount as u128,
        });
    }
    Ok(transfer_checked_instruction)
}

pub async fn settle_transaction<P: SolanaChainProviderLike>(
    provider: &P,
    verification: VerifyTransferResult,
) -> Result<Signature, SolanaChainProviderError> {
    let tx = TransactionInt::new(verification.transaction).sign(provider)?;
    if !tx.is_fully_signed() {
        #[cfg(feature = "telemetry")]
        tracing::event!(Level::WARN, status = "failed", "undersigned transaction");
        return Err(SolanaChainProviderError::InvalidTransaction(
            UiTransactionError::from(TransactionError::SignatureFailure),
        ));
    }
    let tx_sig = tx
        .send_and_confirm(provider, CommitmentConfig::confirmed())
        .await?;
    Ok(tx_sig)
}

/// Configuration for the Solana "exact" facilitator.
///
/// Controls transaction verification behavior, including support for
/// additional instructions from third-party wallets like Phantom.
///
/// By default, the Phantom Lighthouse program is allowed, so Phantom wallet
/// users on mainnet aren't rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolanaExactFacilitatorConfig {
    #[serde(default = "default_allow_additional_instructions")]
    pub allow_additional_instructions: bool,
    #[serde(default = "default_max_instruction_count")]
    pub max_instruction_count: usize,
    /// SECURITY: if this list is empty and `allow_additional_instructions` is
    /// true, all additional instructions are rejected — programs must be
    /// explicitly whitelisted.
    #[serde(default = "default_allowed_program_ids")]
    pub allowed_program_ids: Vec<Address>,
    #[serde(default)]
    pub blocked_program_ids: Vec<Address>,
    #[serde(default = "default_require_fee_payer_not_in_instructions")]
    pub require_fee_payer_not_in_instructions: bool,
}

fn default_allow_additional_instructions() -> bool {
    true
}

fn default_max_instruction_count() -> usize {
    10
}

fn default_allowed_program_ids() -> Vec<Address> {
    vec![Address::new(PHANTOM_LIGHTHOUSE_PROGRAM)]
}

fn default_require_fee_payer_not_in_instructions() -> bool {
    true
}

impl Default for SolanaExactFacilitatorConfig {
    fn default() -> Self {
        Self {
            allow_additional_instructions: default_allow_additional_instructions(),
            max_instruction_count: default_max_instruction_count(),
            allowed_program_ids: default_allowed_program_ids(),
            blocked_program_ids: Vec::new(),
            require_fee_payer_not_in_instructions: default_require_fee_payer_not_in_instructions(),
        }
    }
}

impl SolanaExactFacilitatorConfig {
    pub fn is_blocked(&self, program_id: &Pubkey) -> bool {
        self.blocked_program_ids
            .iter()
            .any(|addr| addr.pubkey() == program_id)
    }

    pub fn is_allowed(&self, program_id: &Pubkey) -> bool {
        self.allowed_program_ids
            .iter()
            .any(|addr| addr.pubkey() == program_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_compute_budget_interface::ComputeBudgetInstruction;
    use solana_message::Hash;
    use solana_message::VersionedMessage;
    use solana_message::v0::Message as MessageV0;

    fn build_test_transaction(compute_units: u32, compute_price: u64) -> VersionedTransaction {
        let fee_payer = Pubkey::new_unique();
        let source = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let destination = Pubkey::new_unique();
        let authority = Pubkey::new_unique();

        let cu_limit_ix = ComputeBudgetInstruction::set_compute_unit_limit(compute_units);
        let cu_price_ix = ComputeBudgetInstruction::set_compute_unit_price(compute_price);
        let transfer_ix = spl_token::instruction::transfer_checked(
            &spl_token::ID,
            &source,
            &mint,
            &destination,
            &authority,
            &[],
            1_000_000,
            6,
        )
        .unwrap();

        let message = MessageV0::try_compile(
            &fee_payer,
            &[cu_limit_ix, cu_price_ix, transfer_ix],
            &[],
            Hash::default(),
        )
        .unwrap();
        let num_required = message.header.num_required_signatures as usize;
        VersionedTransaction {
            signatures: vec![Signature::default(); num_required],
            message: VersionedMessage::V0(message),
        }
    }

    #[test]
    fn verify_compute_limit_instruction_reads_back_units() {
        let tx = build_test_transaction(200_000, 1_000);
        let units = verify_compute_limit_instruction(&tx, 0).unwrap();
        assert_eq!(units, 200_000);
    }

    #[test]
    fn verify_compute_price_instruction_rejects_over_max() {
        let tx = build_test_transaction(200_000, 5_000);
        let err = verify_compute_price_instruction(1_000, &tx, 1).unwrap_err();
        assert!(matches!(err, SolanaExactError::MaxComputeUnitPriceExceeded));
    }

    #[test]
    fn verify_compute_price_instruction_allows_under_max() {
        let tx = build_test_transaction(200_000, 500);
        verify_compute_price_instruction(1_000, &tx, 1).unwrap();
    }

    #[test]
    fn validate_instructions_accepts_minimal_transfer() {
        let tx = build_test_transaction(200_000, 500);
        let config = SolanaExactFacilitatorConfig::default();
        validate_instructions(&tx, &config).unwrap();
    }

    #[test]
    fn config_default_allows_phantom_lighthouse() {
        let config = SolanaExactFacilitatorConfig::default();
        assert!(config.is_allowed(&PHANTOM_LIGHTHOUSE_PROGRAM));
        assert!(!config.is_blocked(&PHANTOM_LIGHTHOUSE_PROGRAM));
    }

    #[test]
    fn config_blocked_program_overrides_allowed() {
        let program = Pubkey::new_unique();
        let mut config = SolanaExactFacilitatorConfig::default();
        config.blocked_program_ids.push(Address::new(program));
        config.allowed_program_ids.push(Address::new(program));
        assert!(config.is_blocked(&program));
    }
}

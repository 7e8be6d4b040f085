//! Isolates the `xrpl` crate's binary codec and key derivation behind a
//! small set of free functions, so the rest of this scheme deals only in
//! plain Rust types ([`DecodedPayment`]) rather than the ledger's STObject
//! binary format directly.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use xrpl::core::binarycodec::{decode, encode, encode_for_signing};
use xrpl::core::keypairs::{derive_classic_address, sign as keypair_sign, validate as keypair_validate};

use crate::exact::types::{DecodedPayment, XrpExactError};

/// Decodes a hex-encoded signed `Payment` transaction blob into the fields
/// the facilitator's verification logic needs.
pub fn decode_signed_payment(tx_blob: &str) -> Result<DecodedPayment, XrpExactError> {
    let decoded: BTreeMap<String, Value> =
        decode(tx_blob, None).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))?;

    let get_str = |key: &str| -> Option<String> {
        decoded.get(key).and_then(Value::as_str).map(str::to_string)
    };
    let get_u64 = |key: &str| -> Option<u64> {
        decoded
            .get(key)
            .and_then(|v| v.as_str().and_then(|s| s.parse().ok()).or_else(|| v.as_u64()))
    };

    let transaction_type = get_str("TransactionType").unwrap_or_default();
    if transaction_type != "Payment" {
        return Err(XrpExactError::WrongTransactionType(transaction_type));
    }

    let account =
        get_str("Account").ok_or_else(|| XrpExactError::UndecodableTransaction("missing Account".into()))?;
    let destination = get_str("Destination")
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing Destination".into()))?;
    let destination_tag = decoded.get("DestinationTag").and_then(Value::as_u64).map(|v| v as u32);
    let amount_drops = get_u64("Amount")
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing or non-native Amount".into()))?;
    let fee_drops =
        get_u64("Fee").ok_or_else(|| XrpExactError::UndecodableTransaction("missing Fee".into()))?;
    let sequence = decoded
        .get("Sequence")
        .and_then(Value::as_u64)
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing Sequence".into()))? as u32;
    let last_ledger_sequence = decoded
        .get("LastLedgerSequence")
        .and_then(Value::as_u64)
        .map(|v| v as u32);
    let signing_pub_key = get_str("SigningPubKey")
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing SigningPubKey".into()))?;
    let txn_signature = get_str("TxnSignature")
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing TxnSignature".into()))?;

    Ok(DecodedPayment {
        account,
        destination,
        destination_tag,
        amount_drops,
        fee_drops,
        sequence,
        last_ledger_sequence,
        signing_pub_key,
        txn_signature,
    })
}

/// Verifies the `TxnSignature` over the transaction's signing data against
/// its own `SigningPubKey`. Does not check that the signer is authorized to
/// act on the `Account` beyond this — regular-key/multisign accounts are out
/// of scope.
pub fn verify_signature(tx_blob: &str) -> Result<(), XrpExactError> {
    let decoded: BTreeMap<String, Value> =
        decode(tx_blob, None).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))?;
    let signing_pub_key = decoded
        .get("SigningPubKey")
        .and_then(Value::as_str)
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing SigningPubKey".into()))?;
    let txn_signature = decoded
        .get("TxnSignature")
        .and_then(Value::as_str)
        .ok_or_else(|| XrpExactError::UndecodableTransaction("missing TxnSignature".into()))?;

    let mut unsigned = decoded.clone();
    unsigned.remove("TxnSignature");
    let signing_data =
        encode_for_signing(&Value::Object(unsigned.into_iter().collect())).map_err(|_| XrpExactError::InvalidSignature)?;

    keypair_validate(&signing_data, signing_pub_key, txn_signature)
        .map_err(|_| XrpExactError::InvalidSignature)
}

/// Derives the classic `r...` account address from a hex-encoded public key,
/// used to double-check `Account` matches `SigningPubKey` for a standard
/// (non regular-key) signature.
pub fn classic_address_from_public_key(public_key_hex: &str) -> Result<String, XrpExactError> {
    derive_classic_address(public_key_hex).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))
}

/// Builds and signs a native-currency `Payment` transaction, returning the
/// hex-encoded blob ready for `submit`.
#[cfg(feature = "client")]
#[allow(clippy::too_many_arguments)]
pub fn build_signed_payment(
    seed: &str,
    account: &str,
    destination: &str,
    destination_tag: Option<u32>,
    amount_drops: u64,
    fee_drops: u64,
    sequence: u32,
    last_ledger_sequence: u32,
    source_tag: Option<u32>,
) -> Result<String, XrpExactError> {
    use xrpl::core::keypairs::derive_keypair;

    let (public_key, private_key) =
        derive_keypair(seed, false).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))?;

    let mut tx = json!({
        "TransactionType": "Payment",
        "Account": account,
        "Destination": destination,
        "Amount": amount_drops.to_string(),
        "Fee": fee_drops.to_string(),
        "Sequence": sequence,
        "LastLedgerSequence": last_ledger_sequence,
        "SigningPubKey": public_key,
    });
    if let Some(tag) = destination_tag {
        tx["DestinationTag"] = json!(tag);
    }
    if let Some(tag) = source_tag {
        tx["SourceTag"] = json!(tag);
    }

    let signing_data = encode_for_signing(&tx).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))?;
    let signature =
        keypair_sign(&signing_data, &private_key).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))?;
    tx["TxnSignature"] = json!(signature);

    encode(&tx).map_err(|e| XrpExactError::UndecodableTransaction(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_payment_transaction_type() {
        let mut decoded = BTreeMap::new();
        decoded.insert("TransactionType".to_string(), json!("TrustSet"));
        let transaction_type = decoded
            .get("TransactionType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        assert_ne!(transaction_type, "Payment");
    }
}

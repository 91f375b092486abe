/*
[INPUT]:  Actions, nonces, vault addresses, and a wallet
[OUTPUT]: Split ECDSA signatures ready for the signed payload
[POS]:    Signing layer - module wiring and top-level signing flows
[UPDATE]: When signing flows or the action hash contract change
*/

pub mod eip712;
pub mod float;
pub mod hash;
pub mod wallet;

use alloy_primitives::Address;
use serde::Serialize;

pub use eip712::{
    enrich_multi_sig_types, enrich_multi_sig_values, hyperliquid_chain, signature_chain_id,
    Eip712Value, SignTypes, AGENT_SIGN_TYPES, APPROVE_AGENT_SIGN_TYPES,
    APPROVE_BUILDER_FEE_SIGN_TYPES, CONVERT_TO_MULTI_SIG_USER_SIGN_TYPES,
    MULTI_SIG_ENVELOPE_SIGN_TYPES, SPOT_TRANSFER_SIGN_TYPES, USD_CLASS_TRANSFER_SIGN_TYPES,
    USD_SEND_SIGN_TYPES, WITHDRAW_SIGN_TYPES,
};
pub use float::{float_to_int_for_hashing, float_to_usd_int, float_to_wire};
pub use hash::action_hash;
pub use wallet::{LocalWallet, SignatureTriple, WalletSigner};

use crate::errors::Result;

/// Current wall-clock time in epoch milliseconds; the per-wallet nonce.
pub fn timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis() as u64
}

/// Sign an agent-signed (L1) action: canonical bytes + nonce + optional
/// vault address are hashed, and the digest is signed as the phantom
/// agent's `connectionId`.
pub async fn sign_l1_action<T: Serialize>(
    wallet: &dyn WalletSigner,
    action: &T,
    vault_address: Option<Address>,
    nonce: u64,
    is_mainnet: bool,
) -> Result<SignatureTriple> {
    let connection_id = action_hash(action, vault_address, nonce)?;
    let digest = eip712::l1_signing_digest(connection_id, is_mainnet)?;
    wallet.sign_digest(digest).await
}

/// Sign a user-signed action: the message fields themselves form the
/// typed-data payload under the network-specific domain.
pub async fn sign_user_signed_action(
    wallet: &dyn WalletSigner,
    primary_type: &str,
    fields: &[(&str, &str)],
    values: &[Eip712Value<'_>],
    is_mainnet: bool,
) -> Result<SignatureTriple> {
    let digest = eip712::user_signing_digest(primary_type, fields, values, is_mainnet)?;
    wallet.sign_digest(digest).await
}

/// Sign the outer multi-sig envelope. The inner action is hashed with its
/// `type` discriminant stripped (`action` here must be the tagless view);
/// the resulting `multiSigActionHash` plus the nonce form the user-signed
/// message.
pub async fn sign_multi_sig_envelope<T: Serialize>(
    wallet: &dyn WalletSigner,
    tagless_action: &T,
    vault_address: Option<Address>,
    nonce: u64,
    is_mainnet: bool,
) -> Result<SignatureTriple> {
    let multi_sig_action_hash = action_hash(tagless_action, vault_address, nonce)?;
    let values = [
        Eip712Value::String(hyperliquid_chain(is_mainnet)),
        Eip712Value::Bytes32(multi_sig_action_hash),
        Eip712Value::Uint64(nonce),
    ];
    sign_user_signed_action(
        wallet,
        "HyperliquidTransaction:SendMultiSig",
        MULTI_SIG_ENVELOPE_SIGN_TYPES,
        &values,
        is_mainnet,
    )
    .await
}

/// Sign a user-signed action on behalf of a multi-sig user: the type list
/// and values are enriched with `payloadMultiSigUser` and `outerSigner`
/// directly after the chain tag.
pub async fn sign_multi_sig_inner(
    wallet: &dyn WalletSigner,
    primary_type: &str,
    fields: SignTypes,
    values: &[Eip712Value<'_>],
    payload_multi_sig_user: Address,
    outer_signer: Address,
    is_mainnet: bool,
) -> Result<SignatureTriple> {
    let enriched_fields = enrich_multi_sig_types(fields);
    let enriched_values =
        enrich_multi_sig_values(fields, values, payload_multi_sig_user, outer_signer);
    let digest = eip712::user_signing_digest(
        primary_type,
        &enriched_fields,
        &enriched_values,
        is_mainnet,
    )?;
    wallet.sign_digest(digest).await
}

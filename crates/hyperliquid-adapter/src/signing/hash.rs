/*
[INPUT]:  An action value, an optional vault address, and a nonce
[OUTPUT]: 32-byte keccak digest binding all three together
[POS]:    Signing layer - canonical encoder and action hasher
[UPDATE]: When the canonical byte layout changes
*/

use alloy_primitives::{keccak256, Address, B256};
use serde::Serialize;

use crate::errors::Result;

/// Hash an action together with its nonce and optional vault address.
///
/// Canonical bytes come from named MessagePack encoding: struct fields
/// serialize in declaration order, so semantically identical actions always
/// produce byte-identical output. The digest layout is
/// `msgpack(action) || nonce_be_u64 || flag || [vault_20_bytes]` where the
/// flag byte is 0 when no vault address is present and 1 otherwise.
/// A signature over this digest therefore cannot be replayed under a
/// different nonce or vault.
pub fn action_hash<T: Serialize>(
    action: &T,
    vault_address: Option<Address>,
    nonce: u64,
) -> Result<B256> {
    let mut data = rmp_serde::to_vec_named(action)?;
    data.extend_from_slice(&nonce.to_be_bytes());
    match vault_address {
        None => data.push(0),
        Some(address) => {
            data.push(1);
            data.extend_from_slice(address.as_slice());
        }
    }
    Ok(keccak256(&data))
}

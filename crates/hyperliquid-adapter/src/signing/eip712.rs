/*
[INPUT]:  Action digests and user-signed message fields
[OUTPUT]: EIP-712 signing digests under the fixed protocol domains
[POS]:    Signing layer - typed-data envelope construction
[UPDATE]: When sign-type tables or signing domains change
*/

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::errors::{HyperliquidError, Result};

/// Human-readable chain tags carried inside user-signed actions
pub const HYPERLIQUID_CHAIN_MAINNET: &str = "Mainnet";
pub const HYPERLIQUID_CHAIN_TESTNET: &str = "Testnet";

/// `signatureChainId` values declared inside user-signed actions; these must
/// match the chain id used in the signing domain below.
pub const SIGNATURE_CHAIN_ID_MAINNET: &str = "0xa4b1";
pub const SIGNATURE_CHAIN_ID_TESTNET: &str = "0x66eee";

/// Agent-signed (L1) domain. These constants are a protocol-level
/// convention, not a deployed contract; they never vary with the target
/// network.
const L1_DOMAIN_NAME: &str = "Exchange";
const L1_CHAIN_ID: u64 = 1337;

const USER_DOMAIN_NAME: &str = "HyperliquidSignTransaction";
const USER_CHAIN_ID_MAINNET: u64 = 42161;
const USER_CHAIN_ID_TESTNET: u64 = 421614;

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// EIP-712 field descriptor: (name, solidity type)
pub type SignTypes = &'static [(&'static str, &'static str)];

pub const AGENT_SIGN_TYPES: SignTypes = &[("source", "string"), ("connectionId", "bytes32")];

pub const USD_SEND_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

pub const SPOT_TRANSFER_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("token", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

pub const WITHDRAW_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("destination", "string"),
    ("amount", "string"),
    ("time", "uint64"),
];

pub const USD_CLASS_TRANSFER_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("amount", "string"),
    ("toPerp", "bool"),
    ("nonce", "uint64"),
];

pub const APPROVE_AGENT_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("agentAddress", "address"),
    ("agentName", "string"),
    ("nonce", "uint64"),
];

pub const APPROVE_BUILDER_FEE_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("maxFeeRate", "string"),
    ("builder", "address"),
    ("nonce", "uint64"),
];

pub const CONVERT_TO_MULTI_SIG_USER_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("signers", "string"),
    ("nonce", "uint64"),
];

pub const MULTI_SIG_ENVELOPE_SIGN_TYPES: SignTypes = &[
    ("hyperliquidChain", "string"),
    ("multiSigActionHash", "bytes32"),
    ("nonce", "uint64"),
];

/// A single EIP-712 message value, paired positionally with a sign-type
/// field descriptor.
#[derive(Debug, Clone)]
pub enum Eip712Value<'a> {
    String(&'a str),
    Uint64(u64),
    Address(Address),
    Bytes32(B256),
    Bool(bool),
}

impl Eip712Value<'_> {
    fn encode_word(&self) -> B256 {
        match self {
            Eip712Value::String(s) => keccak256(s.as_bytes()),
            Eip712Value::Uint64(n) => B256::from(U256::from(*n).to_be_bytes::<32>()),
            Eip712Value::Address(a) => a.into_word(),
            Eip712Value::Bytes32(b) => *b,
            Eip712Value::Bool(b) => B256::from(U256::from(u64::from(*b)).to_be_bytes::<32>()),
        }
    }
}

/// Enrich a user-signed type list for multi-sig inner signing: the two
/// address fields go immediately after `hyperliquidChain`. The insertion
/// point is part of the verifier's type string and must not move.
pub fn enrich_multi_sig_types(
    fields: SignTypes,
) -> Vec<(&'static str, &'static str)> {
    let mut enriched = Vec::with_capacity(fields.len() + 2);
    for field in fields {
        enriched.push(*field);
        if field.0 == "hyperliquidChain" {
            enriched.push(("payloadMultiSigUser", "address"));
            enriched.push(("outerSigner", "address"));
        }
    }
    enriched
}

/// Insert the multi-sig address values at the positions matching
/// [`enrich_multi_sig_types`].
pub fn enrich_multi_sig_values<'a>(
    fields: SignTypes,
    values: &[Eip712Value<'a>],
    payload_multi_sig_user: Address,
    outer_signer: Address,
) -> Vec<Eip712Value<'a>> {
    let mut enriched = Vec::with_capacity(values.len() + 2);
    for (field, value) in fields.iter().zip(values.iter()) {
        enriched.push(value.clone());
        if field.0 == "hyperliquidChain" {
            enriched.push(Eip712Value::Address(payload_multi_sig_user));
            enriched.push(Eip712Value::Address(outer_signer));
        }
    }
    enriched
}

fn type_descriptor(primary_type: &str, fields: &[(&str, &str)]) -> String {
    let mut descriptor = String::with_capacity(primary_type.len() + fields.len() * 24);
    descriptor.push_str(primary_type);
    descriptor.push('(');
    for (i, (name, ty)) in fields.iter().enumerate() {
        if i > 0 {
            descriptor.push(',');
        }
        descriptor.push_str(ty);
        descriptor.push(' ');
        descriptor.push_str(name);
    }
    descriptor.push(')');
    descriptor
}

fn struct_hash(
    primary_type: &str,
    fields: &[(&str, &str)],
    values: &[Eip712Value<'_>],
) -> Result<B256> {
    if fields.len() != values.len() {
        return Err(HyperliquidError::Signing(format!(
            "{primary_type}: {} sign types but {} values",
            fields.len(),
            values.len()
        )));
    }
    let mut encoded = Vec::with_capacity(32 * (values.len() + 1));
    encoded.extend_from_slice(keccak256(type_descriptor(primary_type, fields)).as_slice());
    for value in values {
        encoded.extend_from_slice(value.encode_word().as_slice());
    }
    Ok(keccak256(&encoded))
}

fn domain_separator(name: &str, chain_id: u64) -> B256 {
    let mut encoded = Vec::with_capacity(32 * 5);
    encoded.extend_from_slice(keccak256(DOMAIN_TYPE).as_slice());
    encoded.extend_from_slice(keccak256(name.as_bytes()).as_slice());
    encoded.extend_from_slice(keccak256(b"1").as_slice());
    encoded.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    encoded.extend_from_slice(Address::ZERO.into_word().as_slice());
    keccak256(&encoded)
}

fn signing_digest(domain: B256, struct_hash: B256) -> B256 {
    let mut data = Vec::with_capacity(2 + 64);
    data.extend_from_slice(&[0x19, 0x01]);
    data.extend_from_slice(domain.as_slice());
    data.extend_from_slice(struct_hash.as_slice());
    keccak256(&data)
}

/// Digest for an agent-signed (L1) action: the action digest becomes the
/// `connectionId` of a phantom agent whose `source` tag selects the network.
pub fn l1_signing_digest(connection_id: B256, is_mainnet: bool) -> Result<B256> {
    let source = if is_mainnet { "a" } else { "b" };
    let hash = struct_hash(
        "Agent",
        AGENT_SIGN_TYPES,
        &[
            Eip712Value::String(source),
            Eip712Value::Bytes32(connection_id),
        ],
    )?;
    Ok(signing_digest(
        domain_separator(L1_DOMAIN_NAME, L1_CHAIN_ID),
        hash,
    ))
}

/// Digest for a user-signed action under the network-specific domain.
pub fn user_signing_digest(
    primary_type: &str,
    fields: &[(&str, &str)],
    values: &[Eip712Value<'_>],
    is_mainnet: bool,
) -> Result<B256> {
    let chain_id = if is_mainnet {
        USER_CHAIN_ID_MAINNET
    } else {
        USER_CHAIN_ID_TESTNET
    };
    let hash = struct_hash(primary_type, fields, values)?;
    Ok(signing_digest(
        domain_separator(USER_DOMAIN_NAME, chain_id),
        hash,
    ))
}

/// Chain tag for the `hyperliquidChain` field of user-signed actions
pub fn hyperliquid_chain(is_mainnet: bool) -> &'static str {
    if is_mainnet {
        HYPERLIQUID_CHAIN_MAINNET
    } else {
        HYPERLIQUID_CHAIN_TESTNET
    }
}

/// Chain id for the `signatureChainId` field of user-signed actions
pub fn signature_chain_id(is_mainnet: bool) -> &'static str {
    if is_mainnet {
        SIGNATURE_CHAIN_ID_MAINNET
    } else {
        SIGNATURE_CHAIN_ID_TESTNET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_descriptor_format() {
        assert_eq!(
            type_descriptor("Agent", AGENT_SIGN_TYPES),
            "Agent(string source,bytes32 connectionId)"
        );
        assert_eq!(
            type_descriptor("HyperliquidTransaction:UsdSend", USD_SEND_SIGN_TYPES),
            "HyperliquidTransaction:UsdSend(string hyperliquidChain,string destination,string amount,uint64 time)"
        );
    }

    #[test]
    fn test_multi_sig_enrichment_insertion_point() {
        let enriched = enrich_multi_sig_types(USD_SEND_SIGN_TYPES);
        let names: Vec<&str> = enriched.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec![
                "hyperliquidChain",
                "payloadMultiSigUser",
                "outerSigner",
                "destination",
                "amount",
                "time"
            ]
        );
    }

    #[test]
    fn test_multi_sig_value_enrichment_aligns() {
        let user: Address = "0x0d1d9635d0640821d15e323ac8adade65510af6f".parse().unwrap();
        let outer: Address = "0x1719884eb866cb12b2287399b15f7db5e7d775ea".parse().unwrap();
        let values = [
            Eip712Value::String("Mainnet"),
            Eip712Value::String("0x0000000000000000000000000000000000000000"),
            Eip712Value::String("1"),
            Eip712Value::Uint64(1),
        ];
        let enriched = enrich_multi_sig_values(USD_SEND_SIGN_TYPES, &values, user, outer);
        assert_eq!(enriched.len(), 6);
        assert!(matches!(enriched[1], Eip712Value::Address(a) if a == user));
        assert!(matches!(enriched[2], Eip712Value::Address(a) if a == outer));
    }

    #[test]
    fn test_l1_digest_varies_with_network() {
        let connection_id = B256::repeat_byte(7);
        let mainnet = l1_signing_digest(connection_id, true).unwrap();
        let testnet = l1_signing_digest(connection_id, false).unwrap();
        assert_ne!(mainnet, testnet);
    }

    #[test]
    fn test_l1_digest_deterministic() {
        let connection_id = B256::repeat_byte(9);
        assert_eq!(
            l1_signing_digest(connection_id, true).unwrap(),
            l1_signing_digest(connection_id, true).unwrap()
        );
    }

    #[test]
    fn test_struct_hash_arity_mismatch_is_error() {
        let err = struct_hash("Agent", AGENT_SIGN_TYPES, &[Eip712Value::String("a")]);
        assert!(err.is_err());
    }
}

/*
[INPUT]:  EVM private key (hex string) and 32-byte signing digests
[OUTPUT]: Split ECDSA signatures {r, s, v} and the wallet address
[POS]:    Signing layer - wallet seam over the ECDSA provider
[UPDATE]: When the signing provider or signature format changes
*/

use std::str::FromStr;

use alloy_primitives::{Address, B256};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{HyperliquidError, Result};

/// ECDSA signature split into its three standard components. Downstream
/// payloads need the triple shape, so it is never concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureTriple {
    pub r: String,
    pub s: String,
    pub v: u64,
}

/// Seam over the ECDSA provider. Hardware wallets and remote signers plug
/// in here; signing suspends without blocking unrelated work.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;

    async fn sign_digest(&self, digest: B256) -> Result<SignatureTriple>;
}

/// In-process wallet backed by a local secp256k1 key
#[derive(Debug, Clone)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    address: Address,
}

impl LocalWallet {
    /// Create a wallet from a hex-encoded private key.
    ///
    /// Supports both "0x"-prefixed and non-prefixed hex strings.
    pub fn new(private_key_hex: &str) -> Result<Self> {
        let private_key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer = PrivateKeySigner::from_str(private_key_hex)
            .map_err(|e| HyperliquidError::Signing(format!("invalid private key: {e}")))?;
        let address = signer.address();
        Ok(Self { signer, address })
    }

    /// Generate a wallet with a fresh random key (agent approval flow).
    pub fn random() -> Self {
        let signer = PrivateKeySigner::random();
        let address = signer.address();
        Self { signer, address }
    }

    /// Hex-encoded private key, "0x"-prefixed. Needed when handing a fresh
    /// agent key back to the caller.
    pub fn to_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signer.to_bytes()))
    }
}

#[async_trait]
impl WalletSigner for LocalWallet {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_digest(&self, digest: B256) -> Result<SignatureTriple> {
        let signature = Signer::sign_hash(&self.signer, &digest)
            .await
            .map_err(|e| HyperliquidError::Signing(format!("failed to sign digest: {e}")))?;
        Ok(SignatureTriple {
            r: format!("0x{}", hex::encode(signature.r().to_be_bytes::<32>())),
            s: format!("0x{}", hex::encode(signature.s().to_be_bytes::<32>())),
            v: u64::from(signature.v()) + 27,
        })
    }
}

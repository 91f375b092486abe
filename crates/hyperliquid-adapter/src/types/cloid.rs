/*
[INPUT]:  Raw hex strings or integers supplied by the caller
[OUTPUT]: Validated 16-byte client order identifiers
[POS]:    Data layer - client order id value object
[UPDATE]: When the cloid wire format changes
*/

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{HyperliquidError, Result};

/// Client-supplied 16-byte order identifier, rendered as a `0x`-prefixed
/// 32-hex-character string. Validated at construction, not at use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cloid(u128);

impl Cloid {
    /// Build a cloid from an integer, zero-padded to 32 hex characters.
    pub fn from_int(value: u128) -> Self {
        Self(value)
    }

    /// Parse a `0x`-prefixed, exactly-32-hex-character string.
    pub fn from_hex(raw: &str) -> Result<Self> {
        let payload = raw.strip_prefix("0x").ok_or_else(|| {
            HyperliquidError::Validation(format!("cloid missing 0x prefix: {raw}"))
        })?;
        if payload.len() != 32 {
            return Err(HyperliquidError::Validation(format!(
                "cloid hex payload must be exactly 32 characters, got {}",
                payload.len()
            )));
        }
        // from_str_radix tolerates a leading sign, so every byte must be
        // checked for hex on its own.
        if !payload.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(HyperliquidError::Validation(format!(
                "cloid contains non-hex characters: {raw}"
            )));
        }
        let value = u128::from_str_radix(payload, 16).map_err(|_| {
            HyperliquidError::Validation(format!("cloid contains non-hex characters: {raw}"))
        })?;
        Ok(Self(value))
    }

    /// Wire form: `0x` + 32 lowercase hex characters.
    pub fn to_raw(&self) -> String {
        format!("0x{:032x}", self.0)
    }
}

impl fmt::Display for Cloid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_raw())
    }
}

impl Serialize for Cloid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_raw())
    }
}

impl<'de> Deserialize<'de> for Cloid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Cloid::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int_zero_pads() {
        let cloid = Cloid::from_int(1);
        assert_eq!(cloid.to_raw(), "0x00000000000000000000000000000001");
        assert_eq!(cloid.to_raw().len(), 34);
    }

    #[test]
    fn test_from_hex_roundtrip() {
        let raw = "0x1234567890abcdef1234567890abcdef";
        let cloid = Cloid::from_hex(raw).unwrap();
        assert_eq!(cloid.to_raw(), raw);
    }

    #[test]
    fn test_rejects_missing_prefix() {
        assert!(Cloid::from_hex("1234567890abcdef1234567890abcdef").is_err());
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Cloid::from_hex("0x1234").is_err());
        assert!(Cloid::from_hex("0x1234567890abcdef1234567890abcdef00").is_err());
    }

    #[test]
    fn test_rejects_non_hex() {
        assert!(Cloid::from_hex("0x1234567890abcdef1234567890abcdeg").is_err());
    }

    #[test]
    fn test_rejects_signed_payloads() {
        // A leading sign with 31 hex digits is 32 characters long but is
        // not 32 hex characters.
        assert!(Cloid::from_hex(&format!("0x+{}", "1".repeat(31))).is_err());
        assert!(Cloid::from_hex(&format!("0x-{}", "1".repeat(31))).is_err());
    }

    #[test]
    fn test_serde_as_raw_string() {
        let cloid = Cloid::from_int(0xff);
        let json = serde_json::to_string(&cloid).unwrap();
        assert_eq!(json, "\"0x000000000000000000000000000000ff\"");
        let back: Cloid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cloid);
    }
}

/*
[INPUT]:  High-level trading intents from the caller
[OUTPUT]: Typed order requests and their signature-relevant wire forms
[POS]:    Data layer - order model and wire representation
[UPDATE]: When the order schema or wire field ordering changes
*/

use serde::{Deserialize, Serialize};

use super::cloid::Cloid;
use super::enums::{Tif, Tpsl};

/// Order type: exactly one of limit or trigger. The enum makes the
/// "never both, never neither" invariant structural.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit(LimitOrderType),
    Trigger(TriggerOrderType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderType {
    pub tif: Tif,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOrderType {
    pub is_market: bool,
    pub trigger_px: f64,
    pub tpsl: Tpsl,
}

/// A single order as supplied by the caller; prices and sizes stay floats
/// until the wire conversion, where precision is enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub coin: String,
    pub is_buy: bool,
    pub sz: f64,
    pub limit_px: f64,
    pub order_type: OrderType,
    pub reduce_only: bool,
    pub cloid: Option<Cloid>,
}

/// An order id or a client order id, accepted interchangeably by modify
/// and cancel flows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OidOrCloid {
    Oid(u64),
    Cloid(Cloid),
}

impl From<u64> for OidOrCloid {
    fn from(oid: u64) -> Self {
        Self::Oid(oid)
    }
}

impl From<Cloid> for OidOrCloid {
    fn from(cloid: Cloid) -> Self {
        Self::Cloid(cloid)
    }
}

/// Modify request pairing an existing order id with its replacement
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyRequest {
    pub oid: OidOrCloid,
    pub order: OrderRequest,
}

/// Cancel by exchange order id
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequest {
    pub coin: String,
    pub oid: u64,
}

/// Cancel by client order id
#[derive(Debug, Clone, PartialEq)]
pub struct CancelByCloidRequest {
    pub coin: String,
    pub cloid: Cloid,
}

/// Builder fee attribution: address is lower-cased before signing so casing
/// cannot cause signature mismatches, fee is in tenths of a basis point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderInfo {
    #[serde(rename = "b")]
    pub builder: String,
    #[serde(rename = "f")]
    pub fee: u64,
}

/// Canonical, signature-relevant representation of a single order.
/// Field declaration order defines the canonical byte order and must not
/// be rearranged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p")]
    pub limit_px: String,
    #[serde(rename = "s")]
    pub sz: String,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderTypeWire,
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<Cloid>,
}

/// Wire form of an order type; trigger prices are decimal-exact strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderTypeWire {
    Limit(LimitOrderType),
    Trigger(TriggerOrderTypeWire),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerOrderTypeWire {
    pub is_market: bool,
    pub trigger_px: String,
    pub tpsl: Tpsl,
}

/// Wire form of a modify request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifyWire {
    pub oid: OidOrCloid,
    pub order: OrderWire,
}

/// Wire form of a cancel-by-oid request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelWire {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "o")]
    pub oid: u64,
}

/// Wire form of a cancel-by-cloid request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelByCloidWire {
    pub asset: u32,
    pub cloid: Cloid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_order_type_wire_shape() {
        let t = OrderTypeWire::Limit(LimitOrderType { tif: Tif::Gtc });
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"limit":{"tif":"Gtc"}}"#
        );
    }

    #[test]
    fn test_trigger_order_type_wire_shape() {
        let t = OrderTypeWire::Trigger(TriggerOrderTypeWire {
            is_market: true,
            trigger_px: "1000".to_string(),
            tpsl: Tpsl::Sl,
        });
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"trigger":{"isMarket":true,"triggerPx":"1000","tpsl":"sl"}}"#
        );
    }

    #[test]
    fn test_order_wire_key_order() {
        let wire = OrderWire {
            asset: 3,
            is_buy: true,
            limit_px: "100.12345678".to_string(),
            sz: "1.5".to_string(),
            reduce_only: false,
            order_type: OrderTypeWire::Limit(LimitOrderType { tif: Tif::Gtc }),
            cloid: None,
        };
        assert_eq!(
            serde_json::to_string(&wire).unwrap(),
            r#"{"a":3,"b":true,"p":"100.12345678","s":"1.5","r":false,"t":{"limit":{"tif":"Gtc"}}}"#
        );
    }

    #[test]
    fn test_oid_or_cloid_untagged() {
        assert_eq!(serde_json::to_string(&OidOrCloid::Oid(42)).unwrap(), "42");
        let cloid = Cloid::from_int(7);
        assert_eq!(
            serde_json::to_string(&OidOrCloid::Cloid(cloid)).unwrap(),
            "\"0x00000000000000000000000000000007\""
        );
    }
}

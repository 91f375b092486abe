/*
[INPUT]:  Raw venue response bodies
[OUTPUT]: Typed exchange/info responses with per-item statuses
[POS]:    Data layer - response parsing for venue-reported outcomes
[UPDATE]: When the venue response schema changes
*/

use std::collections::HashMap;

use serde::Deserialize;

/// Top-level exchange endpoint response. A transport-successful reply can
/// still carry a business-logic failure, either at the top level (`err`) or
/// per batch item inside `statuses`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "response")]
pub enum ExchangeResponseStatus {
    Ok(ExchangeResponse),
    Err(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeResponse {
    #[serde(rename = "type")]
    pub response_type: String,
    pub data: Option<ExchangeDataStatuses>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeDataStatuses {
    pub statuses: Vec<ExchangeDataStatus>,
}

/// Per-item outcome inside a batch response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExchangeDataStatus {
    Success,
    WaitingForFill,
    WaitingForTrigger,
    Error(String),
    Resting(RestingOrder),
    Filled(FilledOrder),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RestingOrder {
    pub oid: u64,
    pub cloid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledOrder {
    pub oid: u64,
    pub total_sz: String,
    pub avg_px: String,
    pub cloid: Option<String>,
}

/// Mid prices keyed by coin, from the info endpoint
pub type AllMids = HashMap<String, String>;

/// Minimal clearinghouse state needed by market-close flows
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    pub asset_positions: Vec<AssetPosition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPosition {
    pub position: PositionData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionData {
    pub coin: String,
    /// Signed position size as a decimal string; negative means short
    pub szi: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok_response_with_statuses() {
        let body = r#"{
            "status": "ok",
            "response": {
                "type": "order",
                "data": { "statuses": [ { "resting": { "oid": 77738308 } } ] }
            }
        }"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(body).unwrap();
        match parsed {
            ExchangeResponseStatus::Ok(resp) => {
                assert_eq!(resp.response_type, "order");
                let statuses = resp.data.unwrap().statuses;
                assert!(matches!(
                    statuses[0],
                    ExchangeDataStatus::Resting(RestingOrder { oid: 77738308, .. })
                ));
            }
            ExchangeResponseStatus::Err(_) => panic!("expected ok"),
        }
    }

    #[test]
    fn test_parse_top_level_err() {
        let body = r#"{"status":"err","response":"Order must have minimum value of $10"}"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(body).unwrap();
        assert!(matches!(parsed, ExchangeResponseStatus::Err(msg) if msg.contains("minimum")));
    }

    #[test]
    fn test_parse_per_item_error_and_fill() {
        let body = r#"{
            "status": "ok",
            "response": {
                "type": "order",
                "data": { "statuses": [
                    { "filled": { "oid": 1, "totalSz": "1.5", "avgPx": "100.1" } },
                    { "error": "Insufficient margin" },
                    "success"
                ] }
            }
        }"#;
        let parsed: ExchangeResponseStatus = serde_json::from_str(body).unwrap();
        let ExchangeResponseStatus::Ok(resp) = parsed else {
            panic!("expected ok");
        };
        let statuses = resp.data.unwrap().statuses;
        assert!(matches!(statuses[0], ExchangeDataStatus::Filled(_)));
        assert!(matches!(statuses[1], ExchangeDataStatus::Error(ref e) if e.contains("margin")));
        assert!(matches!(statuses[2], ExchangeDataStatus::Success));
    }

    #[test]
    fn test_parse_user_state() {
        let body = r#"{
            "assetPositions": [
                { "position": { "coin": "ETH", "szi": "-2.5" }, "type": "oneWay" }
            ],
            "marginSummary": {}
        }"#;
        let state: UserState = serde_json::from_str(body).unwrap();
        assert_eq!(state.asset_positions[0].position.coin, "ETH");
        assert_eq!(state.asset_positions[0].position.szi, "-2.5");
    }
}

/*
[INPUT]:  Subscription requests and inbound frames
[OUTPUT]: Routing identifiers shared by both directions
[POS]:    WebSocket layer - subscription model and identifier scheme
[UPDATE]: When adding feeds or changing the identifier scheme
*/

use serde::{Deserialize, Serialize};

/// One venue data feed. Serializes to the `subscription` object of
/// subscribe/unsubscribe frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Subscription {
    AllMids,
    Notification { user: String },
    WebData2 { user: String },
    Candle { coin: String, interval: String },
    L2Book { coin: String },
    Trades { coin: String },
    OrderUpdates { user: String },
    UserEvents { user: String },
    UserFills { user: String },
    UserFundings { user: String },
    UserNonFundingLedgerUpdates { user: String },
    ActiveAssetCtx { coin: String },
    Bbo { coin: String },
}

impl Subscription {
    /// Routing key. Coins and users are lower-cased so the same feed
    /// requested with different casing lands on one identifier.
    pub fn identifier(&self) -> String {
        match self {
            Subscription::AllMids => "allMids".to_string(),
            Subscription::Notification { .. } => "notification".to_string(),
            Subscription::WebData2 { .. } => "webData2".to_string(),
            Subscription::Candle { coin, interval } => {
                format!("candle:{},{}", coin.to_lowercase(), interval)
            }
            Subscription::L2Book { coin } => format!("l2Book:{}", coin.to_lowercase()),
            Subscription::Trades { coin } => format!("trades:{}", coin.to_lowercase()),
            // These two identify the whole account stream, not a user key.
            Subscription::OrderUpdates { .. } => "orderUpdates".to_string(),
            Subscription::UserEvents { .. } => "userEvents".to_string(),
            Subscription::UserFills { user } => format!("userFills:{}", user.to_lowercase()),
            Subscription::UserFundings { user } => {
                format!("userFundings:{}", user.to_lowercase())
            }
            Subscription::UserNonFundingLedgerUpdates { user } => {
                format!("userNonFundingLedgerUpdates:{}", user.to_lowercase())
            }
            Subscription::ActiveAssetCtx { coin } => {
                format!("activeAssetCtx:{}", coin.to_lowercase())
            }
            Subscription::Bbo { coin } => format!("bbo:{}", coin.to_lowercase()),
        }
    }

    /// Identifiers the venue serves at most once per socket; a second
    /// registration is rejected instead of silently sharing the stream.
    pub fn is_exclusive(&self) -> bool {
        matches!(
            self,
            Subscription::OrderUpdates { .. } | Subscription::UserEvents { .. }
        )
    }
}

/// An inbound frame: a channel tag plus an opaque payload handed to
/// callbacks as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMsg {
    pub channel: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Map an inbound frame to the identifier its callbacks are keyed under.
/// `None` means the frame carries no routing information (heartbeats,
/// subscription acks, empty trade batches).
pub fn message_identifier(msg: &WsMsg) -> Option<String> {
    match msg.channel.as_str() {
        "pong" | "subscriptionResponse" => None,
        "allMids" => Some("allMids".to_string()),
        "notification" => Some("notification".to_string()),
        "webData2" => Some("webData2".to_string()),
        "candle" => {
            let coin = msg.data.get("s")?.as_str()?;
            let interval = msg.data.get("i")?.as_str()?;
            Some(format!("candle:{},{}", coin.to_lowercase(), interval))
        }
        "l2Book" => {
            let coin = msg.data.get("coin")?.as_str()?;
            Some(format!("l2Book:{}", coin.to_lowercase()))
        }
        "trades" => {
            // Trades arrive as a batch for a single coin; an empty batch
            // cannot be routed.
            let coin = msg.data.as_array()?.first()?.get("coin")?.as_str()?;
            Some(format!("trades:{}", coin.to_lowercase()))
        }
        "orderUpdates" => Some("orderUpdates".to_string()),
        // The venue answers a userEvents subscription on channel "user".
        "user" => Some("userEvents".to_string()),
        "userFills" => {
            let user = msg.data.get("user")?.as_str()?;
            Some(format!("userFills:{}", user.to_lowercase()))
        }
        "userFundings" => {
            let user = msg.data.get("user")?.as_str()?;
            Some(format!("userFundings:{}", user.to_lowercase()))
        }
        "userNonFundingLedgerUpdates" => {
            let user = msg.data.get("user")?.as_str()?;
            Some(format!("userNonFundingLedgerUpdates:{}", user.to_lowercase()))
        }
        "activeAssetCtx" => {
            let coin = msg.data.get("coin")?.as_str()?;
            Some(format!("activeAssetCtx:{}", coin.to_lowercase()))
        }
        "bbo" => {
            let coin = msg.data.get("coin")?.as_str()?;
            Some(format!("bbo:{}", coin.to_lowercase()))
        }
        _ => None,
    }
}

/*
[INPUT]:  Error sources (encoding, validation, signing, HTTP, WebSocket, venue)
[OUTPUT]: Structured error types with context and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

use crate::types::ExchangeResponse;

/// Main error type for the Hyperliquid adapter
#[derive(Error, Debug)]
pub enum HyperliquidError {
    /// A float cannot be represented at the required wire precision.
    /// Never silently rounded; fatal to the single call that produced it.
    #[error("float {value} cannot be encoded at the required precision")]
    FloatRounding { value: f64 },

    /// Malformed input caught at construction time (client order id,
    /// order type, duplicate exclusive subscription, ...)
    #[error("validation failed: {0}")]
    Validation(String),

    /// Wallet or typed-data signing failed
    #[error("signing failed: {0}")]
    Signing(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request/response exchange exceeded its deadline
    #[error("request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// The venue accepted the request but reported a business-logic failure.
    /// Carries the full response so batch results stay inspectable.
    #[error("venue rejected request: {message}")]
    VenueRejected {
        message: String,
        response: Option<Box<ExchangeResponse>>,
    },

    /// WebSocket transport failure
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Canonical MessagePack encoding failed
    #[error("canonical encoding error: {0}")]
    Encoding(#[from] rmp_serde::encode::Error),

    /// URL parsing failed
    #[error("invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Unknown symbol or asset index
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
}

impl HyperliquidError {
    /// Check if the error is retryable by an outer caller. Venue business
    /// errors are excluded: trading actions cannot be assumed idempotent.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HyperliquidError::Http(_)
                | HyperliquidError::Timeout { .. }
                | HyperliquidError::WebSocket(_)
        )
    }

    /// Check if the error came back from the venue rather than the transport
    pub fn is_venue_error(&self) -> bool {
        matches!(self, HyperliquidError::VenueRejected { .. })
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, HyperliquidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        let timeout = HyperliquidError::Timeout { duration_secs: 30 };
        assert!(timeout.is_retryable());

        let rounding = HyperliquidError::FloatRounding { value: 0.1234567891 };
        assert!(!rounding.is_retryable());

        let venue = HyperliquidError::VenueRejected {
            message: "Order has invalid size".to_string(),
            response: None,
        };
        assert!(!venue.is_retryable());
        assert!(venue.is_venue_error());
    }

    #[test]
    fn test_error_display() {
        let err = HyperliquidError::Validation("cloid must be 0x + 32 hex chars".to_string());
        assert!(err.to_string().contains("validation failed"));
    }
}

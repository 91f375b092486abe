/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Hyperliquid adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod actions;
pub mod directory;
pub mod errors;
pub mod exchange;
pub mod http;
pub mod info;
pub mod signing;
pub mod types;
pub mod ws;

// Re-export the error type and crate-wide Result
pub use errors::{HyperliquidError, Result};

// Re-export commonly used types from http
pub use http::{BaseUrl, ClientConfig};

// Re-export the directory seam
pub use directory::{AssetDirectory, StaticDirectory};

// Re-export commonly used signing types
pub use signing::{LocalWallet, SignatureTriple, WalletSigner};

// Re-export the action model
pub use actions::Action;

// Re-export all data types
pub use types::*;

// Re-export the client surfaces
pub use exchange::{ExchangeClient, DEFAULT_SLIPPAGE};
pub use info::InfoClient;

// Re-export commonly used types from ws
pub use ws::{Subscription, WsEvent, WsManager, WsMsg};

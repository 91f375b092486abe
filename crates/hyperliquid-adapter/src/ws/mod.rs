/*
[INPUT]:  Crate WebSocket configuration
[OUTPUT]: Public WebSocket surface
[POS]:    WebSocket layer - module wiring
[UPDATE]: When public WebSocket types change
*/

pub mod connection;
pub mod mux;
pub mod subscriptions;

pub use connection::{WsEvent, WsManager};
pub use mux::{Callback, MuxState, WireOp};
pub use subscriptions::{message_identifier, Subscription, WsMsg};

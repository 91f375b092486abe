/*
[INPUT]:  Exchange schema definitions and serde requirements
[OUTPUT]: Public type surface for requests, wire forms, and responses
[POS]:    Data layer - module wiring
[UPDATE]: When public types change
*/

pub mod cloid;
pub mod enums;
pub mod order;
pub mod responses;

pub use cloid::Cloid;
pub use enums::{Grouping, Tif, Tpsl};
pub use order::{
    BuilderInfo, CancelByCloidRequest, CancelByCloidWire, CancelRequest, CancelWire,
    LimitOrderType, ModifyRequest, ModifyWire, OidOrCloid, OrderRequest, OrderType, OrderTypeWire,
    OrderWire, TriggerOrderType, TriggerOrderTypeWire,
};
pub use responses::{
    AllMids, AssetPosition, ExchangeDataStatus, ExchangeDataStatuses, ExchangeResponse,
    ExchangeResponseStatus, FilledOrder, PositionData, RestingOrder, UserState,
};

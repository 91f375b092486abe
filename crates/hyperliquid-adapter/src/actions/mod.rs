/*
[INPUT]:  Typed trading intents with pre-resolved asset indices
[OUTPUT]: Tagged Action values in canonical field order, ready for hashing
[POS]:    Action layer - builders for every exchange-state mutation
[UPDATE]: When action shapes or canonical field ordering change
*/

use serde::Serialize;

use crate::errors::Result;
use crate::signing::{float_to_wire, SignatureTriple};
use crate::types::{
    BuilderInfo, CancelByCloidWire, CancelWire, Grouping, ModifyWire, OrderRequest, OrderType,
    OrderTypeWire, OrderWire, TriggerOrderTypeWire,
};

/// One exchange-state mutation, tagged by `type`. Variant payload structs
/// declare fields in the original construction order: that order defines
/// the canonical bytes fed to the action hasher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order(OrderAction),
    BatchModify(BatchModifyAction),
    Cancel(CancelAction),
    CancelByCloid(CancelByCloidAction),
    ScheduleCancel(ScheduleCancelAction),
    UpdateLeverage(UpdateLeverageAction),
    UpdateIsolatedMargin(UpdateIsolatedMarginAction),
    UsdSend(UsdSendAction),
    SpotSend(SpotSendAction),
    Withdraw3(WithdrawAction),
    UsdClassTransfer(UsdClassTransferAction),
    SubAccountTransfer(SubAccountTransferAction),
    VaultTransfer(VaultTransferAction),
    SetReferrer(SetReferrerAction),
    CreateSubAccount(CreateSubAccountAction),
    ApproveAgent(ApproveAgentAction),
    ApproveBuilderFee(ApproveBuilderFeeAction),
    ConvertToMultiSigUser(ConvertToMultiSigUserAction),
    MultiSig(MultiSigAction),
}

impl Action {
    /// The class-transfer action must post with a null vault address
    /// regardless of client configuration.
    pub fn is_usd_class_transfer(&self) -> bool {
        matches!(self, Action::UsdClassTransfer(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAction {
    pub orders: Vec<OrderWire>,
    pub grouping: Grouping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchModifyAction {
    pub modifies: Vec<ModifyWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelAction {
    pub cancels: Vec<CancelWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelByCloidAction {
    pub cancels: Vec<CancelByCloidWire>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleCancelAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeverageAction {
    pub asset: u32,
    pub is_cross: bool,
    pub leverage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIsolatedMarginAction {
    pub asset: u32,
    pub is_buy: bool,
    pub ntli: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdSendAction {
    pub destination: String,
    pub amount: String,
    pub time: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotSendAction {
    pub destination: String,
    pub amount: String,
    pub token: String,
    pub time: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawAction {
    pub destination: String,
    pub amount: String,
    pub time: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdClassTransferAction {
    pub amount: String,
    pub to_perp: bool,
    pub nonce: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAccountTransferAction {
    pub sub_account_user: String,
    pub is_deposit: bool,
    pub usd: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransferAction {
    pub vault_address: String,
    pub is_deposit: bool,
    pub usd: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetReferrerAction {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateSubAccountAction {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveAgentAction {
    pub agent_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub nonce: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBuilderFeeAction {
    pub max_fee_rate: String,
    pub builder: String,
    pub nonce: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToMultiSigUserAction {
    /// JSON-encoded `{authorizedUsers, threshold}` with users sorted
    pub signers: String,
    pub nonce: u64,
    pub signature_chain_id: String,
    pub hyperliquid_chain: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigAction {
    pub signature_chain_id: String,
    pub signatures: Vec<SignatureTriple>,
    pub payload: MultiSigPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSigPayload {
    pub multi_sig_user: String,
    pub outer_signer: String,
    pub action: Box<Action>,
}

/// Convert an order type to its wire form, enforcing trigger-price
/// precision through the same rule as prices and sizes.
pub fn order_type_to_wire(order_type: OrderType) -> Result<OrderTypeWire> {
    match order_type {
        OrderType::Limit(limit) => Ok(OrderTypeWire::Limit(limit)),
        OrderType::Trigger(trigger) => Ok(OrderTypeWire::Trigger(TriggerOrderTypeWire {
            is_market: trigger.is_market,
            trigger_px: float_to_wire(trigger.trigger_px)?,
            tpsl: trigger.tpsl,
        })),
    }
}

/// Convert an order request into its canonical wire form with the asset
/// index already resolved by the directory collaborator.
pub fn order_to_wire(order: &OrderRequest, asset: u32) -> Result<OrderWire> {
    Ok(OrderWire {
        asset,
        is_buy: order.is_buy,
        limit_px: float_to_wire(order.limit_px)?,
        sz: float_to_wire(order.sz)?,
        reduce_only: order.reduce_only,
        order_type: order_type_to_wire(order.order_type)?,
        cloid: order.cloid,
    })
}

/// Assemble the bulk order action, preserving caller-supplied order.
/// Builder addresses are lower-cased so casing cannot break signatures.
pub fn order_wires_to_action(
    orders: Vec<OrderWire>,
    grouping: Grouping,
    builder: Option<BuilderInfo>,
) -> Action {
    Action::Order(OrderAction {
        orders,
        grouping,
        builder: builder.map(|b| BuilderInfo {
            builder: b.builder.to_lowercase(),
            fee: b.fee,
        }),
    })
}

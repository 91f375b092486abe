/*
[INPUT]:  Trading intents, a wallet, and the symbol directory
[OUTPUT]: Signed payloads posted to the exchange endpoint
[POS]:    Exchange layer - authenticated trading client
[UPDATE]: When adding trading operations or changing the signed payload
*/

use std::sync::Arc;

use alloy_primitives::Address;
use serde::Serialize;
use tracing::{debug, warn};

use crate::actions::{
    Action, ApproveAgentAction, ApproveBuilderFeeAction, BatchModifyAction, CancelAction,
    CancelByCloidAction, ConvertToMultiSigUserAction, CreateSubAccountAction, MultiSigAction,
    MultiSigPayload, ScheduleCancelAction, SetReferrerAction, SpotSendAction,
    SubAccountTransferAction, UpdateIsolatedMarginAction, UpdateLeverageAction,
    UsdClassTransferAction, UsdSendAction, VaultTransferAction, WithdrawAction,
};
use crate::actions::{order_to_wire, order_wires_to_action};
use crate::directory::AssetDirectory;
use crate::errors::{HyperliquidError, Result};
use crate::http::{BaseUrl, ClientConfig, HttpClient};
use crate::info::InfoClient;
use crate::signing::{
    self, float_to_usd_int, float_to_wire, hyperliquid_chain, signature_chain_id, timestamp_ms,
    Eip712Value, LocalWallet, SignatureTriple, WalletSigner, APPROVE_AGENT_SIGN_TYPES,
    APPROVE_BUILDER_FEE_SIGN_TYPES, CONVERT_TO_MULTI_SIG_USER_SIGN_TYPES,
    SPOT_TRANSFER_SIGN_TYPES, USD_CLASS_TRANSFER_SIGN_TYPES, USD_SEND_SIGN_TYPES,
    WITHDRAW_SIGN_TYPES,
};
use crate::types::{
    BuilderInfo, CancelByCloidRequest, CancelByCloidWire, CancelRequest, CancelWire,
    Cloid, ExchangeDataStatus, ExchangeResponse, ExchangeResponseStatus, Grouping,
    LimitOrderType, ModifyRequest, ModifyWire, OrderRequest, OrderType, Tif,
};

/// Default max slippage for market orders, 5%
pub const DEFAULT_SLIPPAGE: f64 = 0.05;

/// Outbound signed payload posted to the exchange endpoint
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignedPayload<'a> {
    action: &'a Action,
    nonce: u64,
    signature: &'a SignatureTriple,
    /// Serialized as an explicit `null` when absent
    vault_address: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSigSigners<'a> {
    authorized_users: &'a [String],
    threshold: u32,
}

fn address_to_hex(address: Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Authenticated client: holds the wallet, directory, and optional vault
/// address by composition. Read-only callers use `InfoClient` instead and
/// cannot reach any trading operation.
pub struct ExchangeClient {
    http: HttpClient,
    info: InfoClient,
    wallet: Arc<dyn WalletSigner>,
    directory: Arc<dyn AssetDirectory>,
    vault_address: Option<Address>,
    account_address: Option<Address>,
    base_url: BaseUrl,
}

impl ExchangeClient {
    pub fn new(
        wallet: Arc<dyn WalletSigner>,
        directory: Arc<dyn AssetDirectory>,
        base_url: BaseUrl,
        vault_address: Option<Address>,
    ) -> Result<Self> {
        Self::with_config(
            wallet,
            directory,
            base_url,
            vault_address,
            ClientConfig::default(),
        )
    }

    pub fn with_config(
        wallet: Arc<dyn WalletSigner>,
        directory: Arc<dyn AssetDirectory>,
        base_url: BaseUrl,
        vault_address: Option<Address>,
        config: ClientConfig,
    ) -> Result<Self> {
        let http = HttpClient::with_config(base_url, config)?;
        let info = InfoClient::from_http(http.clone());
        Ok(Self {
            http,
            info,
            wallet,
            directory,
            vault_address,
            account_address: None,
            base_url,
        })
    }

    /// Act on behalf of a master account when the wallet is an approved
    /// agent key.
    pub fn with_account_address(mut self, account_address: Address) -> Self {
        self.account_address = Some(account_address);
        self
    }

    /// Point the client at a custom endpoint, for tests.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        self.http = self.http.with_base_url(endpoint)?;
        self.info = InfoClient::from_http(self.http.clone());
        Ok(self)
    }

    pub fn vault_address(&self) -> Option<Address> {
        self.vault_address
    }

    fn is_mainnet(&self) -> bool {
        self.base_url.is_mainnet()
    }

    /// The vault address participates in the digest and the payload
    /// together; `vault` here must be exactly what the action was signed
    /// with. The class-transfer action always posts a null vault address.
    async fn post_action(
        &self,
        action: &Action,
        signature: SignatureTriple,
        nonce: u64,
        vault: Option<Address>,
    ) -> Result<ExchangeResponse> {
        let vault_address = if action.is_usd_class_transfer() {
            None
        } else {
            vault.map(address_to_hex)
        };
        let payload = SignedPayload {
            action,
            nonce,
            signature: &signature,
            vault_address,
        };
        debug!(nonce, "posting signed action");
        let status: ExchangeResponseStatus = self.http.post("/exchange", &payload).await?;
        match status {
            ExchangeResponseStatus::Err(message) => {
                warn!(%message, "venue rejected action");
                Err(HyperliquidError::VenueRejected {
                    message,
                    response: None,
                })
            }
            ExchangeResponseStatus::Ok(response) => {
                let item_error = response.data.as_ref().and_then(|data| {
                    data.statuses.iter().find_map(|status| match status {
                        ExchangeDataStatus::Error(e) => Some(e.clone()),
                        _ => None,
                    })
                });
                match item_error {
                    Some(message) => {
                        warn!(%message, "venue rejected batch item");
                        Err(HyperliquidError::VenueRejected {
                            message,
                            response: Some(Box::new(response)),
                        })
                    }
                    None => Ok(response),
                }
            }
        }
    }

    async fn post_l1_action(&self, action: Action, vault: Option<Address>) -> Result<ExchangeResponse> {
        let nonce = timestamp_ms();
        let signature =
            signing::sign_l1_action(&*self.wallet, &action, vault, nonce, self.is_mainnet())
                .await?;
        self.post_action(&action, signature, nonce, vault).await
    }

    /// Aggressive market price: mid (or the supplied price) adjusted by the
    /// slippage fraction, rounded to 6 decimals for perps and 8 for spot.
    async fn slippage_price(
        &self,
        name: &str,
        is_buy: bool,
        slippage: f64,
        px: Option<f64>,
    ) -> Result<f64> {
        let coin = self.directory.normalize(name)?;
        let px = match px {
            Some(px) => px,
            None => {
                let mids = self.info.all_mids().await?;
                mids.get(&coin)
                    .and_then(|p| p.parse::<f64>().ok())
                    .ok_or_else(|| {
                        HyperliquidError::Validation(format!("no mid price for {coin}"))
                    })?
            }
        };
        let asset = self.directory.resolve(name)?;
        // spot assets start at 10000
        let is_spot = asset >= 10_000;
        let px = if is_buy {
            px * (1.0 + slippage)
        } else {
            px * (1.0 - slippage)
        };
        let scale = 10f64.powi(if is_spot { 8 } else { 6 });
        Ok((px * scale).round() / scale)
    }

    /// Place a single order.
    pub async fn order(
        &self,
        order: OrderRequest,
        builder: Option<BuilderInfo>,
    ) -> Result<ExchangeResponse> {
        self.bulk_orders(vec![order], Grouping::Na, builder).await
    }

    /// Place a batch of orders, preserving caller-supplied order.
    pub async fn bulk_orders(
        &self,
        orders: Vec<OrderRequest>,
        grouping: Grouping,
        builder: Option<BuilderInfo>,
    ) -> Result<ExchangeResponse> {
        let wires = orders
            .iter()
            .map(|order| order_to_wire(order, self.directory.resolve(&order.coin)?))
            .collect::<Result<Vec<_>>>()?;
        let action = order_wires_to_action(wires, grouping, builder);
        self.post_l1_action(action, self.vault_address).await
    }

    /// Replace a single resting order.
    pub async fn modify_order(&self, modify: ModifyRequest) -> Result<ExchangeResponse> {
        self.bulk_modify_orders(vec![modify]).await
    }

    /// Replace a batch of resting orders.
    pub async fn bulk_modify_orders(
        &self,
        modifies: Vec<ModifyRequest>,
    ) -> Result<ExchangeResponse> {
        let wires = modifies
            .iter()
            .map(|modify| {
                Ok(ModifyWire {
                    oid: modify.oid,
                    order: order_to_wire(
                        &modify.order,
                        self.directory.resolve(&modify.order.coin)?,
                    )?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let action = Action::BatchModify(BatchModifyAction { modifies: wires });
        self.post_l1_action(action, self.vault_address).await
    }

    /// Aggressive IoC limit order at a slippage-adjusted price.
    pub async fn market_open(
        &self,
        name: &str,
        is_buy: bool,
        sz: f64,
        px: Option<f64>,
        slippage: f64,
        cloid: Option<Cloid>,
        builder: Option<BuilderInfo>,
    ) -> Result<ExchangeResponse> {
        let px = self.slippage_price(name, is_buy, slippage, px).await?;
        let order = OrderRequest {
            coin: name.to_string(),
            is_buy,
            sz,
            limit_px: px,
            order_type: OrderType::Limit(LimitOrderType { tif: Tif::Ioc }),
            reduce_only: false,
            cloid,
        };
        self.order(order, builder).await
    }

    /// Close an open position with an aggressive reduce-only IoC order.
    pub async fn market_close(
        &self,
        coin: &str,
        sz: Option<f64>,
        px: Option<f64>,
        slippage: f64,
        cloid: Option<Cloid>,
        builder: Option<BuilderInfo>,
    ) -> Result<ExchangeResponse> {
        let address = self
            .vault_address
            .or(self.account_address)
            .unwrap_or_else(|| self.wallet.address());
        let state = self.info.user_state(&address_to_hex(address)).await?;
        let position = state
            .asset_positions
            .iter()
            .map(|p| &p.position)
            .find(|p| p.coin == coin)
            .ok_or_else(|| {
                HyperliquidError::Validation(format!("no open position for {coin}"))
            })?;
        let szi = position.szi.parse::<f64>().map_err(|_| {
            HyperliquidError::Validation(format!("unparseable position size: {}", position.szi))
        })?;
        let sz = sz.unwrap_or_else(|| szi.abs());
        let is_buy = szi < 0.0;
        let px = self.slippage_price(coin, is_buy, slippage, px).await?;
        let order = OrderRequest {
            coin: coin.to_string(),
            is_buy,
            sz,
            limit_px: px,
            order_type: OrderType::Limit(LimitOrderType { tif: Tif::Ioc }),
            reduce_only: true,
            cloid,
        };
        self.order(order, builder).await
    }

    /// Cancel a single order by exchange order id.
    pub async fn cancel(&self, coin: &str, oid: u64) -> Result<ExchangeResponse> {
        self.bulk_cancel(vec![CancelRequest {
            coin: coin.to_string(),
            oid,
        }])
        .await
    }

    /// Cancel a single order by client order id.
    pub async fn cancel_by_cloid(&self, coin: &str, cloid: Cloid) -> Result<ExchangeResponse> {
        self.bulk_cancel_by_cloid(vec![CancelByCloidRequest {
            coin: coin.to_string(),
            cloid,
        }])
        .await
    }

    pub async fn bulk_cancel(&self, cancels: Vec<CancelRequest>) -> Result<ExchangeResponse> {
        let wires = cancels
            .iter()
            .map(|cancel| {
                Ok(CancelWire {
                    asset: self.directory.resolve(&cancel.coin)?,
                    oid: cancel.oid,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let action = Action::Cancel(CancelAction { cancels: wires });
        self.post_l1_action(action, self.vault_address).await
    }

    pub async fn bulk_cancel_by_cloid(
        &self,
        cancels: Vec<CancelByCloidRequest>,
    ) -> Result<ExchangeResponse> {
        let wires = cancels
            .iter()
            .map(|cancel| {
                Ok(CancelByCloidWire {
                    asset: self.directory.resolve(&cancel.coin)?,
                    cloid: cancel.cloid,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let action = Action::CancelByCloid(CancelByCloidAction { cancels: wires });
        self.post_l1_action(action, self.vault_address).await
    }

    /// Schedule a time (UTC millis) at which all open orders cancel, or
    /// unset a previously scheduled time by passing `None`.
    pub async fn schedule_cancel(&self, time: Option<u64>) -> Result<ExchangeResponse> {
        let action = Action::ScheduleCancel(ScheduleCancelAction { time });
        self.post_l1_action(action, self.vault_address).await
    }

    pub async fn update_leverage(
        &self,
        leverage: u32,
        name: &str,
        is_cross: bool,
    ) -> Result<ExchangeResponse> {
        let action = Action::UpdateLeverage(UpdateLeverageAction {
            asset: self.directory.resolve(name)?,
            is_cross,
            leverage,
        });
        self.post_l1_action(action, self.vault_address).await
    }

    pub async fn update_isolated_margin(
        &self,
        amount_usd: f64,
        name: &str,
    ) -> Result<ExchangeResponse> {
        let action = Action::UpdateIsolatedMargin(UpdateIsolatedMarginAction {
            asset: self.directory.resolve(name)?,
            is_buy: true,
            ntli: float_to_usd_int(amount_usd)?,
        });
        self.post_l1_action(action, self.vault_address).await
    }

    pub async fn set_referrer(&self, code: &str) -> Result<ExchangeResponse> {
        let action = Action::SetReferrer(SetReferrerAction {
            code: code.to_string(),
        });
        self.post_l1_action(action, None).await
    }

    pub async fn create_sub_account(&self, name: &str) -> Result<ExchangeResponse> {
        let action = Action::CreateSubAccount(CreateSubAccountAction {
            name: name.to_string(),
        });
        self.post_l1_action(action, None).await
    }

    pub async fn sub_account_transfer(
        &self,
        sub_account_user: &str,
        is_deposit: bool,
        usd: u64,
    ) -> Result<ExchangeResponse> {
        let action = Action::SubAccountTransfer(SubAccountTransferAction {
            sub_account_user: sub_account_user.to_lowercase(),
            is_deposit,
            usd,
        });
        self.post_l1_action(action, None).await
    }

    pub async fn vault_usd_transfer(
        &self,
        vault_address: &str,
        is_deposit: bool,
        usd: u64,
    ) -> Result<ExchangeResponse> {
        let action = Action::VaultTransfer(VaultTransferAction {
            vault_address: vault_address.to_lowercase(),
            is_deposit,
            usd,
        });
        self.post_l1_action(action, None).await
    }

    /// Move USD between the perp and spot balance of the same account.
    pub async fn usd_class_transfer(
        &self,
        amount: f64,
        to_perp: bool,
    ) -> Result<ExchangeResponse> {
        let nonce = timestamp_ms();
        let mut amount = float_to_wire(amount)?;
        if let Some(vault) = self.vault_address {
            amount.push_str(&format!(" subaccount:{}", address_to_hex(vault)));
        }
        let action = UsdClassTransferAction {
            amount,
            to_perp,
            nonce,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.amount),
            Eip712Value::Bool(action.to_perp),
            Eip712Value::Uint64(action.nonce),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:UsdClassTransfer",
            USD_CLASS_TRANSFER_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::UsdClassTransfer(action);
        self.post_action(&action, signature, nonce, None).await
    }

    /// Send USD to another address.
    pub async fn usd_transfer(&self, amount: f64, destination: &str) -> Result<ExchangeResponse> {
        let time = timestamp_ms();
        let action = UsdSendAction {
            destination: destination.to_string(),
            amount: float_to_wire(amount)?,
            time,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.destination),
            Eip712Value::String(&action.amount),
            Eip712Value::Uint64(action.time),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:UsdSend",
            USD_SEND_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::UsdSend(action);
        self.post_action(&action, signature, time, None).await
    }

    /// Send a spot token to another address.
    pub async fn spot_transfer(
        &self,
        amount: f64,
        destination: &str,
        token: &str,
    ) -> Result<ExchangeResponse> {
        let time = timestamp_ms();
        let action = SpotSendAction {
            destination: destination.to_string(),
            amount: float_to_wire(amount)?,
            token: token.to_string(),
            time,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.destination),
            Eip712Value::String(&action.token),
            Eip712Value::String(&action.amount),
            Eip712Value::Uint64(action.time),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:SpotSend",
            SPOT_TRANSFER_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::SpotSend(action);
        self.post_action(&action, signature, time, None).await
    }

    /// Withdraw USD via the bridge.
    pub async fn withdraw_from_bridge(
        &self,
        amount: f64,
        destination: &str,
    ) -> Result<ExchangeResponse> {
        let time = timestamp_ms();
        let action = WithdrawAction {
            destination: destination.to_string(),
            amount: float_to_wire(amount)?,
            time,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.destination),
            Eip712Value::String(&action.amount),
            Eip712Value::Uint64(action.time),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:Withdraw",
            WITHDRAW_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::Withdraw3(action);
        self.post_action(&action, signature, time, None).await
    }

    /// Approve a freshly generated agent key; returns the response together
    /// with the agent's private key for the caller to store.
    pub async fn approve_agent(
        &self,
        name: Option<&str>,
    ) -> Result<(ExchangeResponse, String)> {
        let agent = LocalWallet::random();
        let agent_key = agent.to_key_hex();
        let nonce = timestamp_ms();
        let action = ApproveAgentAction {
            agent_address: address_to_hex(agent.address()),
            agent_name: name.map(str::to_string),
            nonce,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        // The digest always covers an agentName, defaulting to "" when the
        // posted action omits the field.
        let signed_name = action.agent_name.clone().unwrap_or_default();
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::Address(agent.address()),
            Eip712Value::String(&signed_name),
            Eip712Value::Uint64(action.nonce),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:ApproveAgent",
            APPROVE_AGENT_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::ApproveAgent(action);
        let response = self.post_action(&action, signature, nonce, None).await?;
        Ok((response, agent_key))
    }

    /// Authorize a builder address to collect up to `max_fee_rate` on the
    /// caller's orders.
    pub async fn approve_builder_fee(
        &self,
        builder: &str,
        max_fee_rate: &str,
    ) -> Result<ExchangeResponse> {
        let builder_address: Address = builder.parse().map_err(|_| {
            HyperliquidError::Validation(format!("invalid builder address: {builder}"))
        })?;
        let nonce = timestamp_ms();
        let action = ApproveBuilderFeeAction {
            max_fee_rate: max_fee_rate.to_string(),
            builder: builder.to_lowercase(),
            nonce,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.max_fee_rate),
            Eip712Value::Address(builder_address),
            Eip712Value::Uint64(action.nonce),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:ApproveBuilderFee",
            APPROVE_BUILDER_FEE_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::ApproveBuilderFee(action);
        self.post_action(&action, signature, nonce, None).await
    }

    /// Convert the account into a multi-sig user with the given authorized
    /// signers and threshold.
    pub async fn convert_to_multi_sig_user(
        &self,
        mut authorized_users: Vec<String>,
        threshold: u32,
    ) -> Result<ExchangeResponse> {
        authorized_users.sort();
        let signers = serde_json::to_string(&MultiSigSigners {
            authorized_users: &authorized_users,
            threshold,
        })?;
        let nonce = timestamp_ms();
        let action = ConvertToMultiSigUserAction {
            signers,
            nonce,
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            hyperliquid_chain: hyperliquid_chain(self.is_mainnet()).to_string(),
        };
        let values = [
            Eip712Value::String(&action.hyperliquid_chain),
            Eip712Value::String(&action.signers),
            Eip712Value::Uint64(action.nonce),
        ];
        let signature = signing::sign_user_signed_action(
            &*self.wallet,
            "HyperliquidTransaction:ConvertToMultiSigUser",
            CONVERT_TO_MULTI_SIG_USER_SIGN_TYPES,
            &values,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::ConvertToMultiSigUser(action);
        self.post_action(&action, signature, nonce, None).await
    }

    /// Post a multi-sig envelope: the collected participant signatures wrap
    /// the inner action, and the outer signer signs the envelope hash.
    pub async fn multi_sig(
        &self,
        multi_sig_user: Address,
        inner_action: Action,
        signatures: Vec<SignatureTriple>,
        nonce: u64,
        vault_address: Option<Address>,
    ) -> Result<ExchangeResponse> {
        let multi_sig_action = MultiSigAction {
            signature_chain_id: signature_chain_id(self.is_mainnet()).to_string(),
            signatures,
            payload: MultiSigPayload {
                multi_sig_user: address_to_hex(multi_sig_user),
                outer_signer: address_to_hex(self.wallet.address()),
                action: Box::new(inner_action),
            },
        };
        // Envelope digest covers the action with its type tag stripped:
        // the bare struct, not the tagged enum.
        let signature = signing::sign_multi_sig_envelope(
            &*self.wallet,
            &multi_sig_action,
            vault_address,
            nonce,
            self.is_mainnet(),
        )
        .await?;
        let action = Action::MultiSig(multi_sig_action);
        self.post_action(&action, signature, nonce, vault_address)
            .await
    }
}

//! StreamClient: read queries and operation building for payment streams.
//!
//! Every decision re-fetches the stream object first; nothing is cached between calls.
//! Builders validate inputs before any network call, then check authorization and
//! affordability, select funding, and return an [OperationDescriptor] for an external
//! signer. Nothing here submits.

use crate::accrual::{accrue, extension_amount, rate_per_interval, Accrual};
use crate::coin::{ensure_affordable, plan_funding, Funding};
use crate::config::{get_config, Network, NetworkConfig, SelectionConfig};
use crate::cursor::{Cursor, Page};
use crate::error::StreamError;
use crate::lifecycle::{self, Transition};
use crate::operation::{OperationDescriptor, PureValue};
use crate::record::{
    decode_capability, decode_coin_config, decode_creation_result, decode_stream_record,
    CapabilityRef, CoinConfig, StreamCreationResult, StreamDirection, StreamRecord,
};
use crate::rpc::{HttpRpc, StreamRpc};
use crate::validate::{
    ensure_field_length, ensure_nonzero_amount, ensure_valid_address, ensure_valid_coin_type,
    ensure_valid_fee_point, ensure_valid_interval, ensure_valid_object_id, ensure_valid_time,
    ensure_valid_time_range, ValidationError,
};
use alloy::primitives::U256;
use futures_util::future::try_join_all;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Max ids per `sui_multiGetObjects` request.
const MULTI_GET_LIMIT: usize = 50;

/// Page of registered coin configs.
pub type PaginatedCoinConfigs = Page<CoinConfig>;

/// Inputs of a `create` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub coin_type: String,
    pub name: String,
    pub remark: String,
    /// Payer; funding is selected from this address.
    pub sender: String,
    pub recipient: String,
    pub deposit_amount: u64,
    pub start_time: i64,
    pub stop_time: i64,
    /// Seconds per tick.
    pub interval: i64,
    pub pauseable: bool,
    pub closeable: bool,
    pub recipient_modifiable: bool,
}

impl CreateParams {
    /// One-second ticks with every feature enabled.
    pub fn new(
        coin_type: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        deposit_amount: u64,
        start_time: i64,
        stop_time: i64,
    ) -> Self {
        Self {
            coin_type: coin_type.into(),
            name: String::new(),
            remark: String::new(),
            sender: sender.into(),
            recipient: recipient.into(),
            deposit_amount,
            start_time,
            stop_time,
            interval: 1,
            pauseable: true,
            closeable: true,
            recipient_modifiable: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>, remark: impl Into<String>) -> Self {
        self.name = name.into();
        self.remark = remark.into();
        self
    }

    pub fn interval(mut self, interval: i64) -> Self {
        self.interval = interval;
        self
    }
}

/// Builder for [StreamClient].
pub struct StreamClientBuilder<R> {
    network: Option<Network>,
    network_config: Option<NetworkConfig>,
    admin_cap: Option<String>,
    selection: SelectionConfig,
    rpc: Option<R>,
}

impl<R: StreamRpc> StreamClientBuilder<R> {
    pub fn new() -> Self {
        Self {
            network: None,
            network_config: None,
            admin_cap: None,
            selection: SelectionConfig::default(),
            rpc: None,
        }
    }

    /// Use the published bundle for `network`.
    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Use an explicit bundle (takes precedence over [Self::network]).
    pub fn network_config(mut self, config: NetworkConfig) -> Self {
        self.network_config = Some(config);
        self
    }

    pub fn admin_cap(mut self, id: impl Into<String>) -> Self {
        self.admin_cap = Some(id.into());
        self
    }

    pub fn page_limit(mut self, limit: u32) -> Self {
        self.selection.page_limit = limit.max(1);
        self
    }

    pub fn rpc(mut self, rpc: R) -> Self {
        self.rpc = Some(rpc);
        self
    }

    pub fn build(self) -> Result<StreamClient<R>, StreamError> {
        let mut config = match (self.network_config, self.network) {
            (Some(c), _) => c,
            (None, Some(n)) => get_config(n)?,
            (None, None) => return Err(StreamError::Config("network required".into())),
        };
        if let Some(cap) = self.admin_cap {
            config.admin_cap_id = Some(ensure_valid_object_id(&cap)?);
        }
        let rpc = self
            .rpc
            .ok_or_else(|| StreamError::Config("rpc required".into()))?;
        Ok(StreamClient {
            rpc,
            config,
            selection: self.selection,
        })
    }
}

impl<R: StreamRpc> Default for StreamClientBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Client for one network.
pub struct StreamClient<R> {
    rpc: R,
    config: NetworkConfig,
    selection: SelectionConfig,
}

impl StreamClient<HttpRpc> {
    /// Client talking JSON-RPC to the network's full node.
    pub fn connect(network: Network) -> Result<Self, StreamError> {
        let config = get_config(network)?;
        let rpc = HttpRpc::new(config.full_node_url.clone())?;
        StreamClientBuilder::new()
            .network_config(config)
            .rpc(rpc)
            .build()
    }
}

impl<R: StreamRpc> StreamClient<R> {
    pub fn builder() -> StreamClientBuilder<R> {
        StreamClientBuilder::new()
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    // ---- queries ----

    /// Fresh snapshot of one stream.
    pub async fn get_stream(&self, stream_id: &str) -> Result<StreamRecord, StreamError> {
        let id = ensure_valid_object_id(stream_id)?;
        let object = self.rpc.fetch_object(&id).await?;
        decode_stream_record(&object)
    }

    /// Streams an address sends (`Out`) or receives (`In`), found through its capabilities.
    pub async fn get_streams(
        &self,
        address: &str,
        direction: StreamDirection,
    ) -> Result<Vec<StreamRecord>, StreamError> {
        let caps = self.capabilities(address, direction).await?;
        let ids: Vec<String> = caps.into_iter().map(|c| c.stream_id).collect();
        let batches = try_join_all(
            ids.chunks(MULTI_GET_LIMIT)
                .map(|chunk| self.rpc.fetch_objects(chunk)),
        )
        .await?;
        let records = batches
            .iter()
            .flatten()
            .map(decode_stream_record)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(address, ?direction, count = records.len(), "fetched streams");
        Ok(records)
    }

    /// Incoming and outgoing streams, fetched concurrently.
    pub async fn get_all_streams(
        &self,
        address: &str,
    ) -> Result<(Vec<StreamRecord>, Vec<StreamRecord>), StreamError> {
        tokio::try_join!(
            self.get_streams(address, StreamDirection::In),
            self.get_streams(address, StreamDirection::Out),
        )
    }

    pub async fn sender_caps(&self, owner: &str) -> Result<Vec<CapabilityRef>, StreamError> {
        self.capabilities(owner, StreamDirection::Out).await
    }

    pub async fn recipient_caps(&self, owner: &str) -> Result<Vec<CapabilityRef>, StreamError> {
        self.capabilities(owner, StreamDirection::In).await
    }

    async fn capabilities(
        &self,
        owner: &str,
        direction: StreamDirection,
    ) -> Result<Vec<CapabilityRef>, StreamError> {
        let owner = ensure_valid_address(owner)?;
        let cap_type = match direction {
            StreamDirection::Out => self.config.sender_cap_type(),
            StreamDirection::In => self.config.recipient_cap_type(),
        };
        let mut caps = Vec::new();
        let mut cursor = Cursor::start();
        while !cursor.is_exhausted() {
            let page = self
                .rpc
                .fetch_owned_objects(&owner, &cap_type, cursor.position())
                .await?;
            cursor.advance(&page);
            for object in &page.data {
                caps.push(decode_capability(object)?);
            }
        }
        Ok(caps)
    }

    /// One page of registered coin configs; pass the previous page's cursor to continue.
    pub async fn get_coin_configs(
        &self,
        cursor: Option<&str>,
    ) -> Result<PaginatedCoinConfigs, StreamError> {
        let page = self
            .rpc
            .fetch_dynamic_fields(&self.config.global_config_id, cursor)
            .await?;
        let objects = self.rpc.fetch_objects(&page.data).await?;
        let data = objects
            .iter()
            .map(decode_coin_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            data,
            next_cursor: page.next_cursor,
            has_next_page: page.has_next_page,
        })
    }

    /// Net amount claimable from `stream_id` at `now`.
    pub async fn withdrawable(&self, stream_id: &str, now: u64) -> Result<U256, StreamError> {
        Ok(self.accrual(stream_id, now).await?.net())
    }

    pub async fn accrual(&self, stream_id: &str, now: u64) -> Result<Accrual, StreamError> {
        let record = self.get_stream(stream_id).await?;
        Ok(accrue(&record, now))
    }

    /// Predicted snapshot if `caller` performed `transition` at `now`.
    pub async fn preview(
        &self,
        stream_id: &str,
        transition: &Transition,
        caller: &str,
        now: u64,
    ) -> Result<StreamRecord, StreamError> {
        let record = self.get_stream(stream_id).await?;
        lifecycle::apply(&record, transition, caller, now)
    }

    /// Ids created by a submitted `create` operation.
    pub fn creation_result(&self, response: &Value) -> Result<StreamCreationResult, StreamError> {
        decode_creation_result(response)
    }

    // ---- operation builders ----

    pub async fn create(&self, params: &CreateParams) -> Result<OperationDescriptor, StreamError> {
        ensure_valid_coin_type(&params.coin_type)?;
        ensure_field_length("name", &params.name)?;
        ensure_field_length("remark", &params.remark)?;
        let sender = ensure_valid_address(&params.sender)?;
        let recipient = ensure_valid_address(&params.recipient)?;
        let deposit = ensure_nonzero_amount(params.deposit_amount)?;
        let (start, stop) = ensure_valid_time_range(params.start_time, params.stop_time)?;
        let interval = ensure_valid_interval(params.interval)?;
        // A stream shorter than one tick could never unlock anything.
        rate_per_interval(deposit, start, stop, interval)?;

        let funding = self.fund(&sender, &params.coin_type, deposit).await?;
        let op = OperationDescriptor::call(self.config.entry_point("create"))
            .type_arg(&params.coin_type)
            .object(&self.config.global_config_id)
            .funded_by(funding)
            .pure_string(&params.name)
            .pure_string(&params.remark)
            .pure_address(recipient)
            .pure_u64(deposit)
            .pure_u64(start)
            .pure_u64(stop)
            .pure_u64(interval)
            .pure_bool(params.pauseable)
            .pure_bool(params.closeable)
            .pure_bool(params.recipient_modifiable)
            .object(&self.config.clock_id);
        tracing::info!(
            coin_type = %params.coin_type,
            deposit,
            start,
            stop,
            interval,
            "built create operation"
        );
        Ok(op)
    }

    /// Move the stop time later; the caller funds the added intervals.
    pub async fn extend(
        &self,
        caller: &str,
        sender_cap: &str,
        stream_id: &str,
        new_stop_time: i64,
    ) -> Result<OperationDescriptor, StreamError> {
        let caller = ensure_valid_address(caller)?;
        let sender_cap = ensure_valid_object_id(sender_cap)?;
        let new_stop_time = ensure_valid_time(new_stop_time)?;
        let record = self.get_stream(stream_id).await?;
        lifecycle::authorize(&record, &Transition::Extend { new_stop_time }, &caller)?;

        let added = extension_amount(&record, new_stop_time)?;
        if added.is_zero() {
            return Err(ValidationError::ZeroAmount.into());
        }
        let amount = u64::try_from(added).map_err(|_| StreamError::Overflow("extension amount"))?;
        let funding = self.fund(&caller, &record.coin_type, amount).await?;
        let op = OperationDescriptor::call(self.config.entry_point("extend"))
            .type_arg(&record.coin_type)
            .object(&self.config.global_config_id)
            .object(sender_cap)
            .object(&record.id)
            .funded_by(funding)
            .pure_u64(new_stop_time)
            .object(&self.config.clock_id);
        tracing::info!(stream = %record.id, new_stop_time, amount, "built extend operation");
        Ok(op)
    }

    pub async fn pause(
        &self,
        caller: &str,
        sender_cap: &str,
        stream_id: &str,
    ) -> Result<OperationDescriptor, StreamError> {
        self.sender_operation(caller, sender_cap, stream_id, Transition::Pause, "pause")
            .await
    }

    pub async fn resume(
        &self,
        caller: &str,
        sender_cap: &str,
        stream_id: &str,
    ) -> Result<OperationDescriptor, StreamError> {
        self.sender_operation(caller, sender_cap, stream_id, Transition::Resume, "resume")
            .await
    }

    pub async fn close(
        &self,
        caller: &str,
        sender_cap: &str,
        stream_id: &str,
    ) -> Result<OperationDescriptor, StreamError> {
        self.sender_operation(caller, sender_cap, stream_id, Transition::Close, "close")
            .await
    }

    async fn sender_operation(
        &self,
        caller: &str,
        sender_cap: &str,
        stream_id: &str,
        transition: Transition,
        entry: &str,
    ) -> Result<OperationDescriptor, StreamError> {
        let caller = ensure_valid_address(caller)?;
        let sender_cap = ensure_valid_object_id(sender_cap)?;
        let record = self.get_stream(stream_id).await?;
        lifecycle::authorize(&record, &transition, &caller)?;
        tracing::info!(stream = %record.id, entry, "built sender operation");
        Ok(OperationDescriptor::call(self.config.entry_point(entry))
            .type_arg(&record.coin_type)
            .object(&self.config.global_config_id)
            .object(sender_cap)
            .object(&record.id)
            .object(&self.config.clock_id))
    }

    /// Pay out the accrued amount to the recipient. Anyone may trigger it.
    pub async fn withdraw(&self, stream_id: &str) -> Result<OperationDescriptor, StreamError> {
        let record = self.get_stream(stream_id).await?;
        lifecycle::authorize(&record, &Transition::Withdraw, "")?;
        tracing::info!(stream = %record.id, "built withdraw operation");
        Ok(OperationDescriptor::call(self.config.entry_point("withdraw"))
            .type_arg(&record.coin_type)
            .object(&self.config.global_config_id)
            .object(&record.id)
            .object(&self.config.clock_id))
    }

    pub async fn set_new_recipient(
        &self,
        caller: &str,
        recipient_cap: &str,
        stream_id: &str,
        new_recipient: &str,
    ) -> Result<OperationDescriptor, StreamError> {
        let caller = ensure_valid_address(caller)?;
        let recipient_cap = ensure_valid_object_id(recipient_cap)?;
        let new_recipient = ensure_valid_address(new_recipient)?;
        let record = self.get_stream(stream_id).await?;
        let transition = Transition::SetNewRecipient {
            recipient: new_recipient.clone(),
        };
        lifecycle::authorize(&record, &transition, &caller)?;
        tracing::info!(stream = %record.id, new_recipient = %new_recipient, "built set_new_recipient operation");
        Ok(OperationDescriptor::call(self.config.entry_point("set_new_recipient"))
            .type_arg(&record.coin_type)
            .object(&self.config.global_config_id)
            .object(recipient_cap)
            .object(&record.id)
            .pure_address(new_recipient))
    }

    // ---- admin operations ----

    pub fn register_coin(
        &self,
        coin_type: &str,
        fee_point: i64,
    ) -> Result<OperationDescriptor, StreamError> {
        self.fee_point_operation("register_coin", coin_type, fee_point)
    }

    pub fn set_fee_point(
        &self,
        coin_type: &str,
        fee_point: i64,
    ) -> Result<OperationDescriptor, StreamError> {
        self.fee_point_operation("set_fee_point", coin_type, fee_point)
    }

    fn fee_point_operation(
        &self,
        entry: &str,
        coin_type: &str,
        fee_point: i64,
    ) -> Result<OperationDescriptor, StreamError> {
        ensure_valid_coin_type(coin_type)?;
        let fee_point = ensure_valid_fee_point(fee_point)?;
        let admin_cap = self.admin_cap()?;
        tracing::info!(coin_type, fee_point, entry, "built admin operation");
        Ok(OperationDescriptor::call(self.config.entry_point(entry))
            .type_arg(coin_type)
            .object(admin_cap)
            .object(&self.config.global_config_id)
            .pure(PureValue::U8(fee_point)))
    }

    pub fn set_fee_recipient(&self, new_recipient: &str) -> Result<OperationDescriptor, StreamError> {
        let new_recipient = ensure_valid_address(new_recipient)?;
        let admin_cap = self.admin_cap()?;
        tracing::info!(new_recipient = %new_recipient, "built set_fee_recipient operation");
        Ok(OperationDescriptor::call(self.config.entry_point("set_fee_recipient"))
            .object(admin_cap)
            .object(&self.config.global_config_id)
            .pure_address(new_recipient))
    }

    fn admin_cap(&self) -> Result<&str, StreamError> {
        self.config
            .admin_cap_id
            .as_deref()
            .ok_or_else(|| StreamError::Config("admin capability not configured".into()))
    }

    /// Affordability check, then funding selection for `owner`.
    async fn fund(
        &self,
        owner: &str,
        coin_type: &str,
        amount: u64,
    ) -> Result<Funding, StreamError> {
        let native = self.config.is_native(coin_type);
        let balance = self.rpc.fetch_balance(owner, coin_type).await?;
        ensure_affordable(&balance, coin_type, amount, native)?;
        plan_funding(&self.rpc, owner, coin_type, amount, native, &self.selection).await
    }
}

/// Current wall-clock time in unix seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

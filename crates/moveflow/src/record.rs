//! Stream data model and projection from JSON-RPC object shapes.
//!
//! Decodes `sui_getObject` content into [StreamRecord], coin pages into [FundUnit]s and
//! a submission response's `objectChanges` into a [StreamCreationResult].

use crate::config::STREAM_MODULE;
use crate::error::StreamError;
use crate::validate::normalize_coin_type;
use alloy::primitives::U256;
use serde_json::Value;

/// Capability flags fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureInfo {
    pub pauseable: bool,
    pub sender_closeable: bool,
    pub recipient_modifiable: bool,
}

/// Protocol fee applied to every withdrawal. `fee_point` is in ten-thousandths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeInfo {
    pub fee_recipient: String,
    pub fee_point: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PauseInfo {
    pub paused: bool,
    /// When the current pause began (unix seconds). Meaningless unless `paused`.
    pub paused_at: u64,
    /// Total paused seconds since the last withdrawal.
    pub acc_paused_time: u64,
}

/// Snapshot of an on-chain stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub id: String,
    pub coin_type: String,
    pub name: String,
    pub remark: String,
    pub sender: String,
    pub recipient: String,
    /// Seconds per accrual tick.
    pub interval: u64,
    /// Units unlocked per interval, scaled by 1000.
    pub rate_per_interval: U256,
    pub last_withdraw_time: u64,
    pub start_time: u64,
    pub stop_time: u64,
    pub deposit_amount: U256,
    pub withdrawn_amount: U256,
    pub remaining_amount: U256,
    /// Funds still held by the stream object.
    pub balance: U256,
    pub closed: bool,
    pub feature_info: FeatureInfo,
    pub fee_info: FeeInfo,
    pub pause_info: PauseInfo,
}

/// A spendable coin object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundUnit {
    pub id: String,
    pub balance: U256,
    pub locked: bool,
}

/// Owner balance for one coin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub total: U256,
    pub locked: U256,
}

impl Balance {
    pub fn available(&self) -> U256 {
        self.total.saturating_sub(self.locked)
    }
}

/// Admin-registered coin type and its fee rate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinConfig {
    pub coin_type: String,
    pub fee_point: u8,
}

/// An owned sender or recipient capability and the stream it governs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRef {
    pub cap_id: String,
    pub stream_id: String,
}

/// Which side of a stream an address is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Streams paying the address (recipient capabilities).
    In,
    /// Streams funded by the address (sender capabilities).
    Out,
}

/// Objects created by a successful `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamCreationResult {
    pub stream_id: String,
    pub sender_cap: String,
    pub recipient_cap: String,
}

/// Project a `sui_getObject` result (with content) into a [StreamRecord].
pub fn decode_stream_record(object: &Value) -> Result<StreamRecord, StreamError> {
    if let Some(err) = object.get("error") {
        return Err(StreamError::Rpc(format!("object unavailable: {}", err)));
    }
    let data = object.get("data").unwrap_or(object);
    let object_type = data
        .get("type")
        .or_else(|| data.get("content").and_then(|c| c.get("type")))
        .and_then(Value::as_str)
        .ok_or_else(|| StreamError::decode("Missing object type"))?;
    let coin_type = type_argument(object_type)
        .map(|t| normalize_coin_type(&t))
        .ok_or_else(|| StreamError::decode(format!("no coin type in {}", object_type)))?;
    let fields = data
        .get("content")
        .and_then(|c| c.get("fields"))
        .ok_or_else(|| StreamError::decode("Missing content.fields"))?;

    let id = match fields.get("id").and_then(|i| i.get("id")).and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => str_field(data, "objectId")?,
    };
    let deposit_amount = u256_field(fields, "deposit_amount")?;
    let remaining_amount = u256_field(fields, "remaining_amount")?;
    let withdrawn_amount = match fields.get("withdrawn_amount") {
        Some(v) => as_u256(v, "withdrawn_amount")?,
        None => deposit_amount.checked_sub(remaining_amount).ok_or_else(|| {
            StreamError::decode(format!(
                "remaining_amount {} exceeds deposit_amount {}",
                remaining_amount, deposit_amount
            ))
        })?,
    };

    let feature = struct_fields(field(fields, "feature_info")?);
    let fee = struct_fields(field(fields, "fee_info")?);
    let pause = struct_fields(field(fields, "pause_info")?);
    let fee_point = u64_field(fee, "fee_point")?;

    let record = StreamRecord {
        id,
        coin_type,
        name: str_field(fields, "name")?,
        remark: str_field(fields, "remark")?,
        sender: str_field(fields, "sender")?,
        recipient: str_field(fields, "recipient")?,
        interval: u64_field(fields, "interval")?,
        rate_per_interval: u256_field(fields, "rate_per_interval")?,
        last_withdraw_time: u64_field(fields, "last_withdraw_time")?,
        start_time: u64_field(fields, "start_time")?,
        stop_time: u64_field(fields, "stop_time")?,
        deposit_amount,
        withdrawn_amount,
        remaining_amount,
        balance: u256_field(fields, "balance")?,
        closed: bool_field(fields, "closed")?,
        feature_info: FeatureInfo {
            pauseable: bool_field(feature, "pauseable")?,
            sender_closeable: bool_field(feature, "sender_closeable")?,
            recipient_modifiable: bool_field(feature, "recipient_modifiable")?,
        },
        fee_info: FeeInfo {
            fee_recipient: str_field(fee, "fee_recipient")?,
            fee_point: u8::try_from(fee_point)
                .map_err(|_| StreamError::decode(format!("fee_point {} out of range", fee_point)))?,
        },
        pause_info: PauseInfo {
            paused: bool_field(pause, "paused")?,
            paused_at: u64_field(pause, "pause_at")?,
            acc_paused_time: u64_field(pause, "acc_paused_time")?,
        },
    };

    if record.interval == 0 {
        return Err(StreamError::decode(format!("stream {} has zero interval", record.id)));
    }
    if record.start_time >= record.stop_time {
        return Err(StreamError::decode(format!(
            "stream {} has start_time {} not before stop_time {}",
            record.id, record.start_time, record.stop_time
        )));
    }
    Ok(record)
}

/// Decode one `suix_getCoins` entry.
pub fn decode_fund_unit(coin: &Value) -> Result<FundUnit, StreamError> {
    Ok(FundUnit {
        id: str_field(coin, "coinObjectId")?,
        balance: u256_field(coin, "balance")?,
        locked: coin
            .get("lockedUntilEpoch")
            .map(|v| !v.is_null())
            .unwrap_or(false),
    })
}

/// Decode a `suix_getBalance` result. Locked amounts are summed across epochs.
pub fn decode_balance(result: &Value) -> Result<Balance, StreamError> {
    let total = u256_field(result, "totalBalance")?;
    let mut locked = U256::ZERO;
    if let Some(map) = result.get("lockedBalance").and_then(Value::as_object) {
        for (epoch, amount) in map {
            locked = locked
                .checked_add(as_u256(amount, epoch)?)
                .ok_or(StreamError::Overflow("locked balance"))?;
        }
    }
    Ok(Balance { total, locked })
}

/// Decode an owned capability object into `(cap_id, stream_id)`.
pub fn decode_capability(object: &Value) -> Result<CapabilityRef, StreamError> {
    let data = object.get("data").unwrap_or(object);
    let fields = data
        .get("content")
        .and_then(|c| c.get("fields"))
        .ok_or_else(|| StreamError::decode("capability without content.fields"))?;
    Ok(CapabilityRef {
        cap_id: str_field(data, "objectId")?,
        stream_id: str_field(fields, "stream_id")?,
    })
}

/// Decode a coin config dynamic field object (`name` = coin type, `value` = config).
pub fn decode_coin_config(object: &Value) -> Result<CoinConfig, StreamError> {
    let data = object.get("data").unwrap_or(object);
    let fields = data
        .get("content")
        .and_then(|c| c.get("fields"))
        .ok_or_else(|| StreamError::decode("coin config without content.fields"))?;
    let value = struct_fields(field(fields, "value")?);
    let coin_type = match value.get("coin_type") {
        Some(v) => type_name(v)?,
        None => type_name(field(fields, "name")?)?,
    };
    let fee_point = u64_field(value, "fee_point")?;
    Ok(CoinConfig {
        coin_type,
        fee_point: u8::try_from(fee_point)
            .map_err(|_| StreamError::decode(format!("fee_point {} out of range", fee_point)))?,
    })
}

/// Pull the stream id and both capability ids out of a create response.
pub fn decode_creation_result(response: &Value) -> Result<StreamCreationResult, StreamError> {
    let changes = match response.get("objectChanges").and_then(Value::as_array) {
        Some(c) if !c.is_empty() => c,
        _ => return Err(StreamError::MissingObjectChanges),
    };
    let find = |kind: &str| {
        let needle = format!("::{}::{}", STREAM_MODULE, kind);
        changes
            .iter()
            .filter(|c| c.get("type").and_then(Value::as_str) == Some("created"))
            .find(|c| {
                c.get("objectType")
                    .and_then(Value::as_str)
                    .map(|t| t.contains(&needle))
                    .unwrap_or(false)
            })
            .and_then(|c| c.get("objectId").and_then(Value::as_str))
            .map(str::to_string)
    };
    Ok(StreamCreationResult {
        stream_id: find("StreamInfo").ok_or(StreamError::MissingCreatedObject("stream"))?,
        sender_cap: find("SenderCap").ok_or(StreamError::MissingCreatedObject("sender capability"))?,
        recipient_cap: find("RecipientCap")
            .ok_or(StreamError::MissingCreatedObject("recipient capability"))?,
    })
}

/// `0xpkg::stream::StreamInfo<0x2::sui::SUI>` -> `0x2::sui::SUI`.
pub fn type_argument(object_type: &str) -> Option<String> {
    let open = object_type.find('<')?;
    let close = object_type.rfind('>')?;
    if close <= open + 1 {
        return None;
    }
    Some(object_type[open + 1..close].trim().to_string())
}

/// Move nested structs render as `{ "type": .., "fields": {..} }`; plain objects pass through.
fn struct_fields(v: &Value) -> &Value {
    v.get("fields").unwrap_or(v)
}

/// A `TypeName` renders either as a plain string or as `{ fields: { name } }`.
fn type_name(v: &Value) -> Result<String, StreamError> {
    if let Some(s) = v.as_str() {
        return Ok(s.to_string());
    }
    str_field(struct_fields(v), "name")
}

fn field<'a>(obj: &'a Value, key: &str) -> Result<&'a Value, StreamError> {
    obj.get(key)
        .ok_or_else(|| StreamError::decode(format!("Missing {}", key)))
}

fn str_field(obj: &Value, key: &str) -> Result<String, StreamError> {
    field(obj, key)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StreamError::decode(format!("{} not a string", key)))
}

fn bool_field(obj: &Value, key: &str) -> Result<bool, StreamError> {
    field(obj, key)?
        .as_bool()
        .ok_or_else(|| StreamError::decode(format!("{} not a bool", key)))
}

fn u64_field(obj: &Value, key: &str) -> Result<u64, StreamError> {
    as_u64(field(obj, key)?, key)
}

fn u256_field(obj: &Value, key: &str) -> Result<U256, StreamError> {
    as_u256(field(obj, key)?, key)
}

/// u64 values arrive as decimal strings; small ones sometimes as JSON numbers.
fn as_u64(v: &Value, key: &str) -> Result<u64, StreamError> {
    match v {
        Value::String(s) => s
            .parse::<u64>()
            .map_err(|e| StreamError::decode(format!("{}: {}", key, e))),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| StreamError::decode(format!("{} not an unsigned integer", key))),
        _ => Err(StreamError::decode(format!("{} not numeric", key))),
    }
}

fn as_u256(v: &Value, key: &str) -> Result<U256, StreamError> {
    match v {
        Value::String(s) => crate::validate::parse_amount(s)
            .map_err(|e| StreamError::decode(format!("{}: {}", key, e))),
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| StreamError::decode(format!("{} not an unsigned integer", key))),
        _ => Err(StreamError::decode(format!("{} not numeric", key))),
    }
}

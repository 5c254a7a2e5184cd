//! Common helpers for integration tests: an in-memory full node.

#![allow(dead_code)]

use moveflow::validate::{normalize_address, normalize_coin_type};
use moveflow::{
    Balance, FeatureInfo, FeeInfo, FundUnit, Page, PauseInfo, StreamClient, StreamError,
    StreamRecord, StreamRpc, U256,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const PACKAGE: &str = "0xd4a8b17cbc665b5a92311e14cdb24de7abbfae9d9616babdd5f9f732a2987311";
pub const SUI: &str = "0x2::sui::SUI";
/// `SUI` with its address written out in full.
pub const LONG_SUI: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000002::sui::SUI";
pub const USDC: &str = "0x5d4b::usdc::USDC";
pub const ADMIN_CAP: &str = "0xad";

/// Full-length hex id from a short tag, e.g. `id(0xa)`.
pub fn id(n: u64) -> String {
    format!("0x{:064x}", n)
}

pub fn sender() -> String {
    id(0xa)
}

pub fn recipient() -> String {
    id(0xb)
}

pub fn stream_id() -> String {
    id(0x5)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("moveflow=debug".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

/// In-memory full node answering the [StreamRpc] queries.
#[derive(Default)]
pub struct MockRpc {
    balances: Mutex<HashMap<(String, String), Balance>>,
    coin_pages: Mutex<HashMap<(String, String), Vec<Vec<FundUnit>>>>,
    objects: Mutex<HashMap<String, Value>>,
    owned: Mutex<HashMap<(String, String), Vec<Value>>>,
    dynamic_fields: Mutex<HashMap<String, Vec<String>>>,
    pub coin_page_fetches: AtomicUsize,
    pub object_fetches: AtomicUsize,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, owner: &str, coin_type: &str, total: u64, locked: u64) {
        self.balances.lock().unwrap().insert(
            (normalize_address(owner), normalize_coin_type(coin_type)),
            Balance {
                total: U256::from(total),
                locked: U256::from(locked),
            },
        );
    }

    /// Coins as pages of `(balance, locked)`; ids are assigned `0xc0..` in order.
    pub fn set_coin_pages(&self, owner: &str, coin_type: &str, pages: &[&[(u64, bool)]]) {
        let mut n = 0xc0u64;
        let pages = pages
            .iter()
            .map(|page| {
                page.iter()
                    .map(|(balance, locked)| {
                        n += 1;
                        FundUnit {
                            id: id(n),
                            balance: U256::from(*balance),
                            locked: *locked,
                        }
                    })
                    .collect()
            })
            .collect();
        self.coin_pages
            .lock()
            .unwrap()
            .insert((normalize_address(owner), normalize_coin_type(coin_type)), pages);
    }

    pub fn put_stream(&self, record: &StreamRecord) {
        self.objects
            .lock()
            .unwrap()
            .insert(normalize_address(&record.id), stream_object(record));
    }

    pub fn put_object(&self, object_id: &str, object: Value) {
        self.objects
            .lock()
            .unwrap()
            .insert(normalize_address(object_id), object);
    }

    pub fn own(&self, owner: &str, struct_type: &str, object: Value) {
        self.owned
            .lock()
            .unwrap()
            .entry((normalize_address(owner), struct_type.to_string()))
            .or_default()
            .push(object);
    }

    pub fn add_dynamic_field(&self, parent: &str, object_id: &str) {
        self.dynamic_fields
            .lock()
            .unwrap()
            .entry(normalize_address(parent))
            .or_default()
            .push(object_id.to_string());
    }

    fn object(&self, object_id: &str) -> Value {
        self.object_fetches.fetch_add(1, Ordering::SeqCst);
        self.objects
            .lock()
            .unwrap()
            .get(&normalize_address(object_id))
            .cloned()
            .unwrap_or_else(|| json!({ "error": { "code": "notExists", "object_id": object_id } }))
    }
}

impl StreamRpc for MockRpc {
    async fn fetch_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, StreamError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(normalize_address(owner), normalize_coin_type(coin_type)))
            .copied()
            .unwrap_or_default())
    }

    async fn fetch_fund_units(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
        _limit: u32,
    ) -> Result<Page<FundUnit>, StreamError> {
        self.coin_page_fetches.fetch_add(1, Ordering::SeqCst);
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| StreamError::Rpc(format!("bad cursor {}", c)))?,
        };
        let pages = self.coin_pages.lock().unwrap();
        let pages = pages
            .get(&(normalize_address(owner), normalize_coin_type(coin_type)))
            .cloned()
            .unwrap_or_default();
        let data = pages.get(index).cloned().unwrap_or_default();
        let has_next_page = index + 1 < pages.len();
        Ok(Page {
            data,
            next_cursor: has_next_page.then(|| format!("page-{}", index + 1)),
            has_next_page,
        })
    }

    async fn fetch_object(&self, object_id: &str) -> Result<Value, StreamError> {
        Ok(self.object(object_id))
    }

    async fn fetch_objects(&self, ids: &[String]) -> Result<Vec<Value>, StreamError> {
        Ok(ids.iter().map(|i| self.object(i)).collect())
    }

    async fn fetch_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        _cursor: Option<&str>,
    ) -> Result<Page<Value>, StreamError> {
        let data = self
            .owned
            .lock()
            .unwrap()
            .get(&(normalize_address(owner), struct_type.to_string()))
            .cloned()
            .unwrap_or_default();
        Ok(Page::last(data))
    }

    async fn fetch_dynamic_fields(
        &self,
        parent: &str,
        _cursor: Option<&str>,
    ) -> Result<Page<String>, StreamError> {
        let data = self
            .dynamic_fields
            .lock()
            .unwrap()
            .get(&normalize_address(parent))
            .cloned()
            .unwrap_or_default();
        Ok(Page::last(data))
    }
}

pub fn client(rpc: MockRpc) -> StreamClient<MockRpc> {
    StreamClient::builder()
        .network(moveflow::Network::Testnet)
        .admin_cap(ADMIN_CAP)
        .page_limit(2)
        .rpc(rpc)
        .build()
        .expect("build client")
}

/// Active SUI stream: 10_000_000 over one day from `start`, one-second ticks, fee 25.
/// The coin type is in the long form a full node reports.
pub fn stream_record(start: u64) -> StreamRecord {
    StreamRecord {
        id: stream_id(),
        coin_type: LONG_SUI.to_string(),
        name: "first".into(),
        remark: "first sui stream".into(),
        sender: sender(),
        recipient: recipient(),
        interval: 1,
        rate_per_interval: U256::from(115_740u64),
        last_withdraw_time: start,
        start_time: start,
        stop_time: start + 86_400,
        deposit_amount: U256::from(10_000_000u64),
        withdrawn_amount: U256::ZERO,
        remaining_amount: U256::from(10_000_000u64),
        balance: U256::from(10_000_000u64),
        closed: false,
        feature_info: FeatureInfo {
            pauseable: true,
            sender_closeable: true,
            recipient_modifiable: true,
        },
        fee_info: FeeInfo {
            fee_recipient: id(0xfee),
            fee_point: 25,
        },
        pause_info: PauseInfo::default(),
    }
}

/// Render a record the way `sui_getObject` shows a `StreamInfo<T>`.
pub fn stream_object(r: &StreamRecord) -> Value {
    let object_type = format!("{}::stream::StreamInfo<{}>", PACKAGE, r.coin_type);
    json!({
        "data": {
            "objectId": r.id,
            "type": object_type,
            "content": {
                "dataType": "moveObject",
                "type": object_type,
                "fields": {
                    "id": { "id": r.id },
                    "name": r.name,
                    "remark": r.remark,
                    "sender": r.sender,
                    "recipient": r.recipient,
                    "interval": r.interval.to_string(),
                    "rate_per_interval": r.rate_per_interval.to_string(),
                    "last_withdraw_time": r.last_withdraw_time.to_string(),
                    "start_time": r.start_time.to_string(),
                    "stop_time": r.stop_time.to_string(),
                    "deposit_amount": r.deposit_amount.to_string(),
                    "withdrawn_amount": r.withdrawn_amount.to_string(),
                    "remaining_amount": r.remaining_amount.to_string(),
                    "balance": r.balance.to_string(),
                    "closed": r.closed,
                    "feature_info": { "fields": {
                        "pauseable": r.feature_info.pauseable,
                        "sender_closeable": r.feature_info.sender_closeable,
                        "recipient_modifiable": r.feature_info.recipient_modifiable
                    } },
                    "fee_info": { "fields": {
                        "fee_recipient": r.fee_info.fee_recipient,
                        "fee_point": r.fee_info.fee_point
                    } },
                    "pause_info": { "fields": {
                        "paused": r.pause_info.paused,
                        "pause_at": r.pause_info.paused_at.to_string(),
                        "acc_paused_time": r.pause_info.acc_paused_time.to_string()
                    } }
                }
            }
        }
    })
}

/// Owned capability object pointing at `stream`.
pub fn capability_object(cap_id: &str, kind: &str, stream: &str) -> Value {
    json!({
        "data": {
            "objectId": cap_id,
            "type": format!("{}::stream::{}", PACKAGE, kind),
            "content": { "fields": { "id": { "id": cap_id }, "stream_id": stream } }
        }
    })
}

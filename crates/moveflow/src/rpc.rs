//! Full-node access: the [StreamRpc] seam and its JSON-RPC over HTTP implementation.
//!
//! Results are returned raw (objects) or lightly decoded (balances, coins, pages); mapping
//! into stream types happens in [crate::record]. No retries here: failures propagate.

use crate::cursor::Page;
use crate::error::StreamError;
use crate::record::{decode_balance, decode_fund_unit, Balance, FundUnit};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read access to chain state needed by the stream client.
pub trait StreamRpc: Send + Sync {
    fn fetch_balance(
        &self,
        owner: &str,
        coin_type: &str,
    ) -> impl Future<Output = Result<Balance, StreamError>> + Send;

    /// One page of the owner's coins of `coin_type`.
    fn fetch_fund_units(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> impl Future<Output = Result<Page<FundUnit>, StreamError>> + Send;

    /// Object with type and content.
    fn fetch_object(&self, id: &str) -> impl Future<Output = Result<Value, StreamError>> + Send;

    /// Objects with type and content, in the order of `ids`.
    fn fetch_objects(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<Value>, StreamError>> + Send;

    /// One page of objects of `struct_type` owned by `owner`.
    fn fetch_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<Page<Value>, StreamError>> + Send;

    /// One page of dynamic field object ids under `parent`.
    fn fetch_dynamic_fields(
        &self,
        parent: &str,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<Page<String>, StreamError>> + Send;
}

fn object_options() -> Value {
    json!({ "showType": true, "showContent": true })
}

/// JSON-RPC 2.0 over HTTP.
pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(url: impl Into<String>) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, StreamError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        tracing::trace!(method, id, "rpc request");
        let resp = self.client.post(&self.url).json(&body).send().await?;
        let json: Value = resp.json().await?;
        if let Some(err) = json.get("error") {
            return Err(StreamError::Rpc(format!("{}: {}", method, err)));
        }
        json.get("result")
            .cloned()
            .ok_or_else(|| StreamError::decode(format!("{}: missing result", method)))
    }
}

impl StreamRpc for HttpRpc {
    async fn fetch_balance(&self, owner: &str, coin_type: &str) -> Result<Balance, StreamError> {
        let result = self
            .call("suix_getBalance", json!([owner, coin_type]))
            .await?;
        decode_balance(&result)
    }

    async fn fetch_fund_units(
        &self,
        owner: &str,
        coin_type: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<Page<FundUnit>, StreamError> {
        let result = self
            .call("suix_getCoins", json!([owner, coin_type, cursor, limit]))
            .await?;
        decode_page(&result, decode_fund_unit)
    }

    async fn fetch_object(&self, id: &str) -> Result<Value, StreamError> {
        self.call("sui_getObject", json!([id, object_options()]))
            .await
    }

    async fn fetch_objects(&self, ids: &[String]) -> Result<Vec<Value>, StreamError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let result = self
            .call("sui_multiGetObjects", json!([ids, object_options()]))
            .await?;
        result
            .as_array()
            .cloned()
            .ok_or_else(|| StreamError::decode("multiGetObjects not array"))
    }

    async fn fetch_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        cursor: Option<&str>,
    ) -> Result<Page<Value>, StreamError> {
        let query = json!({
            "filter": { "StructType": struct_type },
            "options": object_options(),
        });
        let result = self
            .call("suix_getOwnedObjects", json!([owner, query, cursor, Value::Null]))
            .await?;
        decode_page(&result, |v| Ok(v.clone()))
    }

    async fn fetch_dynamic_fields(
        &self,
        parent: &str,
        cursor: Option<&str>,
    ) -> Result<Page<String>, StreamError> {
        let result = self
            .call("suix_getDynamicFields", json!([parent, cursor, Value::Null]))
            .await?;
        decode_page(&result, |v| {
            v.get("objectId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| StreamError::decode("dynamic field without objectId"))
        })
    }
}

/// Decode the `{ data, nextCursor, hasNextPage }` envelope shared by paginated methods.
pub fn decode_page<T>(
    result: &Value,
    decode: impl Fn(&Value) -> Result<T, StreamError>,
) -> Result<Page<T>, StreamError> {
    let data = result
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| StreamError::decode("page without data"))?
        .iter()
        .map(decode)
        .collect::<Result<Vec<T>, _>>()?;
    Ok(Page {
        data,
        next_cursor: result
            .get("nextCursor")
            .and_then(Value::as_str)
            .map(str::to_string),
        has_next_page: result
            .get("hasNextPage")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

// ── Transport boundary ──
//
// The one seam where a request leaves the behavior layer. Implemented
// by `HttpTransport` for production; tests script their own impls.
// The trait is object-safe so behaviors can hold `Arc<dyn Transport>`.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures_core::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::request::EffectiveRequest;

/// Executes one effective request and returns a normalized reply.
pub trait Transport: Send + Sync {
    fn execute(&self, req: EffectiveRequest) -> BoxFuture<'_, Result<Reply, Error>>;
}

/// A normalized transport reply: status, response headers, and a body
/// decoded according to the request's [`ResponseKind`](crate::ResponseKind).
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: ReplyBody,
}

#[derive(Debug, Clone)]
pub enum ReplyBody {
    Json(Value),
    Binary(Bytes),
}

/// The `{Data, Count, Page}` envelope returned by listing endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingReply {
    #[serde(rename = "Data", default)]
    pub data: Vec<Value>,
    #[serde(rename = "Count", default)]
    pub count: u64,
    #[serde(rename = "Page", default)]
    pub page: u64,
}

/// The `{Entity}` envelope returned by single-record endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityReply {
    #[serde(rename = "Entity")]
    pub entity: Value,
}

impl Reply {
    /// Look up a response header by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            ReplyBody::Json(v) => Some(v),
            ReplyBody::Binary(_) => None,
        }
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        match &self.body {
            ReplyBody::Binary(b) => Some(b),
            ReplyBody::Json(_) => None,
        }
    }

    /// Decode the body as a listing envelope.
    pub fn listing(&self) -> Result<ListingReply, Error> {
        self.decode_json()
    }

    /// Decode the body as a single-entity envelope.
    pub fn entity(&self) -> Result<EntityReply, Error> {
        self.decode_json()
    }

    fn decode_json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, Error> {
        let value = self.json().ok_or_else(|| Error::Deserialization {
            message: "expected a JSON body, got binary".into(),
            body: String::new(),
        })?;
        serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: value.to_string(),
        })
    }
}

// ── reqwest-backed Transport ──
//
// Builds the effective URL from a base target prefix, assembles
// method/headers/body, and normalizes the response into a `Reply`.
// Non-success statuses become `Error::Api` with the response text.

use std::collections::BTreeMap;
use std::time::Duration;

use futures_core::future::BoxFuture;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::request::{EffectiveRequest, ResponseKind};
use crate::transport::{Reply, ReplyBody, Transport};

/// Shared configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    /// Headers attached to every request (e.g. auth tokens).
    pub default_headers: BTreeMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            default_headers: BTreeMap::new(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Config {
                message: format!("invalid default header name {name:?}: {e}"),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Config {
                message: format!("invalid default header value: {e}"),
            })?;
            headers.insert(name, value);
        }

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("pagekit/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(Error::Transport)
    }
}

/// Production [`Transport`] over reqwest.
///
/// `base_url` is the target prefix (`https://host/api`); request URLs
/// are appended to it, so templates and calls only carry paths.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(base_url: Url, config: &TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a transport with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Join the target prefix and a request path: `{base}/{path}`.
    fn full_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let full = format!("{}/{}", base, path.trim_start_matches('/'));
        Url::parse(&full).map_err(Error::InvalidUrl)
    }

    async fn send(&self, req: EffectiveRequest) -> Result<Reply, Error> {
        let path = req.url.as_deref().ok_or_else(|| Error::Config {
            message: "request has no url".into(),
        })?;
        let url = self.full_url(path)?;

        // Absent method is sent as GET.
        let method = match req.method.as_deref() {
            None => Method::GET,
            Some(m) => Method::from_bytes(m.as_bytes()).map_err(|_| Error::Config {
                message: format!("invalid HTTP method {m:?}"),
            })?,
        };

        debug!(%method, %url, "executing request");

        let mut builder = self.http.request(method.clone(), url);
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }
        if method != Method::GET {
            builder = builder.json(&Value::Object(req.body.clone()));
        }

        let resp = builder.send().await.map_err(Error::Transport)?;
        let status = resp.status();

        let mut headers = BTreeMap::new();
        for (name, value) in resp.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str().to_owned(), v.to_owned());
            }
        }

        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = match req.response_type {
            ResponseKind::Json => {
                let text = resp.text().await.map_err(Error::Transport)?;
                let value: Value =
                    serde_json::from_str(&text).map_err(|e| Error::Deserialization {
                        message: e.to_string(),
                        body: text,
                    })?;
                ReplyBody::Json(value)
            }
            ResponseKind::Blob => {
                let bytes = resp.bytes().await.map_err(Error::Transport)?;
                ReplyBody::Binary(bytes)
            }
        };

        Ok(Reply {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn execute(&self, req: EffectiveRequest) -> BoxFuture<'_, Result<Reply, Error>> {
        Box::pin(self.send(req))
    }
}

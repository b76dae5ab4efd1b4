// ── Request shapes and the layered merge ──
//
// A `RequestOverlay` is one layer of a request: the class-level default
// for an operation, an instance-level override, or a per-call partial.
// Layers compose with `overlaid`; the final layer is frozen into an
// `EffectiveRequest` before it reaches the transport. Every composition
// returns a freshly owned value, so no layer can be mutated through a
// consumer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// How the transport should decode the response body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Decode as JSON (listings, entities, command acknowledgements).
    #[default]
    Json,
    /// Keep the raw bytes (file downloads).
    Blob,
}

/// One layer of request configuration.
///
/// Unset fields defer to the layer below. `body` carries the JSON
/// payload as a flat key map so per-call patches can union with the
/// template's skeleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOverlay {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub body: Map<String, Value>,
    #[serde(rename = "responseType", skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseKind>,
}

impl RequestOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body_entry(mut self, key: impl Into<String>, value: Value) -> Self {
        self.body.insert(key.into(), value);
        self
    }

    pub fn response_type(mut self, kind: ResponseKind) -> Self {
        self.response_type = Some(kind);
        self
    }

    /// Compose `patch` over `self`, returning a new layer.
    ///
    /// Scalar fields: a set value in the patch replaces the base, an
    /// unset one leaves the base intact. `headers` union key-wise with
    /// the patch winning. `body` unions one level deep with the patch
    /// winning on key collision -- patch semantics for query/filter
    /// parameters, so callers can tweak one filter key without losing
    /// the template's skeleton.
    pub fn overlaid(&self, patch: &RequestOverlay) -> RequestOverlay {
        let mut headers = self.headers.clone();
        headers.extend(patch.headers.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut body = self.body.clone();
        body.extend(patch.body.iter().map(|(k, v)| (k.clone(), v.clone())));

        RequestOverlay {
            method: patch.method.clone().or_else(|| self.method.clone()),
            url: patch.url.clone().or_else(|| self.url.clone()),
            headers,
            body,
            response_type: patch.response_type.or(self.response_type),
        }
    }
}

/// The fully merged request handed to the transport.
///
/// `method` and `url` stay optional: the transport sends an absent
/// method as GET and rejects an absent URL at execute time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveRequest {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Map<String, Value>,
    pub response_type: ResponseKind,
}

/// Merge a per-call partial over the stored template for `operation`.
///
/// Fails with [`Error::Config`] when there is no template AND the
/// partial carries no explicit URL -- there is nothing to send a
/// request to, and failing fast beats a silent default.
pub fn merge(
    operation: &str,
    template: Option<&RequestOverlay>,
    partial: &RequestOverlay,
) -> Result<EffectiveRequest, Error> {
    if template.is_none() && partial.url.is_none() {
        return Err(Error::template_missing(operation));
    }

    let base = template.cloned().unwrap_or_default();
    let merged = base.overlaid(partial);

    Ok(EffectiveRequest {
        method: merged.method,
        url: merged.url,
        headers: merged.headers,
        body: merged.body,
        response_type: merged.response_type.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn template() -> RequestOverlay {
        RequestOverlay::new()
            .method("POST")
            .url("/user/search")
            .header("x-tenant", "acme")
            .body_entry("Limit", json!(10))
            .body_entry("Page", json!(1))
    }

    #[test]
    fn body_merge_is_a_one_level_union_with_partial_winning() {
        let partial = RequestOverlay::new()
            .body_entry("Limit", json!(50))
            .body_entry("Keyword", json!("router"));

        let req = merge("Search", Some(&template()), &partial).unwrap();

        assert_eq!(req.body.get("Limit"), Some(&json!(50)));
        assert_eq!(req.body.get("Page"), Some(&json!(1)));
        assert_eq!(req.body.get("Keyword"), Some(&json!("router")));
    }

    #[test]
    fn body_union_does_not_recurse_into_nested_objects() {
        let base = RequestOverlay::new()
            .url("/x")
            .body_entry("Filter", json!({"Status": 1, "Kind": "a"}));
        let patch = RequestOverlay::new().body_entry("Filter", json!({"Status": 2}));

        let req = merge("Search", Some(&base), &patch).unwrap();

        // Whole value replaced, not deep-merged: nested "Kind" is gone.
        assert_eq!(req.body.get("Filter"), Some(&json!({"Status": 2})));
    }

    #[test]
    fn scalar_fields_follow_override_semantics() {
        let partial = RequestOverlay::new()
            .method("PUT")
            .header("x-trace", "t-1")
            .response_type(ResponseKind::Blob);

        let req = merge("Search", Some(&template()), &partial).unwrap();

        assert_eq!(req.method.as_deref(), Some("PUT"));
        assert_eq!(req.url.as_deref(), Some("/user/search"));
        assert_eq!(req.headers.get("x-tenant").map(String::as_str), Some("acme"));
        assert_eq!(req.headers.get("x-trace").map(String::as_str), Some("t-1"));
        assert_eq!(req.response_type, ResponseKind::Blob);
    }

    #[test]
    fn unset_partial_fields_leave_the_template_intact() {
        let req = merge("Search", Some(&template()), &RequestOverlay::new()).unwrap();

        assert_eq!(req.method.as_deref(), Some("POST"));
        assert_eq!(req.url.as_deref(), Some("/user/search"));
        assert_eq!(req.body.get("Limit"), Some(&json!(10)));
        assert_eq!(req.response_type, ResponseKind::Json);
    }

    #[test]
    fn missing_template_without_url_fails_fast() {
        let err = merge("Details", None, &RequestOverlay::new()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(
            err.to_string(),
            "Configuration error: Details request template missing"
        );
    }

    #[test]
    fn missing_template_with_explicit_url_succeeds() {
        let partial = RequestOverlay::new().url("/ad-hoc").body_entry("Id", json!(7));
        let req = merge("Details", None, &partial).unwrap();

        assert_eq!(req.url.as_deref(), Some("/ad-hoc"));
        assert_eq!(req.method, None);
        assert_eq!(req.body.get("Id"), Some(&json!(7)));
    }

    #[test]
    fn merge_never_aliases_the_template() {
        let tpl = template();
        let partial = RequestOverlay::new().body_entry("Limit", json!(99));

        let _ = merge("Search", Some(&tpl), &partial).unwrap();

        // Template layer unchanged after the merge.
        assert_eq!(tpl.body.get("Limit"), Some(&json!(10)));
    }
}

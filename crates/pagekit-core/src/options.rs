// ── Construction options and the template store ──
//
// Three layers of request configuration, applied in a fixed order:
// class-level defaults -> instance overrides (these options) ->
// per-call partials (merged later by the runners). The first two are
// frozen into a `TemplateStore` at construction; nothing mutates a
// stored template afterwards.

use std::collections::BTreeMap;

use pagekit_api::{RequestOverlay, ResponseKind};

use crate::operation::Operation;

/// Options recognized at behavior construction.
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Path prefix joined onto every relative request URL after the
    /// template merge; absolute URLs bypass it.
    pub target: String,
    overrides: BTreeMap<Operation, RequestOverlay>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            target: "/api".into(),
            overrides: BTreeMap::new(),
        }
    }
}

impl PageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Layer an instance-level override on the default template for `op`.
    pub fn request(mut self, op: Operation, overlay: RequestOverlay) -> Self {
        self.overrides.insert(op, overlay);
        self
    }
}

/// Class-level default request shape for `op`.
///
/// Exports and the import template download arrive as blobs; everything
/// else is JSON. The template download has no method set and is sent
/// as GET by the transport. Details has no class-level default at all:
/// a details call fails fast unless an instance override or the call
/// itself supplies a request.
fn default_template(op: Operation) -> Option<RequestOverlay> {
    let template = match op {
        Operation::Details => return None,
        Operation::Search | Operation::Insert | Operation::Delete | Operation::Import => {
            RequestOverlay::new().method("POST")
        }
        Operation::Update => RequestOverlay::new().method("PUT"),
        Operation::Export | Operation::ExportByIds => RequestOverlay::new()
            .method("POST")
            .response_type(ResponseKind::Blob),
        Operation::Template => RequestOverlay::new().response_type(ResponseKind::Blob),
    };
    Some(template)
}

/// Per-operation request templates, frozen at construction.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    templates: BTreeMap<Operation, RequestOverlay>,
}

impl TemplateStore {
    pub fn build(options: &PageOptions) -> Self {
        let mut templates = BTreeMap::new();
        for op in Operation::ALL {
            let base = default_template(op);
            let template = match (base, options.overrides.get(&op)) {
                (Some(base), Some(instance)) => Some(base.overlaid(instance)),
                (Some(base), None) => Some(base),
                (None, Some(instance)) => Some(instance.clone()),
                (None, None) => None,
            };
            if let Some(template) = template {
                templates.insert(op, template);
            }
        }
        Self { templates }
    }

    pub fn resolve(&self, op: Operation) -> Option<&RequestOverlay> {
        self.templates.get(&op)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let store = TemplateStore::build(&PageOptions::new());

        let search = store.resolve(Operation::Search).unwrap();
        assert_eq!(search.method.as_deref(), Some("POST"));
        assert_eq!(search.response_type, None);

        // Details deliberately has no default shape.
        assert!(store.resolve(Operation::Details).is_none());

        let update = store.resolve(Operation::Update).unwrap();
        assert_eq!(update.method.as_deref(), Some("PUT"));

        let export = store.resolve(Operation::Export).unwrap();
        assert_eq!(export.response_type, Some(ResponseKind::Blob));

        let template = store.resolve(Operation::Template).unwrap();
        assert_eq!(template.method, None);
        assert_eq!(template.response_type, Some(ResponseKind::Blob));
    }

    #[test]
    fn instance_overrides_layer_over_defaults() {
        let options = PageOptions::new().request(
            Operation::Search,
            RequestOverlay::new()
                .url("/user/search")
                .body_entry("Limit", json!(20)),
        );
        let store = TemplateStore::build(&options);

        let search = store.resolve(Operation::Search).unwrap();
        // Default method preserved, override fields added.
        assert_eq!(search.method.as_deref(), Some("POST"));
        assert_eq!(search.url.as_deref(), Some("/user/search"));
        assert_eq!(search.body.get("Limit"), Some(&json!(20)));

        // Other operations untouched.
        let insert = store.resolve(Operation::Insert).unwrap();
        assert_eq!(insert.url, None);
    }

    #[test]
    fn details_override_creates_its_template() {
        let options = PageOptions::new().request(
            Operation::Details,
            RequestOverlay::new().method("POST").url("/user/details"),
        );
        let store = TemplateStore::build(&options);

        let details = store.resolve(Operation::Details).unwrap();
        assert_eq!(details.url.as_deref(), Some("/user/details"));
    }

    #[test]
    fn default_target_is_api() {
        assert_eq!(PageOptions::new().target, "/api");
    }
}

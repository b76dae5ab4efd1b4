// ── Page behavior ──
//
// One runner per operation, all sharing the same shape: acquire the
// class busy flag (or no-op), merge the per-call partial over the
// stored template, execute through the transport, apply the reply to
// the page state in one transaction, route failures through the error
// sink, and release the flag on every path via the guard's drop.

use std::sync::{Arc, Mutex};

use pagekit_api::{
    DiscardSaver, EffectiveRequest, Error, FileSaver, Reply, RequestOverlay, Transport, download,
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::dispatch::{PageEvent, Subscription};
use crate::operation::Operation;
use crate::options::{PageOptions, TemplateStore};
use crate::sink::{ErrorSink, LogSink};
use crate::store::{PageState, PageStore};

pub(crate) const EVENT_CHANNEL_SIZE: usize = 64;

/// Result of a runner call that did not fail.
///
/// A duplicate call while the operation's busy class is in flight is
/// skipped -- a warning, not an error.
#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(Reply),
    Skipped,
}

impl Outcome {
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Outcome::Completed(reply) => Some(reply),
            Outcome::Skipped => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }
}

/// The behavior layer for one admin list/detail page.
///
/// Cheaply cloneable via `Arc`; all clones share one state store, one
/// event channel, and one subscription slot.
#[derive(Clone)]
pub struct PageBehavior {
    inner: Arc<Inner>,
}

struct Inner {
    options: PageOptions,
    templates: TemplateStore,
    transport: Arc<dyn Transport>,
    sink: Arc<dyn ErrorSink>,
    saver: Arc<dyn FileSaver>,
    store: PageStore,
    events_tx: broadcast::Sender<PageEvent>,
    subscription: Mutex<Option<Subscription>>,
}

impl PageBehavior {
    /// Create a behavior with the default collaborators: a tracing
    /// [`LogSink`] and a discarding file saver.
    pub fn new(options: PageOptions, transport: Arc<dyn Transport>) -> Self {
        Self::with_collaborators(options, transport, Arc::new(LogSink), Arc::new(DiscardSaver))
    }

    /// Create a behavior with injected error-sink and file-save
    /// collaborators.
    pub fn with_collaborators(
        options: PageOptions,
        transport: Arc<dyn Transport>,
        sink: Arc<dyn ErrorSink>,
        saver: Arc<dyn FileSaver>,
    ) -> Self {
        let templates = TemplateStore::build(&options);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            inner: Arc::new(Inner {
                options,
                templates,
                transport,
                sink,
                saver,
                store: PageStore::new(),
                events_tx,
                subscription: Mutex::new(None),
            }),
        }
    }

    pub fn options(&self) -> &PageOptions {
        &self.inner.options
    }

    pub fn store(&self) -> &PageStore {
        &self.inner.store
    }

    /// A point-in-time copy of the page state.
    pub fn state(&self) -> PageState {
        self.inner.store.snapshot()
    }

    pub(crate) fn events_channel(&self) -> &broadcast::Sender<PageEvent> {
        &self.inner.events_tx
    }

    pub(crate) fn subscription_slot(&self) -> &Mutex<Option<Subscription>> {
        &self.inner.subscription
    }

    // ── Request merging ──────────────────────────────────────────────

    /// Merge a per-call partial over the stored template for `op`,
    /// then join the configured target prefix onto the resolved URL.
    pub fn merge(&self, op: Operation, partial: &RequestOverlay) -> Result<EffectiveRequest, Error> {
        let mut request = pagekit_api::merge(op.name(), self.inner.templates.resolve(op), partial)?;
        request.url = request
            .url
            .map(|url| prefix_target(&self.inner.options.target, &url));
        Ok(request)
    }

    // ── Operation runners ────────────────────────────────────────────

    /// Search the listing and apply rows/paging to the page state.
    pub async fn search(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Search, request).await
    }

    /// Fetch one record and store it as the page's detail entity.
    pub async fn details(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Details, request).await
    }

    pub async fn insert(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Insert, request).await
    }

    pub async fn update(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Update, request).await
    }

    pub async fn delete(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Delete, request).await
    }

    pub async fn import(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Import, request).await
    }

    /// Export the listing; the blob is handed to the file saver under
    /// the name from `content-disposition` (or a timestamped fallback).
    pub async fn export(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Export, request).await
    }

    /// Export a caller-chosen id set. Call-only: not reachable by event.
    pub async fn export_by_ids(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::ExportByIds, request).await
    }

    /// Download the import template file. Call-only: not reachable by event.
    pub async fn download_template(&self, request: RequestOverlay) -> Result<Outcome, Error> {
        self.run(Operation::Template, request).await
    }

    /// Toggle the filter panel; `Some` sets it explicitly.
    pub fn set_filter_collapse(&self, explicit: Option<bool>) {
        self.inner.store.apply(|state| {
            state.filter_collapse = explicit.unwrap_or(!state.filter_collapse);
        });
    }

    // ── Shared runner shape ──────────────────────────────────────────

    async fn run(&self, op: Operation, partial: RequestOverlay) -> Result<Outcome, Error> {
        let Some(guard) = self.inner.store.try_begin(op.busy_class()) else {
            warn!(operation = op.name(), class = %op.busy_class(), "already in flight; ignoring");
            return Ok(Outcome::Skipped);
        };

        let result = self.execute(op, partial).await;
        drop(guard);

        match result {
            Ok(reply) => Ok(Outcome::Completed(reply)),
            Err((err, request)) => {
                self.inner.sink.handle(&err, op, request.as_ref());
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        op: Operation,
        partial: RequestOverlay,
    ) -> Result<Reply, (Error, Option<EffectiveRequest>)> {
        let request = self.merge(op, &partial).map_err(|e| (e, None))?;

        let reply = self
            .inner
            .transport
            .execute(request.clone())
            .await
            .map_err(|e| (e, Some(request.clone())))?;

        self.apply_reply(op, &request, &reply)
            .map_err(|e| (e, Some(request)))?;

        Ok(reply)
    }

    /// Apply an operation's reply to the page state in one transaction.
    fn apply_reply(&self, op: Operation, request: &EffectiveRequest, reply: &Reply) -> Result<(), Error> {
        match op {
            Operation::Search => {
                let listing = reply.listing()?;
                let page_size = request
                    .body
                    .get("Limit")
                    .and_then(Value::as_u64)
                    .unwrap_or_default();
                let params = request.body.clone();

                self.inner.store.apply(|state| {
                    state.row_data = listing.data;
                    state.search_params = params;
                    state.total = listing.count;
                    state.page_size = page_size;
                    state.current = listing.page;
                });
            }
            Operation::Details => {
                let entity = reply.entity()?;
                self.inner.store.apply(|state| {
                    state.details = Some(entity.entity);
                });
            }
            // Edit and import replies are returned to the caller as-is.
            Operation::Insert | Operation::Update | Operation::Delete | Operation::Import => {}
            Operation::Export | Operation::ExportByIds | Operation::Template => {
                let bytes = reply.bytes().ok_or_else(|| Error::Deserialization {
                    message: "expected a binary body for a download".into(),
                    body: String::new(),
                })?;
                let filename = download::saved_filename(reply.header("content-disposition"));
                debug!(operation = op.name(), %filename, size = bytes.len(), "saving download");
                self.inner.saver.save(bytes, &filename);
            }
        }
        Ok(())
    }
}

/// Join the target prefix and a request path: `{target}/{path}`.
/// Absolute URLs pass through untouched so a template can point at
/// another host.
fn prefix_target(target: &str, url: &str) -> String {
    if target.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return url.to_owned();
    }
    format!("{}/{}", target.trim_end_matches('/'), url.trim_start_matches('/'))
}

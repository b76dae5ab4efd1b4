// Shared test doubles: a scripted transport, a recording error sink,
// and a recording file saver.
#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures_core::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Notify;

use pagekit_core::{
    EffectiveRequest, Error, ErrorSink, FileSaver, Operation, Reply, ReplyBody, Transport,
};

// ── ScriptedTransport ───────────────────────────────────────────────

/// Replays queued replies in order. When a gate is installed, every
/// call suspends until the gate is notified -- used to hold an
/// operation in flight while a duplicate call is issued.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<Reply, Error>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<EffectiveRequest>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_json(&self, body: Value) {
        self.replies.lock().unwrap().push_back(Ok(Reply {
            status: 200,
            headers: BTreeMap::new(),
            body: ReplyBody::Json(body),
        }));
    }

    pub fn push_blob(&self, bytes: &'static [u8], disposition: Option<&str>) {
        let mut headers = BTreeMap::new();
        if let Some(d) = disposition {
            headers.insert("content-disposition".to_owned(), d.to_owned());
        }
        self.replies.lock().unwrap().push_back(Ok(Reply {
            status: 200,
            headers,
            body: ReplyBody::Binary(Bytes::from_static(bytes)),
        }));
    }

    pub fn push_err(&self, err: Error) {
        self.replies.lock().unwrap().push_back(Err(err));
    }

    /// Install a gate; subsequent calls block until `notify_one`.
    pub fn install_gate(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EffectiveRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, req: EffectiveRequest) -> BoxFuture<'_, Result<Reply, Error>> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(req);
            self.calls.fetch_add(1, Ordering::SeqCst);

            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(Reply {
                        status: 200,
                        headers: BTreeMap::new(),
                        body: ReplyBody::Json(Value::Object(serde_json::Map::new())),
                    })
                })
        })
    }
}

// ── RecordingSink ───────────────────────────────────────────────────

#[derive(Debug)]
pub struct SinkRecord {
    pub operation: Operation,
    pub message: String,
    pub request_url: Option<String>,
    pub had_request: bool,
}

#[derive(Default)]
pub struct RecordingSink {
    pub records: Mutex<Vec<SinkRecord>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl ErrorSink for RecordingSink {
    fn handle(&self, err: &Error, operation: Operation, request: Option<&EffectiveRequest>) {
        self.records.lock().unwrap().push(SinkRecord {
            operation,
            message: err.to_string(),
            request_url: request.and_then(|r| r.url.clone()),
            had_request: request.is_some(),
        });
    }
}

// ── RecordingSaver ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSaver {
    pub saved: Mutex<Vec<(Vec<u8>, String)>>,
}

impl RecordingSaver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileSaver for RecordingSaver {
    fn save(&self, bytes: &[u8], filename: &str) {
        self.saved
            .lock()
            .unwrap()
            .push((bytes.to_vec(), filename.to_owned()));
    }
}

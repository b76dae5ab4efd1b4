// ── Event dispatch ──
//
// One inbound channel of `{event_type, request}` events. A live
// subscription is a background task that filters events to the seven
// built-in operations and fires the matching runner without awaiting
// it, so a slow operation never blocks the next event. Unknown event
// types are logged and dropped -- events have no return path, so they
// can never fail the producer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::behavior::PageBehavior;
use crate::operation::Operation;
use pagekit_api::RequestOverlay;

/// One inbound UI event: a handler name plus a partial request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEvent {
    #[serde(rename = "EventType")]
    pub event_type: String,
    #[serde(rename = "AjaxRequest", default)]
    pub request: RequestOverlay,
}

impl PageEvent {
    pub fn new(event_type: impl Into<String>, request: RequestOverlay) -> Self {
        Self {
            event_type: event_type.into(),
            request,
        }
    }
}

/// The closed set of event-driven operations. `ExportByIds` and
/// `Template` are deliberately absent: they are call-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum EventKind {
    #[strum(serialize = "onSearch")]
    Search,
    #[strum(serialize = "onDetails")]
    Details,
    #[strum(serialize = "onInsert")]
    Insert,
    #[strum(serialize = "onUpdate")]
    Update,
    #[strum(serialize = "onDelete")]
    Delete,
    #[strum(serialize = "onImport")]
    Import,
    #[strum(serialize = "onExport")]
    Export,
}

impl EventKind {
    pub fn operation(self) -> Operation {
        match self {
            EventKind::Search => Operation::Search,
            EventKind::Details => Operation::Details,
            EventKind::Insert => Operation::Insert,
            EventKind::Update => Operation::Update,
            EventKind::Delete => Operation::Delete,
            EventKind::Import => Operation::Import,
            EventKind::Export => Operation::Export,
        }
    }
}

/// A live subscription: the dispatch task plus its cancellation handle.
/// At most one exists per behavior; re-subscribing replaces it.
pub(crate) struct Subscription {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PageBehavior {
    /// A sender for pushing events into the channel. Events sent while
    /// no subscription is live are dropped by the channel.
    pub fn event_sender(&self) -> broadcast::Sender<PageEvent> {
        self.events_channel().clone()
    }

    /// Push one event; returns `false` if no subscription is listening.
    pub fn emit(&self, event: PageEvent) -> bool {
        self.events_channel().send(event).is_ok()
    }

    /// Start consuming events. Replaces (tears down first) any live
    /// subscription rather than stacking a second one.
    pub fn subscribe(&self) {
        let mut slot = self.subscription_slot().lock().expect("subscription lock poisoned");
        if let Some(previous) = slot.take() {
            previous.release();
        }

        let rx = self.events_channel().subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(dispatch_task(self.clone(), rx, cancel.clone()));
        *slot = Some(Subscription { cancel, handle });
    }

    /// Stop consuming events and release the channel handle.
    /// Idempotent: calling with no live subscription is a no-op.
    pub fn unsubscribe(&self) {
        let taken = self
            .subscription_slot()
            .lock()
            .expect("subscription lock poisoned")
            .take();
        if let Some(subscription) = taken {
            subscription.release();
        }
    }
}

impl Subscription {
    fn release(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

async fn dispatch_task(
    behavior: PageBehavior,
    mut rx: broadcast::Receiver<PageEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => dispatch_event(&behavior, event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event channel lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}

/// Route one event. Fire-and-forget: the runner is spawned, never
/// awaited here, so the dispatcher is free to accept the next event.
fn dispatch_event(behavior: &PageBehavior, event: PageEvent) {
    let Ok(kind) = event.event_type.parse::<EventKind>() else {
        warn!(event_type = %event.event_type, "unresolved event; dropping");
        return;
    };

    debug!(event_type = %event.event_type, "dispatching event");

    let behavior = behavior.clone();
    let request = event.request;
    tokio::spawn(async move {
        let result = match kind {
            EventKind::Search => behavior.search(request).await,
            EventKind::Details => behavior.details(request).await,
            EventKind::Insert => behavior.insert(request).await,
            EventKind::Update => behavior.update(request).await,
            EventKind::Delete => behavior.delete(request).await,
            EventKind::Import => behavior.import(request).await,
            EventKind::Export => behavior.export(request).await,
        };
        // Failures already went through the error sink; events have no
        // return path.
        if let Err(error) = result {
            debug!(operation = kind.operation().name(), %error, "event-driven operation failed");
        }
    });
}

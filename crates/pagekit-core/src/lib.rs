// pagekit-core: CRUD page behavior layer between pagekit-api and a host UI.
//
// Equips a list/detail page "entity" with the standard request
// lifecycle: template merging, single-flight operation runners,
// observable page state, and a single event channel.

pub mod behavior;
pub mod dispatch;
pub mod operation;
pub mod options;
pub mod sink;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use behavior::{Outcome, PageBehavior};
pub use dispatch::{EventKind, PageEvent};
pub use operation::{BusyClass, Operation};
pub use options::{PageOptions, TemplateStore};
pub use sink::{ErrorSink, LogSink};
pub use store::{PageState, PageStore};

// Transport-boundary types, re-exported for consumers that only depend
// on this crate.
pub use pagekit_api::{
    EffectiveRequest, Error, FileSaver, Reply, ReplyBody, RequestOverlay, ResponseKind, Transport,
};

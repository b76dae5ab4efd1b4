// ── Observable page state ──
//
// One watch-held state struct for the whole page: list rows, paging,
// detail record, filter collapse, and the five busy flags. Every
// mutation goes through a single `send_modify` transaction, so
// observers see the fields touched by one operation together, never
// incrementally. Busy flags are acquired with an atomic test-and-set
// (`send_if_modified`) and released by `BusyGuard` on drop, which
// covers every exit path of a runner.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::operation::BusyClass;

/// Shared page state owned by the behavior, observed by the UI.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// Rows of the current listing.
    pub row_data: Vec<Value>,
    /// Total record count reported by the last search.
    pub total: u64,
    /// Current page number.
    pub current: u64,
    /// Page size taken from the search request's `Limit`.
    pub page_size: u64,
    /// Body of the last successful search request.
    pub search_params: Map<String, Value>,
    /// Entity from the last successful details call.
    pub details: Option<Value>,
    /// Search-filter panel collapse toggle.
    pub filter_collapse: bool,

    // Busy flags, one per re-entrancy class.
    pub loading: bool,
    pub loading_details: bool,
    pub loading_edit: bool,
    pub loading_import: bool,
    pub loading_export: bool,
}

impl PageState {
    pub fn busy(&self, class: BusyClass) -> bool {
        match class {
            BusyClass::Listing => self.loading,
            BusyClass::Details => self.loading_details,
            BusyClass::Edit => self.loading_edit,
            BusyClass::Import => self.loading_import,
            BusyClass::Export => self.loading_export,
        }
    }

    fn set_busy(&mut self, class: BusyClass, value: bool) {
        match class {
            BusyClass::Listing => self.loading = value,
            BusyClass::Details => self.loading_details = value,
            BusyClass::Edit => self.loading_edit = value,
            BusyClass::Import => self.loading_import = value,
            BusyClass::Export => self.loading_export = value,
        }
    }
}

/// Handle to the shared state. Cheap to clone; all clones observe and
/// mutate the same state.
#[derive(Debug, Clone)]
pub struct PageStore {
    tx: Arc<watch::Sender<PageState>>,
}

impl Default for PageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PageState::default());
        Self { tx: Arc::new(tx) }
    }

    /// A point-in-time copy of the state.
    pub fn snapshot(&self) -> PageState {
        self.tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.tx.subscribe()
    }

    /// Apply one state transition atomically with respect to observers.
    pub fn apply(&self, transition: impl FnOnce(&mut PageState)) {
        self.tx.send_modify(transition);
    }

    /// Try to acquire the busy flag for `class`.
    ///
    /// Returns `None` when the class is already in flight (the caller
    /// no-ops). The returned guard clears the flag on drop.
    pub(crate) fn try_begin(&self, class: BusyClass) -> Option<BusyGuard> {
        let acquired = self.tx.send_if_modified(|state| {
            if state.busy(class) {
                false
            } else {
                state.set_busy(class, true);
                true
            }
        });
        acquired.then(|| BusyGuard {
            store: self.clone(),
            class,
        })
    }
}

/// RAII release of a busy flag; dropping is the finally block.
pub(crate) struct BusyGuard {
    store: PageStore,
    class: BusyClass,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let class = self.class;
        self.store.apply(|state| state.set_busy(class, false));
    }
}

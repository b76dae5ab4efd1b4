// ── Operation enumeration ──
//
// The closed set of page actions. Every runner, template, and event
// route is keyed by one of these; there is no dynamic operation name.

use strum::{Display, EnumString, IntoStaticStr};

/// One named CRUD or auxiliary page action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, IntoStaticStr,
)]
pub enum Operation {
    Search,
    Details,
    Insert,
    Update,
    Delete,
    Import,
    Export,
    /// Export a caller-chosen id set. Call-only: never event-driven.
    ExportByIds,
    /// Download the import template file. Call-only: never event-driven.
    Template,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::Search,
        Operation::Details,
        Operation::Insert,
        Operation::Update,
        Operation::Delete,
        Operation::Import,
        Operation::Export,
        Operation::ExportByIds,
        Operation::Template,
    ];

    /// The wire/display name as a static string.
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// The re-entrancy scope guarding this operation.
    ///
    /// Insert, Update, and Delete deliberately share one flag: a second
    /// edit-class call while one is in flight is rejected even when it
    /// is a different operation.
    pub fn busy_class(self) -> BusyClass {
        match self {
            Operation::Search => BusyClass::Listing,
            Operation::Details => BusyClass::Details,
            Operation::Insert | Operation::Update | Operation::Delete => BusyClass::Edit,
            Operation::Import => BusyClass::Import,
            Operation::Export | Operation::ExportByIds | Operation::Template => BusyClass::Export,
        }
    }
}

/// Busy-flag class: the scope of one re-entrancy guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum BusyClass {
    Listing,
    Details,
    Edit,
    Import,
    Export,
}

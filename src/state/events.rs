//! Grid intents and their outcomes

use std::collections::BTreeSet;

use crate::data::query::SortDirection;
use crate::data::record::{FieldValue, RecordKey};
use crate::data::record_store::DeleteOutcome;

/// Intents a rendering layer can emit
#[derive(Debug, Clone, PartialEq)]
pub enum GridIntent {
    /// Open the edit session on a record
    BeginEdit { key: RecordKey },

    /// Change one draft value of the record being edited
    UpdateField {
        key: RecordKey,
        name: String,
        value: FieldValue,
    },

    /// Validate and commit the draft
    Save { key: RecordKey },

    /// Abandon the draft
    Cancel,

    RequestDelete { key: RecordKey },
    ConfirmDelete { key: RecordKey },
    CancelDelete { key: RecordKey },

    /// Text search on one column; empty text clears the search
    SetSearch { column: String, text: String },

    /// Accepted values for one column; an empty set removes the filter
    SetColumnFilter {
        column: String,
        values: BTreeSet<String>,
    },

    SetSort {
        column: String,
        direction: SortDirection,
    },

    SetPage(usize),
}

/// What a successfully handled intent did
#[derive(Debug, Clone, PartialEq)]
pub enum IntentOutcome {
    EditStarted(RecordKey),
    FieldUpdated { key: RecordKey, name: String },
    Saved(RecordKey),
    /// The key whose draft was dropped, if a session was open
    Cancelled(Option<RecordKey>),
    DeleteRequested(RecordKey),
    Deleted(DeleteOutcome),
    DeleteCancelled { key: RecordKey, was_pending: bool },
    /// The query changed; `page` is the effective page of the new view
    QueryChanged { page: usize },
}

//! Error types for the record grid.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::data::record::RecordKey;

/// Result type for grid operations.
pub type GridResult<T> = Result<T, GridError>;

/// Why a single draft field failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Blank value in an editable column.
    MissingRequiredField,
    /// Numeric column whose value does not parse as a finite number.
    InvalidNumericFormat,
    /// Rejected by a column's custom validator.
    Rejected(String),
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::MissingRequiredField => write!(f, "value is required"),
            ValidationErrorKind::InvalidNumericFormat => write!(f, "value must be a number"),
            ValidationErrorKind::Rejected(reason) => write!(f, "{}", reason),
        }
    }
}

/// Field name -> validation failure, ordered by field name.
pub type FieldErrors = BTreeMap<String, ValidationErrorKind>;

/// Errors surfaced by the grid controller and its components.
///
/// None of these are fatal: after any of them the controller is back in a
/// stable state (idle session or the unchanged editing session, store untouched).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Another edit session is active.
    #[error("an edit session is already active for record {active}")]
    SessionBusy { active: RecordKey },

    /// Target record does not exist.
    #[error("record not found: {0}")]
    NotFound(RecordKey),

    /// The draft did not pass validation; the session stays open.
    #[error("validation failed for {}", format_fields(.0))]
    ValidationFailed(FieldErrors),

    /// Data source failure; the previous snapshot stays in place.
    #[error("load failed: {0}")]
    LoadFailed(String),

    /// Intent requires an edit session on this key, but none is open for it.
    #[error("no edit session open for record {0}")]
    NotEditing(RecordKey),

    /// Intent requires an edit session, but the session is idle.
    #[error("no edit session is open")]
    NoActiveSession,

    /// Attempt to edit a column that is not editable.
    #[error("column '{0}' is read-only")]
    ReadOnlyField(String),

    /// Search on a column that is not searchable.
    #[error("column '{0}' is not searchable")]
    NotSearchable(String),

    /// Column name not present in the column set.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

fn format_fields(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, kind)| format!("{} ({})", field, kind))
        .collect::<Vec<_>>()
        .join(", ")
}

impl GridError {
    /// Validation errors carried by this error, if any.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            GridError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

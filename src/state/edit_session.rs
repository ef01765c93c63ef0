//! EditSession - the single in-progress edit
//!
//! There is exactly one session slot for the whole grid, so at most one record
//! is ever being edited. The draft lives here until `save` commits it to the
//! RecordStore; nothing else writes record fields.

use tracing::{debug, info, warn};

use crate::data::column::ColumnSet;
use crate::data::record::{FieldValue, Fields, RecordKey};
use crate::data::record_store::RecordStore;
use crate::error::{FieldErrors, GridError, GridResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Editing {
        key: RecordKey,
        draft: Fields,
        errors: FieldErrors,
    },
}

#[derive(Debug, Clone)]
pub struct EditSession {
    columns: ColumnSet,
    state: SessionState,
}

impl EditSession {
    pub fn new(columns: ColumnSet) -> Self {
        Self {
            columns,
            state: SessionState::Idle,
        }
    }

    /// Open a session on `key`. Only editable columns are kept from
    /// `initial_values`.
    pub fn begin(&mut self, key: RecordKey, initial_values: Fields) -> GridResult<()> {
        if let SessionState::Editing { key: active, .. } = &self.state {
            warn!(
                "EditSession: begin({}) rejected, record {} is being edited",
                key, active
            );
            return Err(GridError::SessionBusy { active: *active });
        }

        let draft: Fields = initial_values
            .into_iter()
            .filter(|(name, _)| {
                self.columns
                    .get(name)
                    .map(|column| column.is_editable())
                    .unwrap_or(false)
            })
            .collect();

        info!("EditSession: Idle -> Editing({})", key);
        self.state = SessionState::Editing {
            key,
            draft,
            errors: FieldErrors::new(),
        };
        Ok(())
    }

    /// Replace one draft value and clear its error. The store is untouched.
    pub fn update_field(&mut self, name: &str, value: FieldValue) -> GridResult<()> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| GridError::UnknownColumn(name.to_string()))?;
        if !column.is_editable() {
            return Err(GridError::ReadOnlyField(name.to_string()));
        }

        match &mut self.state {
            SessionState::Editing { key, draft, errors } => {
                debug!("EditSession: draft[{}] updated for record {}", name, key);
                draft.insert(name.to_string(), value);
                errors.remove(name);
                Ok(())
            }
            SessionState::Idle => Err(GridError::NoActiveSession),
        }
    }

    /// Validate every editable column present in the draft. An empty map
    /// means the draft can be saved.
    pub fn validate(&self) -> FieldErrors {
        let draft = match &self.state {
            SessionState::Editing { draft, .. } => draft,
            SessionState::Idle => return FieldErrors::new(),
        };

        self.columns
            .editable()
            .filter_map(|column| {
                let value = draft.get(&column.field)?;
                column
                    .validate(value)
                    .err()
                    .map(|kind| (column.field.clone(), kind))
            })
            .collect()
    }

    /// Validate, then commit the draft and return to Idle.
    ///
    /// On validation failure the session stays open with its errors set.
    /// If the record disappeared (e.g. a reload removed it) the session is
    /// closed and `NotFound` is returned.
    pub fn save(&mut self, store: &mut RecordStore) -> GridResult<RecordKey> {
        let validation = self.validate();

        let (key, draft) = match &mut self.state {
            SessionState::Idle => return Err(GridError::NoActiveSession),
            SessionState::Editing { key, draft, errors } => {
                if !validation.is_empty() {
                    info!(
                        "EditSession: save of record {} blocked by {} invalid field(s)",
                        key,
                        validation.len()
                    );
                    *errors = validation.clone();
                    return Err(GridError::ValidationFailed(validation));
                }
                (*key, std::mem::take(draft))
            }
        };

        let committed: Fields = draft
            .into_iter()
            .map(|(name, value)| {
                let value = match self.columns.get(&name) {
                    Some(column) => column.coerce(value),
                    None => value,
                };
                (name, value)
            })
            .collect();

        self.state = SessionState::Idle;
        match store.upsert(key, &committed) {
            Ok(()) => {
                info!("EditSession: Editing({}) -> Idle (saved)", key);
                Ok(key)
            }
            Err(e) => {
                warn!("EditSession: save of record {} failed: {}", key, e);
                Err(e)
            }
        }
    }

    /// Drop the draft and return to Idle. Returns the key that was being edited.
    pub fn cancel(&mut self) -> Option<RecordKey> {
        match std::mem::take(&mut self.state) {
            SessionState::Editing { key, .. } => {
                info!("EditSession: Editing({}) -> Idle (cancelled)", key);
                Some(key)
            }
            SessionState::Idle => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, SessionState::Editing { .. })
    }

    pub fn editing_key(&self) -> Option<RecordKey> {
        match &self.state {
            SessionState::Editing { key, .. } => Some(*key),
            SessionState::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&Fields> {
        match &self.state {
            SessionState::Editing { draft, .. } => Some(draft),
            SessionState::Idle => None,
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match &self.state {
            SessionState::Editing { errors, .. } => Some(errors),
            SessionState::Idle => None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }
}

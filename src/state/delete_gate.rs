//! Two-phase delete: request, then confirm or cancel

use tracing::{debug, info, warn};

use crate::data::record::RecordKey;
use crate::data::record_store::{DeleteOutcome, RecordStore};
use crate::error::{GridError, GridResult};
use crate::state::edit_session::EditSession;

/// Holds at most one pending delete. Every delete is refused while an edit
/// session is open.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfirmationGate {
    pending: Option<RecordKey>,
}

impl DeleteConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `key` as awaiting confirmation. Replaces any earlier request.
    pub fn request_delete(&mut self, key: RecordKey, session: &EditSession) -> GridResult<()> {
        ensure_idle(session, "request_delete", key)?;

        if let Some(previous) = self.pending.replace(key) {
            if previous != key {
                debug!(
                    "DeleteConfirmationGate: pending delete {} replaced by {}",
                    previous, key
                );
            }
        }
        info!("DeleteConfirmationGate: delete of {} awaiting confirmation", key);
        Ok(())
    }

    /// Delete `key` from the store. An absent key is reported through the
    /// outcome, not as an error.
    pub fn confirm_delete(
        &mut self,
        key: RecordKey,
        session: &EditSession,
        store: &mut RecordStore,
    ) -> GridResult<DeleteOutcome> {
        ensure_idle(session, "confirm_delete", key)?;

        if self.pending == Some(key) {
            self.pending = None;
        } else {
            debug!(
                "DeleteConfirmationGate: confirm for {} without matching request (pending: {:?})",
                key, self.pending
            );
        }

        let outcome = store.delete(key);
        info!(
            "DeleteConfirmationGate: delete of {} confirmed ({})",
            key,
            if outcome.is_removed() {
                "removed"
            } else {
                "already gone"
            }
        );
        Ok(outcome)
    }

    /// Drop the pending request for `key`. Returns whether one was pending.
    pub fn cancel_delete(&mut self, key: RecordKey) -> bool {
        if self.pending == Some(key) {
            self.pending = None;
            info!("DeleteConfirmationGate: delete of {} cancelled", key);
            true
        } else {
            false
        }
    }

    pub fn pending(&self) -> Option<RecordKey> {
        self.pending
    }
}

fn ensure_idle(session: &EditSession, operation: &str, key: RecordKey) -> GridResult<()> {
    match session.editing_key() {
        Some(active) => {
            warn!(
                "DeleteConfirmationGate: {}({}) rejected, record {} is being edited",
                operation, key, active
            );
            Err(GridError::SessionBusy { active })
        }
        None => Ok(()),
    }
}

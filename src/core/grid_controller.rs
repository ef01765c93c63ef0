//! GridController - owns the grid state and consumes intents
//!
//! The controller is the single owner of the RecordStore, the EditSession, the
//! delete gate and the Query. Renderers read a `RenderState` and send
//! `GridIntent`s back; loads arrive as `(LoadTicket, result)` pairs.

use std::cell::OnceCell;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::column::ColumnSet;
use crate::data::data_source::{to_records, DataSource, RawRecord};
use crate::data::grid_view::GridView;
use crate::data::query::{Query, SortDirection};
use crate::data::record::{FieldValue, Record, RecordKey};
use crate::data::record_store::{DeleteOutcome, LoadOutcome, RecordStore};
use crate::data::search_filter::HighlightSpan;
use crate::error::{GridError, GridResult};
use crate::state::delete_gate::DeleteConfirmationGate;
use crate::state::edit_session::{EditSession, SessionState};
use crate::state::events::{GridIntent, IntentOutcome};

/// Maximum number of intents kept for debugging
const MAX_INTENT_HISTORY: usize = 100;

/// Sequence number of one fetch. Later tickets win over earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(pub u64);

impl fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read-only snapshot handed to a renderer
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Records on the current page, in display order
    pub rows: Vec<Record>,
    pub columns: ColumnSet,
    pub session: SessionState,
    pub pending_delete: Option<RecordKey>,
    pub highlights: Vec<HighlightSpan>,
    pub page: usize,
    pub page_count: usize,
    /// Rows passing search and filters, across all pages
    pub total_rows: usize,
    pub loading: bool,
    pub load_error: Option<GridError>,
}

impl RenderState {
    /// Highlight span for one cell, if any
    pub fn highlight_for(&self, key: RecordKey, field: &str) -> Option<&HighlightSpan> {
        self.highlights
            .iter()
            .find(|span| span.key == key && span.field == field)
    }
}

/// Logged intent, with whether it succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRecord {
    pub intent: GridIntent,
    pub succeeded: bool,
}

pub struct GridController {
    columns: ColumnSet,
    store: RecordStore,
    session: EditSession,
    delete_gate: DeleteConfirmationGate,
    query: Query,

    /// Derived view for the current store revision and query
    view_cache: OnceCell<Arc<GridView>>,

    last_ticket: u64,
    /// Newest issued ticket that has not completed yet
    in_flight: Option<LoadTicket>,
    last_load_error: Option<GridError>,

    history: VecDeque<IntentRecord>,
}

impl Default for GridController {
    fn default() -> Self {
        Self::new(ColumnSet::comment_grid(), Query::default())
    }
}

impl GridController {
    /// `query` is the initial query; its sort stays in effect across loads.
    pub fn new(columns: ColumnSet, query: Query) -> Self {
        info!(
            "GridController: created with {} columns, sort {} {}, page size {}",
            columns.len(),
            query.sort_column(),
            query.sort_direction(),
            query.page_size()
        );
        Self {
            session: EditSession::new(columns.clone()),
            columns,
            store: RecordStore::new(),
            delete_gate: DeleteConfirmationGate::new(),
            query,
            view_cache: OnceCell::new(),
            last_ticket: 0,
            in_flight: None,
            last_load_error: None,
            history: VecDeque::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ColumnSet::comment_grid(), config.view.initial_query())
    }

    // ---- loading ----

    /// Issue the ticket for a new fetch. The grid counts as loading until
    /// this ticket is applied.
    pub fn next_load_ticket(&mut self) -> LoadTicket {
        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        self.in_flight = Some(ticket);
        debug!("GridController: issued load ticket {}", ticket);
        ticket
    }

    /// Apply a finished fetch. Results for tickets older than the last
    /// applied load are dropped as stale, successes and failures alike.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: GridResult<Vec<RawRecord>>,
    ) -> GridResult<LoadOutcome> {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        if let Some(current) = self.store.last_applied_seq() {
            if ticket.0 < current {
                warn!(
                    "GridController: ignoring result of stale load {} (last applied #{})",
                    ticket, current
                );
                return Ok(LoadOutcome::Stale {
                    seq: ticket.0,
                    current,
                });
            }
        }

        match result {
            Ok(raw) => {
                let outcome = self.store.load(to_records(&raw), ticket.0);
                if let LoadOutcome::Applied { .. } = outcome {
                    self.last_load_error = None;
                    self.invalidate_view();
                }
                Ok(outcome)
            }
            Err(e) => {
                warn!(
                    "GridController: load {} failed, keeping {} records: {}",
                    ticket,
                    self.store.len(),
                    e
                );
                self.last_load_error = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Fetch from `source` and apply the result in one step
    pub async fn load_from<S: DataSource>(&mut self, source: &S) -> GridResult<LoadOutcome> {
        let ticket = self.next_load_ticket();
        info!(
            "GridController: loading {} from {}",
            ticket,
            source.describe()
        );
        let result = source.fetch_all().await;
        self.apply_load(ticket, result)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn last_load_error(&self) -> Option<&GridError> {
        self.last_load_error.as_ref()
    }

    // ---- intents ----

    /// Route an intent to its handler and record it in the history
    pub fn dispatch(&mut self, intent: GridIntent) -> GridResult<IntentOutcome> {
        debug!("GridController: dispatching {:?}", intent);

        let result = match intent.clone() {
            GridIntent::BeginEdit { key } => self
                .begin_edit(key)
                .map(|_| IntentOutcome::EditStarted(key)),
            GridIntent::UpdateField { key, name, value } => self
                .update_field(key, &name, value)
                .map(|_| IntentOutcome::FieldUpdated { key, name }),
            GridIntent::Save { key } => self.save(key).map(IntentOutcome::Saved),
            GridIntent::Cancel => Ok(IntentOutcome::Cancelled(self.cancel())),
            GridIntent::RequestDelete { key } => self
                .request_delete(key)
                .map(|_| IntentOutcome::DeleteRequested(key)),
            GridIntent::ConfirmDelete { key } => {
                self.confirm_delete(key).map(IntentOutcome::Deleted)
            }
            GridIntent::CancelDelete { key } => Ok(IntentOutcome::DeleteCancelled {
                key,
                was_pending: self.cancel_delete(key),
            }),
            GridIntent::SetSearch { column, text } => self
                .set_search(column, text)
                .map(|_| self.query_changed()),
            GridIntent::SetColumnFilter { column, values } => {
                self.set_column_filter(column, values);
                Ok(self.query_changed())
            }
            GridIntent::SetSort { column, direction } => {
                self.set_sort(column, direction);
                Ok(self.query_changed())
            }
            GridIntent::SetPage(page) => Ok(IntentOutcome::QueryChanged {
                page: self.set_page(page),
            }),
        };

        if let Err(e) = &result {
            warn!("GridController: {:?} rejected: {}", intent, e);
        }
        self.record_intent(intent, result.is_ok());
        result
    }

    /// Open the edit session on `key`, seeded with the record's current values
    pub fn begin_edit(&mut self, key: RecordKey) -> GridResult<()> {
        if let Some(active) = self.session.editing_key() {
            return Err(GridError::SessionBusy { active });
        }
        let initial = self
            .store
            .get(key)
            .map(|record| record.fields.clone())
            .ok_or(GridError::NotFound(key))?;
        self.session.begin(key, initial)
    }

    pub fn update_field(&mut self, key: RecordKey, name: &str, value: FieldValue) -> GridResult<()> {
        self.ensure_editing(key)?;
        self.session.update_field(name, value)
    }

    /// Validate and commit the draft for `key`
    pub fn save(&mut self, key: RecordKey) -> GridResult<RecordKey> {
        self.ensure_editing(key)?;
        let result = self.session.save(&mut self.store);
        if result.is_ok() {
            self.invalidate_view();
        }
        result
    }

    pub fn cancel(&mut self) -> Option<RecordKey> {
        self.session.cancel()
    }

    pub fn request_delete(&mut self, key: RecordKey) -> GridResult<()> {
        self.delete_gate.request_delete(key, &self.session)
    }

    pub fn confirm_delete(&mut self, key: RecordKey) -> GridResult<DeleteOutcome> {
        let outcome = self
            .delete_gate
            .confirm_delete(key, &self.session, &mut self.store)?;
        if outcome.is_removed() {
            self.invalidate_view();
        }
        Ok(outcome)
    }

    pub fn cancel_delete(&mut self, key: RecordKey) -> bool {
        self.delete_gate.cancel_delete(key)
    }

    /// Search `column` for `text`; empty text clears the search. Resets to page 1.
    ///
    /// Only columns marked searchable accept a search.
    pub fn set_search(
        &mut self,
        column: impl Into<String>,
        text: impl Into<String>,
    ) -> GridResult<()> {
        let column = column.into();
        let text = text.into();
        if text.is_empty() {
            self.query.clear_search();
        } else {
            match self.columns.get(&column) {
                None => return Err(GridError::UnknownColumn(column)),
                Some(spec) if !spec.searchable => return Err(GridError::NotSearchable(column)),
                Some(_) => self.query.set_search(column, text),
            }
        }
        self.invalidate_view();
        Ok(())
    }

    /// Replace the accepted values of one column. Resets to page 1.
    pub fn set_column_filter(&mut self, column: impl Into<String>, values: BTreeSet<String>) {
        self.query.set_column_filter(column, values);
        self.invalidate_view();
    }

    pub fn set_sort(&mut self, column: impl Into<String>, direction: SortDirection) {
        self.query.set_sort(column, direction);
        self.invalidate_view();
    }

    /// Move to page `page`, clamped to the available pages. Returns the page shown.
    pub fn set_page(&mut self, page: usize) -> usize {
        self.query.set_page(page);
        self.invalidate_view();
        let effective = self.view().page();
        if effective != page {
            debug!("GridController: page {} clamped to {}", page, effective);
            self.query.set_page(effective);
        }
        effective
    }

    // ---- reads ----

    /// Current derived view, computed on first use after a change
    pub fn view(&self) -> Arc<GridView> {
        self.view_cache
            .get_or_init(|| {
                debug!(
                    "GridController: rebuilding view (revision {})",
                    self.store.revision()
                );
                Arc::new(GridView::build(
                    self.store.snapshot(),
                    &self.query,
                    &self.columns,
                ))
            })
            .clone()
    }

    pub fn render_state(&self) -> RenderState {
        let view = self.view();
        RenderState {
            rows: view.rows().into_iter().cloned().collect(),
            columns: self.columns.clone(),
            session: self.session.state().clone(),
            pending_delete: self.delete_gate.pending(),
            highlights: view.highlights().to_vec(),
            page: view.page(),
            page_count: view.page_count(),
            total_rows: view.total_rows(),
            loading: self.is_loading(),
            load_error: self.last_load_error.clone(),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn pending_delete(&self) -> Option<RecordKey> {
        self.delete_gate.pending()
    }

    /// Most recent intents, oldest first
    pub fn intent_history(&self) -> impl Iterator<Item = &IntentRecord> {
        self.history.iter()
    }

    // ---- internals ----

    fn ensure_editing(&self, key: RecordKey) -> GridResult<()> {
        match self.session.editing_key() {
            Some(active) if active == key => Ok(()),
            _ => Err(GridError::NotEditing(key)),
        }
    }

    fn query_changed(&mut self) -> IntentOutcome {
        IntentOutcome::QueryChanged {
            page: self.view().page(),
        }
    }

    fn invalidate_view(&mut self) {
        self.view_cache.take();
    }

    fn record_intent(&mut self, intent: GridIntent, succeeded: bool) {
        self.history.push_back(IntentRecord { intent, succeeded });
        if self.history.len() > MAX_INTENT_HISTORY {
            self.history.pop_front();
        }
    }
}

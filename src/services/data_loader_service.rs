use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::grid_controller::{GridController, LoadTicket};
use crate::data::data_source::{DataSource, RawRecord};
use crate::data::record_store::LoadOutcome;
use crate::error::{GridError, GridResult};

/// Service responsible for running fetches in the background.
///
/// Each fetch runs as its own tokio task; results come back over a channel in
/// the order the fetches finish. The owner of the `GridController` drains the
/// channel and applies completions one at a time, so the controller itself is
/// never shared.
pub struct DataLoaderService {
    sender: mpsc::UnboundedSender<LoadCompletion>,
    receiver: mpsc::UnboundedReceiver<LoadCompletion>,
    /// Fetches spawned but not yet received
    pending: usize,
}

impl Default for DataLoaderService {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoaderService {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver,
            pending: 0,
        }
    }

    /// Issue a ticket on `grid` and fetch from `source` in the background
    pub fn start_load<S>(&mut self, grid: &mut GridController, source: Arc<S>) -> LoadTicket
    where
        S: DataSource + 'static,
    {
        let ticket = grid.next_load_ticket();
        self.spawn_load(ticket, source);
        ticket
    }

    /// Fetch from `source` under an already issued ticket
    pub fn spawn_load<S>(&mut self, ticket: LoadTicket, source: Arc<S>) -> JoinHandle<()>
    where
        S: DataSource + 'static,
    {
        self.pending += 1;
        let sender = self.sender.clone();
        info!(
            "DataLoaderService: load {} started from {}",
            ticket,
            source.describe()
        );

        tokio::spawn(async move {
            let start = Instant::now();
            // a fetch that panics still has to report back, or `pending` never drains
            let fetch = tokio::spawn(async move { source.fetch_all().await });
            let result = match fetch.await {
                Ok(result) => result,
                Err(e) => {
                    warn!("DataLoaderService: load {} aborted: {}", ticket, e);
                    Err(GridError::LoadFailed(format!("load task failed: {}", e)))
                }
            };
            let completion = LoadCompletion {
                ticket,
                result,
                elapsed: start.elapsed(),
            };
            debug!("DataLoaderService: {}", completion.status_message());
            // receiver gone means the grid was dropped; nothing left to update
            let _ = sender.send(completion);
        })
    }

    /// Wait for the next finished fetch. `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<LoadCompletion> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.receiver.recv().await?;
        self.pending -= 1;
        Some(completion)
    }

    /// Wait for the next finished fetch and apply it to `grid`
    pub async fn apply_next(&mut self, grid: &mut GridController) -> Option<GridResult<LoadOutcome>> {
        let completion = self.next_completion().await?;
        Some(completion.apply_to(grid))
    }

    /// Apply every remaining fetch in completion order
    pub async fn drain(&mut self, grid: &mut GridController) -> Vec<GridResult<LoadOutcome>> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.apply_next(grid).await {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}

/// Result of one background fetch
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: GridResult<Vec<RawRecord>>,
    /// Time taken by the fetch
    pub elapsed: Duration,
}

impl LoadCompletion {
    pub fn apply_to(self, grid: &mut GridController) -> GridResult<LoadOutcome> {
        grid.apply_load(self.ticket, self.result)
    }

    pub fn status_message(&self) -> String {
        match &self.result {
            Ok(records) => format!(
                "load {} fetched {} records in {} ms",
                self.ticket,
                records.len(),
                self.elapsed.as_millis()
            ),
            Err(e) => format!(
                "load {} failed after {} ms: {}",
                self.ticket,
                self.elapsed.as_millis(),
                e
            ),
        }
    }
}

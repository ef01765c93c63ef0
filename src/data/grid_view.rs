use std::sync::Arc;

use crate::data::column::ColumnSet;
use crate::data::pagination::PaginationWindow;
use crate::data::query::Query;
use crate::data::record::{Record, RecordKey};
use crate::data::search_filter::{HighlightSpan, SearchFilterEngine};
use crate::data::sort_engine::SortEngine;

/// A derived view over a record snapshot: search and filters, then sort,
/// then one page. The snapshot itself is never modified.
#[derive(Debug, Clone)]
pub struct GridView {
    /// The snapshot this view was computed from
    source: Arc<Vec<Record>>,

    /// Indices into `source` that pass search and filters, in sorted order
    visible_rows: Vec<usize>,

    /// Effective (clamped) page
    page: usize,

    window: PaginationWindow,

    highlights: Vec<HighlightSpan>,
}

impl GridView {
    pub fn build(source: Arc<Vec<Record>>, query: &Query, columns: &ColumnSet) -> Self {
        let search = SearchFilterEngine::new(columns.clone());
        let mut visible_rows = search.filter(&source, query);

        SortEngine::new(columns.clone()).sort(
            &source,
            &mut visible_rows,
            query.sort_column(),
            query.sort_direction(),
        );

        let window = PaginationWindow::new(query.page_size());
        let page = window.clamp_page(query.page(), visible_rows.len());

        let highlights = search.highlights(
            window
                .slice(&visible_rows, page)
                .iter()
                .map(|&idx| &source[idx]),
            query,
        );

        Self {
            source,
            visible_rows,
            page,
            window,
            highlights,
        }
    }

    /// Number of rows on the current page
    pub fn row_count(&self) -> usize {
        self.page_rows().len()
    }

    /// Number of rows passing search and filters, across all pages
    pub fn total_rows(&self) -> usize {
        self.visible_rows.len()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.window.page_count(self.visible_rows.len())
    }

    pub fn page_size(&self) -> usize {
        self.window.page_size()
    }

    /// Get a row of the current page by position
    pub fn get_row(&self, index: usize) -> Option<&Record> {
        let row_idx = *self.page_rows().get(index)?;
        self.source.get(row_idx)
    }

    /// Records on the current page, in display order
    pub fn rows(&self) -> Vec<&Record> {
        self.page_rows().iter().map(|&idx| &self.source[idx]).collect()
    }

    /// Keys of every row passing search and filters, in sorted order
    pub fn visible_keys(&self) -> Vec<RecordKey> {
        self.visible_rows
            .iter()
            .map(|&idx| self.source[idx].key)
            .collect()
    }

    /// Highlight spans for rows on the current page
    pub fn highlights(&self) -> &[HighlightSpan] {
        &self.highlights
    }

    fn page_rows(&self) -> &[usize] {
        self.window.slice(&self.visible_rows, self.page)
    }
}

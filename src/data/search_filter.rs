//! SearchFilterEngine - text search and column filters over a record snapshot
//!
//! Search is a case-insensitive substring match on one column. Column filters
//! are AND across columns and OR across the accepted values of one column.
//! For rows that match a search, the engine also reports where the match is
//! so a renderer can highlight it.

use crate::data::column::ColumnSet;
use crate::data::query::Query;
use crate::data::record::{Record, RecordKey};
use tracing::trace;

/// Location of the search match inside a cell's displayed text.
/// Offsets are byte offsets into the stringified value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightSpan {
    pub key: RecordKey,
    pub field: String,
    pub start: usize,
    pub len: usize,
}

impl HighlightSpan {
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

#[derive(Debug, Clone)]
pub struct SearchFilterEngine {
    columns: ColumnSet,
}

impl SearchFilterEngine {
    pub fn new(columns: ColumnSet) -> Self {
        Self { columns }
    }

    /// Indices into `records` that pass the search and every column filter,
    /// in their original order
    pub fn filter(&self, records: &[Record], query: &Query) -> Vec<usize> {
        let visible: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record, query))
            .map(|(idx, _)| idx)
            .collect();

        trace!(
            "SearchFilterEngine: {} of {} records visible",
            visible.len(),
            records.len()
        );
        visible
    }

    pub fn matches(&self, record: &Record, query: &Query) -> bool {
        self.matches_search(record, query) && self.matches_filters(record, query)
    }

    fn matches_search(&self, record: &Record, query: &Query) -> bool {
        match query.active_search() {
            Some((column, text)) => record
                .get(column)
                .map(|value| find_case_insensitive(&value.to_string(), text).is_some())
                .unwrap_or(false),
            None => true,
        }
    }

    fn matches_filters(&self, record: &Record, query: &Query) -> bool {
        query.column_filters().iter().all(|(column, accepted)| {
            if accepted.is_empty() {
                return true;
            }
            let cell = match record.get(column) {
                Some(value) => value.to_string(),
                None => return false,
            };
            accepted.iter().any(|value| match self.columns.get(column) {
                Some(spec) => spec.filter_accepts(&cell, value),
                None => cell == *value,
            })
        })
    }

    /// Where the search text occurs in this record's search column
    pub fn highlight(&self, record: &Record, query: &Query) -> Option<HighlightSpan> {
        let (column, text) = query.active_search()?;
        let cell = record.get(column)?.to_string();
        let (start, len) = find_case_insensitive(&cell, text)?;
        Some(HighlightSpan {
            key: record.key,
            field: column.to_string(),
            start,
            len,
        })
    }

    pub fn highlights<'a, I>(&self, records: I, query: &Query) -> Vec<HighlightSpan>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        if query.active_search().is_none() {
            return Vec::new();
        }
        records
            .into_iter()
            .filter_map(|record| self.highlight(record, query))
            .collect()
    }
}

/// First case-insensitive occurrence of `needle` in `haystack`, as
/// (byte start, byte length) in the original `haystack`.
///
/// Folding happens per character so offsets stay valid even when lowercasing
/// changes the byte length of a character.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    let folded_needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if folded_needle.is_empty() {
        return Some((0, 0));
    }

    for (start, _) in haystack.char_indices() {
        let mut matched = 0;
        for (offset, ch) in haystack[start..].char_indices() {
            let mut folded = ch.to_lowercase();
            let all_match = folded.all(|c| {
                if matched < folded_needle.len() && folded_needle[matched] == c {
                    matched += 1;
                    true
                } else {
                    false
                }
            });
            if !all_match {
                break;
            }
            if matched == folded_needle.len() {
                let end = start + offset + ch.len_utf8();
                return Some((start, end - start));
            }
        }
    }
    None
}

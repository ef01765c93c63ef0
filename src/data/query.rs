use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascend" | "ascending" => Some(SortDirection::Ascending),
            "desc" | "descend" | "descending" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// Composed search/filter/sort/page parameters producing the derived view.
///
/// Changing the search text, search column or any column filter resets
/// `page` to 1. Fields are private so that rule cannot be bypassed.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    search_text: String,
    search_column: Option<String>,
    column_filters: BTreeMap<String, BTreeSet<String>>,
    sort_column: String,
    sort_direction: SortDirection,
    page: usize,
    page_size: usize,
}

impl Query {
    /// `page_size` of 0 is treated as 1
    pub fn new(page_size: usize, sort_column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            search_text: String::new(),
            search_column: None,
            column_filters: BTreeMap::new(),
            sort_column: sort_column.into(),
            sort_direction: direction,
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, column: impl Into<String>, text: impl Into<String>) {
        self.search_column = Some(column.into());
        self.search_text = text.into();
        self.page = 1;
    }

    pub fn clear_search(&mut self) {
        self.search_column = None;
        self.search_text.clear();
        self.page = 1;
    }

    /// An empty `values` set removes the column's filter
    pub fn set_column_filter(&mut self, column: impl Into<String>, values: BTreeSet<String>) {
        let column = column.into();
        if values.is_empty() {
            self.column_filters.remove(&column);
        } else {
            self.column_filters.insert(column, values);
        }
        self.page = 1;
    }

    pub fn set_sort(&mut self, column: impl Into<String>, direction: SortDirection) {
        self.sort_column = column.into();
        self.sort_direction = direction;
    }

    /// Stores the page as given; clamping against the data happens in the
    /// pagination window, which knows the row count
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn search_column(&self) -> Option<&str> {
        self.search_column.as_deref()
    }

    /// Search is active when both a column and non-empty text are set
    pub fn active_search(&self) -> Option<(&str, &str)> {
        match &self.search_column {
            Some(column) if !self.search_text.is_empty() => {
                Some((column.as_str(), self.search_text.as_str()))
            }
            _ => None,
        }
    }

    pub fn column_filters(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.column_filters
    }

    pub fn sort_column(&self) -> &str {
        &self.sort_column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new(50, "id", SortDirection::Ascending)
    }
}

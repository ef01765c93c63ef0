use std::ops::Range;

/// Fixed-size page slicing over a row count. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    page_size: usize,
}

impl PaginationWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages; an empty sequence still has one (empty) page
    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.page_size).max(1)
    }

    /// Nearest valid page for `page`
    pub fn clamp_page(&self, page: usize, total: usize) -> usize {
        page.clamp(1, self.page_count(total))
    }

    /// `[(page-1)*page_size, page*page_size)` clamped to `total`
    pub fn range(&self, page: usize, total: usize) -> Range<usize> {
        let page = self.clamp_page(page, total);
        let start = ((page - 1) * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn slice<'a, T>(&self, rows: &'a [T], page: usize) -> &'a [T] {
        &rows[self.range(page, rows.len())]
    }
}

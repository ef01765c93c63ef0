use std::cmp::Ordering;

use crate::data::column::ColumnSet;
use crate::data::field_compare::compare_optional_field_values;
use crate::data::query::SortDirection;
use crate::data::record::Record;

/// Orders row indices by one column. Ties keep their incoming order in both
/// directions (`sort_by` is stable and descending reverses only the comparison).
#[derive(Debug, Clone)]
pub struct SortEngine {
    columns: ColumnSet,
}

impl SortEngine {
    pub fn new(columns: ColumnSet) -> Self {
        Self { columns }
    }

    pub fn sort(
        &self,
        records: &[Record],
        rows: &mut [usize],
        column: &str,
        direction: SortDirection,
    ) {
        let spec = self.columns.get(column);
        rows.sort_by(|&a, &b| {
            let (ra, rb) = (&records[a], &records[b]);
            let cmp = match spec {
                Some(spec) => spec.compare(ra, rb),
                // Not a display column (e.g. postId): natural ordering of the raw field
                None => compare_optional_field_values(ra.get(column), rb.get(column)),
            };
            apply_direction(cmp, direction)
        });
    }
}

fn apply_direction(cmp: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => cmp,
        SortDirection::Descending => cmp.reverse(),
    }
}

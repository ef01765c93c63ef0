//! Column configuration for the grid.
//!
//! A column is addressed by its field name everywhere else in the crate
//! (query, filters, drafts). Editability is a tagged kind rather than a flag,
//! so numeric validation always travels with numeric editing.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::data::field_compare::{compare_char_count, compare_optional_field_values};
use crate::data::record::{FieldValue, Record};
use crate::error::ValidationErrorKind;

/// How (and whether) a column can be edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    ReadOnly,
    TextEditable,
    NumericEditable,
}

/// Extra validation run after the built-in rules
pub type Validator = Arc<dyn Fn(&FieldValue) -> Result<(), ValidationErrorKind> + Send + Sync>;

/// Ordering used when a column is the active sort column
#[derive(Clone, Default)]
pub enum SortComparator {
    /// Numbers numerically, strings shorter-first then lexicographically
    #[default]
    Natural,
    Custom(Arc<dyn Fn(Option<&FieldValue>, Option<&FieldValue>) -> Ordering + Send + Sync>),
}

impl SortComparator {
    pub fn compare(&self, a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
        match self {
            SortComparator::Natural => compare_optional_field_values(a, b),
            SortComparator::Custom(cmp) => cmp(a, b),
        }
    }
}

impl fmt::Debug for SortComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortComparator::Natural => write!(f, "Natural"),
            SortComparator::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// How an accepted filter value is matched against a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMatch {
    #[default]
    Exact,
    Contains,
}

/// One entry of a column's filter menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
    pub matching: FilterMatch,
}

impl FilterOption {
    pub fn contains(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            matching: FilterMatch::Contains,
        }
    }
}

#[derive(Clone)]
pub struct ColumnSpec {
    pub title: String,
    pub field: String,
    pub kind: ColumnKind,
    pub searchable: bool,
    pub comparator: Option<SortComparator>,
    pub filter_options: Vec<FilterOption>,
    validator: Option<Validator>,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("title", &self.title)
            .field("field", &self.field)
            .field("kind", &self.kind)
            .field("searchable", &self.searchable)
            .field("comparator", &self.comparator)
            .field("filter_options", &self.filter_options)
            .field("validator", &self.validator.as_ref().map(|_| ".."))
            .finish()
    }
}

impl ColumnSpec {
    pub fn new(title: impl Into<String>, field: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            title: title.into(),
            field: field.into(),
            kind,
            searchable: false,
            comparator: None,
            filter_options: Vec::new(),
            validator: None,
        }
    }

    pub fn read_only(title: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(title, field, ColumnKind::ReadOnly)
    }

    pub fn text(title: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(title, field, ColumnKind::TextEditable)
    }

    pub fn numeric(title: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(title, field, ColumnKind::NumericEditable)
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn with_comparator(mut self, comparator: SortComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn with_filter_option(mut self, option: FilterOption) -> Self {
        self.filter_options.push(option);
        self
    }

    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&FieldValue) -> Result<(), ValidationErrorKind> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self.kind, ColumnKind::ReadOnly)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ColumnKind::NumericEditable)
    }

    /// Built-in rules first (required, numeric), then the custom validator
    pub fn validate(&self, value: &FieldValue) -> Result<(), ValidationErrorKind> {
        if value.is_blank() {
            return Err(ValidationErrorKind::MissingRequiredField);
        }
        if self.is_numeric() {
            let finite = match value {
                FieldValue::Integer(_) => true,
                FieldValue::Float(f) => f.is_finite(),
                FieldValue::Text(text) => FieldValue::parse_number(text).is_some(),
            };
            if !finite {
                return Err(ValidationErrorKind::InvalidNumericFormat);
            }
        }
        match &self.validator {
            Some(validator) => validator(value),
            None => Ok(()),
        }
    }

    /// Normalise a validated draft value for storage: numeric columns store numbers
    pub fn coerce(&self, value: FieldValue) -> FieldValue {
        if !self.is_numeric() {
            return value;
        }
        match &value {
            FieldValue::Text(text) => FieldValue::parse_number(text).unwrap_or(value),
            _ => value,
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let comparator = self.comparator.as_ref().unwrap_or(&SortComparator::Natural);
        comparator.compare(a.get(&self.field), b.get(&self.field))
    }

    /// Does the stringified `cell` satisfy the accepted filter value?
    pub fn filter_accepts(&self, cell: &str, accepted: &str) -> bool {
        let matching = self
            .filter_options
            .iter()
            .find(|option| option.value == accepted)
            .map(|option| option.matching)
            .unwrap_or_default();

        match matching {
            FilterMatch::Exact => cell == accepted,
            FilterMatch::Contains => cell.contains(accepted),
        }
    }
}

/// The ordered set of columns shown by the grid
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Arc<Vec<ColumnSpec>>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns: Arc::new(columns),
        }
    }

    /// The comment grid: id, name, email, age, comment
    pub fn comment_grid() -> Self {
        Self::new(vec![
            ColumnSpec::read_only("ID", "id"),
            ColumnSpec::text("Name", "name").searchable(),
            ColumnSpec::text("Email", "email")
                .with_filter_option(FilterOption::contains("@gardner.biz"))
                .with_filter_option(FilterOption::contains("@sydney.com")),
            ColumnSpec::numeric("Age", "age"),
            ColumnSpec::text("Comment", "body")
                .with_comparator(SortComparator::Custom(Arc::new(compare_char_count))),
        ])
    }

    pub fn get(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter()
    }

    pub fn editable(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.is_editable())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Default for ColumnSet {
    fn default() -> Self {
        Self::comment_grid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::field_compare::compare_field_values;

    #[test]
    fn test_required_rule() {
        let column = ColumnSpec::text("Name", "name");
        assert_eq!(
            column.validate(&FieldValue::from("  ")),
            Err(ValidationErrorKind::MissingRequiredField)
        );
        assert_eq!(column.validate(&FieldValue::from("Alice")), Ok(()));
    }

    #[test]
    fn test_numeric_rule() {
        let column = ColumnSpec::numeric("Age", "age");
        assert_eq!(
            column.validate(&FieldValue::from("twenty")),
            Err(ValidationErrorKind::InvalidNumericFormat)
        );
        assert_eq!(column.validate(&FieldValue::from("21")), Ok(()));
        assert_eq!(column.validate(&FieldValue::Integer(21)), Ok(()));
        assert_eq!(column.coerce(FieldValue::from("21")), FieldValue::Integer(21));
    }

    #[test]
    fn test_numeric_rule_rejects_non_finite() {
        let column = ColumnSpec::numeric("Age", "age");
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                column.validate(&FieldValue::Float(value)),
                Err(ValidationErrorKind::InvalidNumericFormat)
            );
        }
        assert_eq!(
            column.validate(&FieldValue::from("inf")),
            Err(ValidationErrorKind::InvalidNumericFormat)
        );
        assert_eq!(column.validate(&FieldValue::Float(20.5)), Ok(()));
        // text columns keep whatever was typed
        assert_eq!(ColumnSpec::text("Name", "name").validate(&FieldValue::from("NaN")), Ok(()));
    }

    #[test]
    fn test_custom_validator_runs_after_builtin_rules() {
        let column = ColumnSpec::text("Email", "email").with_validator(|value| {
            if value.to_string().contains('@') {
                Ok(())
            } else {
                Err(ValidationErrorKind::Rejected("not an email".to_string()))
            }
        });

        assert_eq!(
            column.validate(&FieldValue::from("")),
            Err(ValidationErrorKind::MissingRequiredField)
        );
        assert_eq!(
            column.validate(&FieldValue::from("nobody")),
            Err(ValidationErrorKind::Rejected("not an email".to_string()))
        );
        assert_eq!(column.validate(&FieldValue::from("a@b.c")), Ok(()));
    }

    #[test]
    fn test_filter_matching_modes() {
        let columns = ColumnSet::comment_grid();
        let email = columns.get("email").unwrap();
        assert!(email.filter_accepts("Eliseo@gardner.biz", "@gardner.biz"));
        assert!(!email.filter_accepts("Jayne@sydney.com", "@gardner.biz"));
        // Values without a declared option match exactly
        assert!(email.filter_accepts("x@y.z", "x@y.z"));
        assert!(!email.filter_accepts("x@y.zz", "x@y.z"));
    }

    #[test]
    fn test_comment_grid_layout() {
        let columns = ColumnSet::comment_grid();
        let editable: Vec<_> = columns.editable().map(|c| c.field.as_str()).collect();
        assert_eq!(editable, vec!["name", "email", "age", "body"]);
        assert!(!columns.get("id").unwrap().is_editable());
        assert!(columns.get("name").unwrap().searchable);
    }

    #[test]
    fn test_custom_comparator() {
        let column = ColumnSpec::read_only("ID", "id").with_comparator(SortComparator::Custom(
            Arc::new(|a: Option<&FieldValue>, b: Option<&FieldValue>| {
                compare_optional_field_values(b, a)
            }),
        ));
        let a = Record::new(1).with_field("id", 1);
        let b = Record::new(2).with_field("id", 2);
        assert_eq!(column.compare(&a, &b), Ordering::Greater);
        assert_eq!(
            compare_field_values(a.get("id").unwrap(), b.get("id").unwrap()),
            Ordering::Less
        );
    }
}

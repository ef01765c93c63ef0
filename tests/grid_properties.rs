//! Property-based tests for the grid controller.
//!
//! These check the invariants that must hold for any sequence of intents:
//! - at most one record is ever being edited
//! - failed saves and cancels never touch the store
//! - deletes are idempotent
//! - sorting is stable and every visible row matches the query
//! - pages never exceed the page size, and the newest load always wins

use proptest::prelude::*;
use record_grid::data::column::ColumnSet;
use record_grid::data::data_source::RawRecord;
use record_grid::data::query::{Query, SortDirection};
use record_grid::data::record::RecordKey;
use record_grid::data::record_store::DeleteOutcome;
use record_grid::error::GridError;
use record_grid::GridController;
use std::collections::BTreeSet;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn word_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[abcAB ]{1,8}").unwrap()
}

/// Records with ids 1..=n in a shuffled order
fn batch_strategy(max: usize) -> impl Strategy<Value = Vec<RawRecord>> {
    prop::collection::vec(word_strategy(), 0..max)
        .prop_map(|names| {
            names
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let id = i as i64 + 1;
                    RawRecord::new(id, name, &format!("u{}@gardner.biz", id), name)
                })
                .collect::<Vec<_>>()
        })
        .prop_shuffle()
}

#[derive(Debug, Clone)]
enum EditOp {
    Begin(i64),
    Update(String),
    Blank,
    Save,
    Cancel,
}

fn edit_op_strategy() -> impl Strategy<Value = EditOp> {
    prop_oneof![
        (1i64..8).prop_map(EditOp::Begin),
        word_strategy().prop_map(EditOp::Update),
        Just(EditOp::Blank),
        Just(EditOp::Save),
        Just(EditOp::Cancel),
    ]
}

fn loaded(batch: Vec<RawRecord>, page_size: usize) -> GridController {
    let mut grid = GridController::new(
        ColumnSet::comment_grid(),
        Query::new(page_size, "id", SortDirection::Ascending),
    );
    let ticket = grid.next_load_ticket();
    grid.apply_load(ticket, Ok(batch)).unwrap();
    grid
}

fn five_records() -> Vec<RawRecord> {
    (1..=5)
        .map(|id| RawRecord::new(id, &format!("name {}", id), "x@sydney.com", "body"))
        .collect()
}

// =============================================================================
// EDIT SESSION PROPERTIES
// =============================================================================

mod edit_session_properties {
    use super::*;

    proptest! {
        /// The controller's session always agrees with a single-slot model
        #[test]
        fn at_most_one_record_editing(ops in prop::collection::vec(edit_op_strategy(), 0..40)) {
            let mut grid = loaded(five_records(), 50);
            let mut model: Option<RecordKey> = None;

            for op in ops {
                match op {
                    EditOp::Begin(id) => {
                        let key = RecordKey(id);
                        let result = grid.begin_edit(key);
                        match model {
                            Some(active) => {
                                prop_assert_eq!(result, Err(GridError::SessionBusy { active }));
                            }
                            None if id <= 5 => {
                                prop_assert!(result.is_ok());
                                model = Some(key);
                            }
                            None => prop_assert_eq!(result, Err(GridError::NotFound(key))),
                        }
                    }
                    EditOp::Update(text) => {
                        if let Some(key) = model {
                            grid.update_field(key, "name", text.into()).unwrap();
                        }
                    }
                    EditOp::Blank => {
                        if let Some(key) = model {
                            grid.update_field(key, "name", "".into()).unwrap();
                        }
                    }
                    EditOp::Save => {
                        if let Some(key) = model {
                            let before = grid.store().snapshot();
                            match grid.save(key) {
                                Ok(_) => model = None,
                                Err(GridError::ValidationFailed(_)) => {
                                    prop_assert_eq!(&*grid.store().snapshot(), &*before);
                                }
                                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                            }
                        }
                    }
                    EditOp::Cancel => {
                        let before = grid.store().snapshot();
                        prop_assert_eq!(grid.cancel(), model.take());
                        prop_assert_eq!(&*grid.store().snapshot(), &*before);
                    }
                }
                prop_assert_eq!(grid.session().editing_key(), model);
                prop_assert_eq!(grid.session().draft().is_some(), model.is_some());
            }
        }

        /// Deleting the same key twice: the second delete changes nothing
        #[test]
        fn delete_is_idempotent(id in 0i64..8) {
            let mut grid = loaded(five_records(), 50);
            let key = RecordKey(id);

            grid.request_delete(key).unwrap();
            let first = grid.confirm_delete(key).unwrap();
            prop_assert_eq!(first.is_removed(), (1..=5).contains(&id));
            let after_first = grid.store().snapshot();

            let second = grid.confirm_delete(key).unwrap();
            prop_assert_eq!(second, DeleteOutcome::NotFound(key));
            prop_assert_eq!(&*grid.store().snapshot(), &*after_first);
            prop_assert!(!grid.store().contains(key));
        }
    }
}

// =============================================================================
// DERIVED VIEW PROPERTIES
// =============================================================================

mod view_properties {
    use super::*;

    proptest! {
        /// Equal sort keys keep their load order, in both directions
        #[test]
        fn sort_is_stable(
            batch in batch_strategy(40),
            descending in any::<bool>(),
        ) {
            let mut grid = loaded(batch.clone(), 1000);
            let direction = if descending { SortDirection::Descending } else { SortDirection::Ascending };
            grid.set_sort("age", direction);

            let load_position = |id: i64| batch.iter().position(|r| r.id == id);
            let rows = grid.render_state().rows;
            for pair in rows.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if a.get("age") == b.get("age") {
                    prop_assert!(load_position(a.key.0) < load_position(b.key.0));
                }
            }
        }

        /// The view holds exactly the records matching search and filters
        #[test]
        fn view_matches_query_exactly(
            batch in batch_strategy(40),
            needle in "[abAB]{1,2}",
            ages in prop::collection::btree_set(20i64..26, 0..3),
        ) {
            let mut grid = loaded(batch.clone(), 1000);
            grid.set_search("name", needle.clone()).unwrap();
            grid.set_column_filter("age", ages.iter().map(|a| a.to_string()).collect::<BTreeSet<_>>());

            let expected: BTreeSet<i64> = batch
                .iter()
                .filter(|r| r.name.to_lowercase().contains(&needle.to_lowercase()))
                .filter(|r| ages.is_empty() || ages.contains(&(20 + r.id % 6)))
                .map(|r| r.id)
                .collect();

            let view = grid.view();
            let visible: BTreeSet<i64> = view.visible_keys().iter().map(|k| k.0).collect();
            prop_assert_eq!(visible, expected);
        }

        /// Pages never exceed the page size and together cover every row once
        #[test]
        fn pages_partition_rows(
            batch in batch_strategy(60),
            page_size in 1usize..15,
            requested in 0usize..20,
        ) {
            let total = batch.len();
            let mut grid = loaded(batch, page_size);

            let shown = grid.set_page(requested);
            let state = grid.render_state();
            prop_assert!(state.rows.len() <= page_size);
            prop_assert!(shown >= 1 && shown <= state.page_count);

            let mut seen = Vec::new();
            for page in 1..=state.page_count {
                grid.set_page(page);
                seen.extend(grid.render_state().rows.iter().map(|r| r.key));
            }
            prop_assert_eq!(seen.len(), total);
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), total);
        }

        /// Changing the search always lands on page 1
        #[test]
        fn search_change_resets_page(
            page in 1usize..10,
            needle in "[ab]{0,2}",
        ) {
            let batch: Vec<RawRecord> = (1..=100)
                .map(|id| RawRecord::new(id, "ab", "x@gardner.biz", "c"))
                .collect();
            let mut grid = loaded(batch, 10);
            grid.set_page(page);
            grid.set_search("name", needle).unwrap();
            prop_assert_eq!(grid.query().page(), 1);
            prop_assert_eq!(grid.render_state().page, 1);
        }
    }
}

// =============================================================================
// LOAD ORDERING PROPERTIES
// =============================================================================

mod load_properties {
    use super::*;

    proptest! {
        /// Whatever order completions arrive in, the newest ticket's batch ends up
        /// in the store once it has been applied
        #[test]
        fn newest_load_wins(order in Just((0usize..6).collect::<Vec<_>>()).prop_shuffle()) {
            let mut grid = GridController::default();
            let tickets: Vec<_> = (0..6).map(|_| grid.next_load_ticket()).collect();

            for idx in order {
                let ticket = tickets[idx];
                let batch = vec![RawRecord::new(ticket.0 as i64, "n", "e@gardner.biz", "b")];
                let _ = grid.apply_load(ticket, Ok(batch));
            }

            let newest = tickets[5];
            prop_assert_eq!(grid.store().last_applied_seq(), Some(newest.0));
            prop_assert!(grid.store().contains(RecordKey(newest.0 as i64)));
            prop_assert_eq!(grid.store().len(), 1);
            prop_assert!(!grid.is_loading());
        }
    }
}

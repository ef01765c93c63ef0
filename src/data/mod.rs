//! Data layer for the record grid
//!
//! Records and their store, the column configuration, and the engines that
//! derive a view (search and filters, sort, pagination) from a store snapshot.

// Core data modules
pub mod column;
pub mod field_compare;
pub mod record;
pub mod record_store;

// Derived view
pub mod grid_view;
pub mod pagination;
pub mod query;
pub mod search_filter;
pub mod sort_engine;

// Data source modules
pub mod data_source;

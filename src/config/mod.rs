//! Configuration module
//!
//! Settings for the data source, the initial view and logging.

pub mod config;

pub use config::Config;

//! Editable record grid
//!
//! A controller for a remotely loaded record collection shown as a table:
//! search, column filters, sorting and pagination over the current snapshot,
//! single-row editing with validation, and deletes gated behind confirmation.

pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod services;
pub mod state;
pub mod utils;

pub use crate::core::{GridController, LoadTicket, RenderState};
pub use crate::error::{GridError, GridResult};

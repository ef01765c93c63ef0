//! Core grid state management
//!
//! The controller owning the record store, the edit session and the query,
//! and turning intents into state changes.

pub mod grid_controller;

pub use grid_controller::{GridController, IntentRecord, LoadTicket, RenderState};

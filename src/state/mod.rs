//! State components owned by the grid controller
//!
//! The edit session and the delete gate are the only places that decide
//! whether a record may change; intents describe what a renderer asked for.

pub mod delete_gate;
pub mod edit_session;
pub mod events;

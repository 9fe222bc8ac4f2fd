//! Command handlers module
//!
//! One handler per bot command, dispatched from the closed command enum in
//! the binary entry point

pub mod admin;
pub mod help;
pub mod ledger;
pub mod start;

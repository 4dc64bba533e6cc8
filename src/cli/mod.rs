//! CLI command handlers

pub mod commands;

pub use commands::{column, run, test_formula, RunOptions};

//! Command-line interface for savoir-sync.

pub mod args;
pub mod commands;

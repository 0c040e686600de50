//! Output formatting for savoir-sync.
//!
//! This module provides formatters for displaying queue state in various formats.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::queue::{FlushReport, QueuedAction};

pub use json::*;
pub use pretty::*;

/// Format queued actions based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_actions(
    actions: &[QueuedAction],
    limit: usize,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_actions_pretty(actions, limit)),
        OutputFormat::Json => format_actions_json(&actions[..limit.min(actions.len())]),
    }
}

/// Format queue status based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_status(
    slot: &str,
    actions: &[QueuedAction],
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(actions)),
        OutputFormat::Json => format_status_json(slot, actions),
    }
}

/// Format a flush report based on output format
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_flush(report: &FlushReport, format: OutputFormat) -> Result<String, SyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_flush_report(report)),
        OutputFormat::Json => format_flush_json(report),
    }
}

//! JSON output formatting.

use serde::Serialize;
use serde_json::json;

use crate::error::SyncError;
use crate::queue::{FlushReport, QueuedAction};

/// Format queued actions as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_actions_json(actions: &[QueuedAction]) -> Result<String, SyncError> {
    let output = json!({
        "count": actions.len(),
        "items": actions
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format queue status as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_status_json(slot: &str, actions: &[QueuedAction]) -> Result<String, SyncError> {
    let output = json!({
        "slot": slot,
        "pending": actions.len(),
        "oldest_pending": actions.iter().map(|a| a.captured_at).min().map(|t| t.to_rfc3339()),
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Format a flush report as JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn format_flush_json(report: &FlushReport) -> Result<String, SyncError> {
    let output = json!({
        "attempted": report.attempted(),
        "delivered": report.delivered,
        "failed": report.failed,
        "dropped": report.dropped(),
        "requeued": report.requeued,
        "results": report.results,
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Serialize any value as pretty JSON
///
/// # Errors
///
/// Returns `SyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, SyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}

//! Watch command implementation.
//!
//! Runs a session driven by a background connectivity monitor. Every
//! transition back to reachable replays the offline queue.

use std::sync::mpsc;
use std::time::Duration;

use colored::Colorize;
use serde_json::json;
use tracing::info;

use super::AppContext;
use crate::cli::args::OutputFormat;
use crate::connectivity::ConnectivityMonitor;
use crate::error::SyncError;
use crate::output::to_json;
use crate::session::{RunSummary, SessionEvent};

/// Watch connectivity and replay the queue on every reconnect.
///
/// With `once`, returns after the first completed replay.
///
/// # Errors
///
/// Returns an error if the endpoint URL cannot be probed.
pub fn watch(
    ctx: &AppContext,
    interval: Option<u64>,
    once: bool,
    format: OutputFormat,
) -> Result<String, SyncError> {
    let interval = interval.map_or_else(|| ctx.config.connectivity.interval(), Duration::from_secs);
    let probe = ctx.probe()?;

    // Both sides start offline so the first reachable probe flushes.
    let mut session = ctx.session(false);
    let (tx, rx) = mpsc::channel::<SessionEvent>();
    let monitor = ConnectivityMonitor::new(probe, false).spawn(interval, tx);

    info!(
        pending = session.queue().len(),
        interval_secs = interval.as_secs(),
        "watching connectivity"
    );

    let summary = if once {
        session.run_until(&rx, 1)
    } else {
        session.run(&rx)
    };
    monitor.stop();

    format_summary(&summary, session.queue().len(), format)
}

fn format_summary(
    summary: &RunSummary,
    pending: usize,
    format: OutputFormat,
) -> Result<String, SyncError> {
    match format {
        OutputFormat::Json => to_json(&json!({
            "flushes": summary.flushes,
            "replayed": summary.replayed,
            "pending": pending,
        })),
        OutputFormat::Pretty => {
            let mut lines = vec![format!(
                "{} {} replay passes, {} actions synced",
                "✓".green(),
                summary.flushes,
                summary.replayed
            )];
            if pending > 0 {
                lines.push(format!("  {pending} still queued").dimmed().to_string());
            }
            Ok(lines.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_summary_json() {
        let summary = RunSummary {
            flushes: 1,
            replayed: 3,
            ..RunSummary::default()
        };

        let output = format_summary(&summary, 0, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["flushes"], 1);
        assert_eq!(value["replayed"], 3);
        assert_eq!(value["pending"], 0);
    }

    #[test]
    fn test_format_summary_pretty_mentions_pending() {
        colored::control::set_override(false);
        let summary = RunSummary::default();

        let output = format_summary(&summary, 2, OutputFormat::Pretty).unwrap();

        assert!(output.contains("0 replay passes"));
        assert!(output.contains("2 still queued"));
    }
}

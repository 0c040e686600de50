use chrono::Utc;
use colored::Colorize;

use crate::queue::{FlushReport, QueuedAction};

/// Format queued actions as a table, in replay order
pub fn format_actions_pretty(actions: &[QueuedAction], limit: usize) -> String {
    if actions.is_empty() {
        return "Offline queue (0 actions)\n  Nothing waiting to sync".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("Offline queue ({} actions)", actions.len()));
    lines.push("─".repeat(60));
    lines.push(format!("{:<4} {:<20} {:<18} {}", "#", "Captured", "Kind", "Target"));
    lines.push("─".repeat(60));

    for (position, action) in actions.iter().enumerate().take(limit) {
        lines.push(format!(
            "{:<4} {:<20} {:<18} {}",
            position + 1,
            action.captured_at.format("%Y-%m-%d %H:%M:%S"),
            action.kind.display_name(),
            action.target.bold()
        ));

        if !action.payload.is_empty() {
            let fields = action
                .payload
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            lines.push(format!("     {}", fields.dimmed()));
        }
    }

    if actions.len() > limit {
        lines.push(format!("  … {} more", actions.len() - limit).dimmed().to_string());
    }

    lines.join("\n")
}

/// Format queue status
pub fn format_status_pretty(actions: &[QueuedAction]) -> String {
    let mut lines = Vec::new();

    lines.push("Offline Queue Status".bold().to_string());
    lines.push("─".repeat(40));
    lines.push(format!(
        "  Pending:    {} {}",
        actions.len(),
        if actions.is_empty() {
            "".dimmed()
        } else {
            "actions waiting".dimmed()
        }
    ));

    if let Some(oldest) = actions.iter().map(|a| a.captured_at).min() {
        let age = Utc::now().signed_duration_since(oldest);
        let age_str = if age.num_hours() > 0 {
            format!("{} hours ago", age.num_hours())
        } else if age.num_minutes() > 0 {
            format!("{} minutes ago", age.num_minutes())
        } else {
            "just now".to_string()
        };
        lines.push(format!("  Oldest:     {}", age_str.dimmed()));

        lines.push(String::new());
        lines.push(
            "Run 'savoir-sync flush' to replay queued actions"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format a flush report for display
pub fn format_flush_report(report: &FlushReport) -> String {
    if report.attempted() == 0 {
        return "No offline actions to sync.".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("Flush completed: {} actions", report.attempted()));
    lines.push("─".repeat(40));

    if report.delivered > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} delivered", report.delivered).green()
        ));
    }

    if report.dropped() > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} dropped", report.dropped()).red()
        ));
    }

    if report.requeued > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} kept for next sync", report.requeued).yellow()
        ));
    }

    let errors: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.error.is_some())
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for result in errors {
            lines.push(format!(
                "  - {}: {}",
                result.target,
                result.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}

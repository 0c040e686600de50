//! Submit command implementation.
//!
//! Delivers a form right away when the LMS answers a probe, otherwise
//! captures it in the offline queue.

use colored::Colorize;
use serde_json::json;
use tracing::debug;

use super::AppContext;
use crate::cli::args::{OutputFormat, SubmitArgs};
use crate::connectivity::Probe;
use crate::error::SyncError;
use crate::output::to_json;
use crate::queue::QueuedAction;
use crate::session::SubmitOutcome;

/// Submit a form, or queue it when offline.
///
/// # Errors
///
/// Returns the delivery error of a direct submission or the storage error
/// of a failed capture.
pub fn submit(ctx: &AppContext, args: SubmitArgs, format: OutputFormat) -> Result<String, SyncError> {
    let online = ctx.probe()?.is_reachable();
    debug!(online, target = %args.target, "submitting form");

    let action = QueuedAction::form_submission(args.target, args.fields.into_iter().collect());
    let target = action.target.clone();
    let mut session = ctx.session(online);

    match session.submit(action)? {
        SubmitOutcome::Delivered(body) => match format {
            OutputFormat::Json => to_json(&json!({
                "status": "delivered",
                "target": target,
                "response": body,
            })),
            OutputFormat::Pretty => Ok(format!(
                "{} Delivered to {}\n{}",
                "✓".green(),
                target,
                to_json(&body)?.dimmed()
            )),
        },
        SubmitOutcome::Queued => {
            let pending = session.queue().len();
            match format {
                OutputFormat::Json => to_json(&json!({
                    "status": "queued",
                    "target": target,
                    "pending": pending,
                })),
                OutputFormat::Pretty => Ok(format!(
                    "{} Queued {} ({} pending)",
                    "○".yellow(),
                    target,
                    pending
                )),
            }
        }
    }
}

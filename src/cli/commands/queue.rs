//! Offline queue commands.
//!
//! Inspect, replay and drop the actions waiting in the persistent slot.

use serde_json::json;

use crate::cli::args::OutputFormat;
use crate::error::SyncError;
use crate::output::{format_actions, format_flush, format_status, to_json};
use crate::queue::{FlushOutcome, OfflineQueue};

/// Show queue status.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn status(queue: &OfflineQueue, format: OutputFormat) -> Result<String, SyncError> {
    format_status(queue.slot(), &queue.pending(), format)
}

/// List queued actions in replay order.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn list(queue: &OfflineQueue, limit: usize, format: OutputFormat) -> Result<String, SyncError> {
    format_actions(&queue.pending(), limit, format)
}

/// Replay the queue once.
///
/// # Errors
///
/// Returns an error if the slot could not be rewritten after the pass.
pub fn flush(queue: &OfflineQueue, format: OutputFormat) -> Result<String, SyncError> {
    match queue.flush()? {
        FlushOutcome::Completed(report) => format_flush(&report, format),
        FlushOutcome::AlreadyRunning => match format {
            OutputFormat::Json => to_json(&json!({ "already_running": true })),
            OutputFormat::Pretty => Ok("A sync is already in progress.".to_string()),
        },
    }
}

/// Drop every queued action.
///
/// # Errors
///
/// Returns `SyncError::Config` without `--force`, or a storage error if the
/// slot could not be removed.
pub fn clear(queue: &OfflineQueue, force: bool, format: OutputFormat) -> Result<String, SyncError> {
    if !force {
        return Err(SyncError::Config(
            "Refusing to drop queued actions without --force".to_string(),
        ));
    }

    let dropped = queue.clear()?;

    match format {
        OutputFormat::Json => to_json(&json!({ "cleared": dropped })),
        OutputFormat::Pretty => Ok(format!("Cleared {dropped} queued actions.")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::Value;

    use super::*;
    use crate::config::QueueConfig;
    use crate::delivery::{MockTransport, Transport};
    use crate::notify::{MockNotifier, Notifier};
    use crate::queue::QueuedAction;
    use crate::storage::{MemoryStore, SlotStore};

    fn queue_with(transport: MockTransport, actions: usize) -> OfflineQueue {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().return_const(());
        let queue = OfflineQueue::new(
            Arc::new(MemoryStore::new()) as Arc<dyn SlotStore>,
            Arc::new(transport) as Arc<dyn Transport>,
            Arc::new(notifier) as Arc<dyn Notifier>,
            &QueueConfig::default(),
        );
        for i in 0..actions {
            let payload = BTreeMap::from([("answer".to_string(), i.to_string())]);
            queue
                .enqueue(QueuedAction::form_submission("/quiz/submit/1/", payload))
                .unwrap();
        }
        queue
    }

    #[test]
    fn test_status_json() {
        let queue = queue_with(MockTransport::new(), 2);

        let output = status(&queue, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["pending"], 2);
        assert_eq!(value["slot"], "offlineQueue");
    }

    #[test]
    fn test_list_respects_limit() {
        let queue = queue_with(MockTransport::new(), 3);

        let output = list(&queue, 2, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["count"], 2);
        assert_eq!(value["items"][0]["data"]["answer"], "0");
    }

    #[test]
    fn test_flush_json() {
        let mut transport = MockTransport::new();
        transport
            .expect_deliver()
            .times(2)
            .returning(|_| Ok(json!({"success": true})));
        let queue = queue_with(transport, 2);

        let output = flush(&queue, OutputFormat::Json).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["delivered"], 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clear_requires_force() {
        let queue = queue_with(MockTransport::new(), 1);

        let err = clear(&queue, false, OutputFormat::Pretty).unwrap_err();

        assert!(matches!(err, SyncError::Config(_)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_with_force() {
        let queue = queue_with(MockTransport::new(), 2);

        let output = clear(&queue, true, OutputFormat::Pretty).unwrap();

        assert_eq!(output, "Cleared 2 queued actions.");
        assert!(queue.is_empty());
    }
}

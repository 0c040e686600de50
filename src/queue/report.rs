//! Results of a flush pass.

use serde::Serialize;

use super::action::{ActionKind, QueuedAction};

/// Result of replaying a single action.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    /// Position of the action in the replayed sequence (0-based)
    pub position: usize,
    /// Action kind
    pub kind: ActionKind,
    /// Replay target
    pub target: String,
    /// Whether the endpoint accepted it
    pub delivered: bool,
    /// Error message if delivery failed
    pub error: Option<String>,
}

impl DeliveryResult {
    pub(crate) fn delivered(position: usize, action: &QueuedAction) -> Self {
        Self {
            position,
            kind: action.kind,
            target: action.target.clone(),
            delivered: true,
            error: None,
        }
    }

    pub(crate) fn failed(position: usize, action: &QueuedAction, error: String) -> Self {
        Self {
            position,
            kind: action.kind,
            target: action.target.clone(),
            delivered: false,
            error: Some(error),
        }
    }
}

/// Summary of one flush pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    /// Number of actions the endpoint accepted
    pub delivered: usize,
    /// Number of actions whose delivery failed
    pub failed: usize,
    /// Failed actions written back for the next pass
    pub requeued: usize,
    /// Individual results in replay order
    pub results: Vec<DeliveryResult>,
}

impl FlushReport {
    /// Create an empty report.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            delivered: 0,
            failed: 0,
            requeued: 0,
            results: Vec::new(),
        }
    }

    /// Add a result.
    pub fn add(&mut self, result: DeliveryResult) {
        if result.delivered {
            self.delivered += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Total actions replayed in this pass.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.delivered + self.failed
    }

    /// Failed actions that were discarded.
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.failed - self.requeued
    }

    /// Check if every action was delivered.
    #[must_use]
    pub const fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Outcome of a call to `OfflineQueue::flush`.
#[derive(Debug, Clone)]
pub enum FlushOutcome {
    /// The pass ran to completion.
    Completed(FlushReport),
    /// Another pass was already draining the queue; nothing was done.
    AlreadyRunning,
}

impl FlushOutcome {
    /// The report of a completed pass.
    #[must_use]
    pub const fn report(&self) -> Option<&FlushReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::AlreadyRunning => None,
        }
    }
}

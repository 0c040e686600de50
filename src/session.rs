//! Client session.
//!
//! A [`Session`] is constructed once at startup and owns the offline queue
//! plus the current connectivity state. All queue work is driven from one
//! thread by [`Session::run`], which handles events one at a time.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::connectivity::ConnectivityEvent;
use crate::delivery::Transport;
use crate::error::SyncError;
use crate::notify::{Notifier, Severity};
use crate::queue::{FlushOutcome, FlushReport, OfflineQueue, QueuedAction};

/// Shown when connectivity returns.
pub const CONNECTED_MESSAGE: &str = "Connected";
/// Shown when connectivity is lost.
pub const OFFLINE_MESSAGE: &str = "Offline Mode";
/// Shown when a direct submission fails.
pub const SUBMIT_FAILED_MESSAGE: &str = "An error occurred. Please try again.";

/// Input to the session event loop.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Connectivity changed.
    Connectivity(ConnectivityEvent),
    /// The user submitted a form.
    Submit(QueuedAction),
    /// Stop the loop.
    Shutdown,
}

impl From<ConnectivityEvent> for SessionEvent {
    fn from(event: ConnectivityEvent) -> Self {
        Self::Connectivity(event)
    }
}

/// What happened to a submission.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Sent straight to the endpoint, which answered with this body.
    Delivered(serde_json::Value),
    /// Captured in the offline queue.
    Queued,
}

/// Totals for one run of the event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Completed flush passes
    pub flushes: usize,
    /// Actions replayed successfully across all passes
    pub replayed: usize,
    /// Submissions delivered directly
    pub delivered: usize,
    /// Submissions captured offline
    pub queued: usize,
}

/// One client session.
pub struct Session {
    queue: Arc<OfflineQueue>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    online: bool,
}

impl Session {
    /// Create a session with a known starting connectivity state.
    #[must_use]
    pub fn new(
        queue: Arc<OfflineQueue>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        online: bool,
    ) -> Self {
        Self {
            queue,
            transport,
            notifier,
            online,
        }
    }

    /// Whether the session currently considers the endpoint reachable.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// The session's offline queue.
    #[must_use]
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// Submit a form: deliver now when online, capture it when offline.
    ///
    /// # Errors
    ///
    /// Returns the delivery error of a direct submission, or the storage error
    /// of a failed capture. The user has been notified in both cases.
    pub fn submit(&mut self, action: QueuedAction) -> Result<SubmitOutcome, SyncError> {
        if !self.online {
            self.queue.enqueue(action)?;
            return Ok(SubmitOutcome::Queued);
        }

        match self.transport.deliver(&action) {
            Ok(body) => Ok(SubmitOutcome::Delivered(body)),
            Err(e) => {
                error!(target = %action.target, error = %e, "submission error");
                self.notifier.notify(Severity::Error, SUBMIT_FAILED_MESSAGE);
                Err(e)
            },
        }
    }

    /// React to a connectivity transition.
    ///
    /// Becoming reachable flushes the queue and returns the pass report.
    /// Events that do not change the state are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush could not rewrite the persistent slot.
    pub fn handle(&mut self, event: ConnectivityEvent) -> Result<Option<FlushReport>, SyncError> {
        let online = event == ConnectivityEvent::Online;
        if online == self.online {
            debug!(?event, "connectivity unchanged; ignoring");
            return Ok(None);
        }
        self.online = online;

        if !online {
            self.notifier.notify(Severity::Info, OFFLINE_MESSAGE);
            return Ok(None);
        }

        self.notifier.notify(Severity::Success, CONNECTED_MESSAGE);
        match self.queue.flush()? {
            FlushOutcome::Completed(report) => Ok(Some(report)),
            FlushOutcome::AlreadyRunning => Ok(None),
        }
    }

    /// Process events until `Shutdown` arrives or every sender is gone.
    pub fn run(&mut self, events: &Receiver<SessionEvent>) -> RunSummary {
        self.run_until(events, usize::MAX)
    }

    /// Like [`Session::run`], but also stop after `max_flushes` completed passes.
    pub fn run_until(&mut self, events: &Receiver<SessionEvent>, max_flushes: usize) -> RunSummary {
        let mut summary = RunSummary::default();

        for event in events {
            match event {
                SessionEvent::Connectivity(change) => match self.handle(change) {
                    Ok(Some(report)) => {
                        summary.flushes += 1;
                        summary.replayed += report.delivered;
                    },
                    Ok(None) => {},
                    Err(e) => warn!(error = %e, "flush could not settle the offline queue"),
                },
                SessionEvent::Submit(action) => match self.submit(action) {
                    Ok(SubmitOutcome::Delivered(_)) => summary.delivered += 1,
                    Ok(SubmitOutcome::Queued) => summary.queued += 1,
                    Err(e) if e.is_delivery() => debug!(error = %e, "submission not delivered"),
                    Err(e) => warn!(error = %e, "submission could not be captured"),
                },
                SessionEvent::Shutdown => break,
            }

            if summary.flushes >= max_flushes {
                break;
            }
        }

        summary
    }
}

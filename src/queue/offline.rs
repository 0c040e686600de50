//! The offline action queue.
//!
//! Captures submissions made while the endpoint is unreachable, persists them
//! write-through to a named slot, and replays them in capture order once
//! connectivity returns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use super::action::{decode_queue, encode_queue, QueuedAction};
use super::report::{DeliveryResult, FlushOutcome, FlushReport};
use crate::config::{QueueConfig, ReplayPolicy};
use crate::delivery::Transport;
use crate::error::SyncError;
use crate::notify::{Notifier, Severity};
use crate::storage::SlotStore;

/// Acknowledgement shown once an action is durably stored.
pub const SAVED_OFFLINE_MESSAGE: &str = "Saved offline. Will sync when connection is restored.";

/// Shown when the persistent slot rejected a capture.
pub const SAVE_FAILED_MESSAGE: &str = "Could not save offline. Your submission was not stored.";

/// Resets the flushing flag when a pass ends, even by unwinding.
struct FlushGuard<'a>(&'a AtomicBool);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ordered queue of deferred actions with a persisted mirror.
pub struct OfflineQueue {
    store: Arc<dyn SlotStore>,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    slot: String,
    policy: ReplayPolicy,
    pending: Mutex<Vec<QueuedAction>>,
    flushing: AtomicBool,
}

impl OfflineQueue {
    /// Create a queue over the given collaborators.
    ///
    /// The in-memory copy starts from whatever the slot already holds, so
    /// actions captured in an earlier session are replayed by this one.
    #[must_use]
    pub fn new(
        store: Arc<dyn SlotStore>,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
        config: &QueueConfig,
    ) -> Self {
        let persisted = match store.get_item(&config.slot) {
            Ok(raw) => decode_queue(raw.as_deref()),
            Err(e) => {
                warn!(slot = %config.slot, error = %e, "could not read persisted offline queue");
                Vec::new()
            },
        };

        Self {
            store,
            transport,
            notifier,
            slot: config.slot.clone(),
            policy: config.replay_policy,
            pending: Mutex::new(persisted),
            flushing: AtomicBool::new(false),
        }
    }

    fn pending_lock(&self) -> MutexGuard<'_, Vec<QueuedAction>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Name of the slot the queue is persisted under.
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Number of queued actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending_lock().len()
    }

    /// Check if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_lock().is_empty()
    }

    /// Copy of the queued actions in replay order.
    #[must_use]
    pub fn pending(&self) -> Vec<QueuedAction> {
        self.pending_lock().clone()
    }

    /// Whether a flush pass is currently running.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }

    /// Capture an action.
    ///
    /// The action is appended to whatever the slot holds right now, inside
    /// one store transaction, so captures from other processes sharing the
    /// slot are never overwritten. The user is told the action was saved only
    /// after that write commits.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the slot rejects the write. The queue
    /// is left unchanged and an error notification is emitted.
    pub fn enqueue(&self, action: QueuedAction) -> Result<(), SyncError> {
        let mut pending = self.pending_lock();
        let mut written = Vec::new();

        let result = self.store.update(&self.slot, &mut |raw| {
            let mut next = decode_queue(raw.as_deref());
            next.push(action.clone());
            let encoded = encode_queue(&next)?;
            written = next;
            Ok(Some(encoded))
        });

        if let Err(e) = result {
            error!(slot = %self.slot, error = %e, "failed to persist offline action");
            self.notifier.notify(Severity::Error, SAVE_FAILED_MESSAGE);
            return Err(e);
        }

        *pending = written;
        debug!(queued = pending.len(), "offline action persisted");
        drop(pending);

        self.notifier.notify(Severity::Info, SAVED_OFFLINE_MESSAGE);
        Ok(())
    }

    /// Replay every persisted action, strictly in order, one at a time.
    ///
    /// A failed delivery is logged and the pass moves on to the next action.
    /// When the pass ends the failed actions are dropped, or kept for the next
    /// pass under [`ReplayPolicy::RequeueFailed`]. Actions captured while the
    /// pass was running, by this process or another one, are always kept.
    ///
    /// # Errors
    ///
    /// Returns an error only if the slot cannot be rewritten at the end of the
    /// pass. Delivery errors never propagate.
    pub fn flush(&self) -> Result<FlushOutcome, SyncError> {
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            debug!("flush already in progress; skipping");
            return Ok(FlushOutcome::AlreadyRunning);
        };

        let raw = self.store.get_item(&self.slot).unwrap_or_else(|e| {
            warn!(slot = %self.slot, error = %e, "could not read persisted offline queue");
            None
        });
        let taken = decode_queue(raw.as_deref());

        if taken.is_empty() {
            self.settle(&taken, Vec::new())?;
            return Ok(FlushOutcome::Completed(FlushReport::empty()));
        }

        let mut report = FlushReport::empty();
        let mut failed = Vec::new();

        for (position, action) in taken.iter().enumerate() {
            match self.transport.deliver(action) {
                Ok(_) => {
                    debug!(position, target = %action.target, "offline action delivered");
                    report.add(DeliveryResult::delivered(position, action));
                },
                Err(e) => {
                    error!(position, target = %action.target, error = %e, "failed to sync offline action");
                    report.add(DeliveryResult::failed(position, action, e.to_string()));
                    failed.push(action.clone());
                },
            }
        }

        let keep = match self.policy {
            ReplayPolicy::AtMostOnce => Vec::new(),
            ReplayPolicy::RequeueFailed => failed,
        };
        report.requeued = keep.len();
        self.settle(&taken, keep)?;

        info!(
            delivered = report.delivered,
            failed = report.failed,
            requeued = report.requeued,
            "offline queue flushed"
        );
        self.notifier.notify(
            Severity::Success,
            &format!("Synced {} offline actions successfully!", report.attempted()),
        );

        Ok(FlushOutcome::Completed(report))
    }

    /// Rewrite the slot after a pass: `keep`, followed by whatever the slot
    /// holds now minus the actions this pass took from it.
    fn settle(&self, taken: &[QueuedAction], keep: Vec<QueuedAction>) -> Result<(), SyncError> {
        let mut pending = self.pending_lock();
        let mut written = Vec::new();

        self.store.update(&self.slot, &mut |raw| {
            let mut next = keep.clone();
            next.extend(without_taken(decode_queue(raw.as_deref()), taken));
            let encoded = if next.is_empty() {
                None
            } else {
                Some(encode_queue(&next)?)
            };
            written = next;
            Ok(encoded)
        })?;

        *pending = written;
        Ok(())
    }

    /// Drop every queued action without replaying it.
    ///
    /// Returns the number of actions discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    pub fn clear(&self) -> Result<usize, SyncError> {
        let mut pending = self.pending_lock();
        let mut count = 0;

        self.store.update(&self.slot, &mut |raw| {
            count = decode_queue(raw.as_deref()).len();
            Ok(None)
        })?;
        pending.clear();

        Ok(count)
    }
}

/// Remove one occurrence of each `taken` action from `current`, keeping order.
fn without_taken(current: Vec<QueuedAction>, taken: &[QueuedAction]) -> Vec<QueuedAction> {
    let mut unmatched: Vec<&QueuedAction> = taken.iter().collect();

    current
        .into_iter()
        .filter(|action| match unmatched.iter().position(|t| *t == action) {
            Some(i) => {
                unmatched.remove(i);
                false
            }
            None => true,
        })
        .collect()
}

//! Offline action queue.
//!
//! Submissions that need the network are captured here while the endpoint is
//! unreachable and replayed once it comes back.
//!
//! Delivery is at-most-once by default: an action whose replay fails is
//! dropped at the end of the pass. There is no dedup key, so replay side
//! effects (a quiz answer submitted twice) are not guarded against.

mod action;
mod offline;
mod report;

pub use action::{decode_queue, encode_queue, ActionKind, QueuedAction};
pub use offline::{OfflineQueue, SAVED_OFFLINE_MESSAGE, SAVE_FAILED_MESSAGE};
pub use report::{DeliveryResult, FlushOutcome, FlushReport};

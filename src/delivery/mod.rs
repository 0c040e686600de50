//! Delivery of actions to the submission endpoint.

mod http;

pub use http::HttpTransport;

use crate::error::SyncError;
use crate::queue::QueuedAction;

/// Something that can deliver an action to its target.
#[cfg_attr(test, mockall::automock)]
pub trait Transport: Send + Sync {
    /// Deliver `action` and return the endpoint's JSON response.
    ///
    /// # Errors
    ///
    /// Returns an error if the action could not be delivered or the endpoint
    /// rejected it.
    fn deliver(&self, action: &QueuedAction) -> Result<serde_json::Value, SyncError>;
}

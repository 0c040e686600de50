//! Command implementations for savoir-sync.
//!
//! This module contains the implementation of all CLI commands.

mod completions;
mod queue;
mod submit;
mod watch;

pub use completions::generate_completions;
pub use queue::{clear, flush, list, status};
pub use submit::submit;
pub use watch::watch;

use std::sync::Arc;

use crate::config::Config;
use crate::connectivity::TcpProbe;
use crate::delivery::{HttpTransport, Transport};
use crate::error::SyncError;
use crate::notify::{ConsoleNotifier, Notifier};
use crate::queue::OfflineQueue;
use crate::session::Session;
use crate::storage::{Database, SlotStore, SqliteStore};

/// Everything a command needs, wired once at startup.
pub struct AppContext {
    /// Effective configuration after CLI overrides.
    pub config: Config,
    /// HTTP transport to the LMS.
    pub transport: Arc<HttpTransport>,
    /// Toast surface.
    pub notifier: Arc<dyn Notifier>,
    /// The offline queue.
    pub queue: Arc<OfflineQueue>,
}

impl AppContext {
    /// Open the queue stored in the default database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the endpoint
    /// settings are invalid.
    pub fn open(config: Config) -> Result<Self, SyncError> {
        let store = SqliteStore::new(Database::open()?).with_quota(config.queue.max_bytes);
        Self::with_store(config, Arc::new(store))
    }

    /// Wire the context over an arbitrary slot store.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint settings are invalid.
    pub fn with_store(config: Config, store: Arc<dyn SlotStore>) -> Result<Self, SyncError> {
        let transport = Arc::new(HttpTransport::new(&config.endpoint)?);
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let queue = Arc::new(OfflineQueue::new(
            store,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&notifier),
            &config.queue,
        ));

        Ok(Self {
            config,
            transport,
            notifier,
            queue,
        })
    }

    /// Reachability probe for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL has no host or port.
    pub fn probe(&self) -> Result<TcpProbe, SyncError> {
        TcpProbe::for_url(
            self.transport.base_url(),
            self.config.connectivity.timeout(),
        )
    }

    /// Start a session with the given connectivity state.
    #[must_use]
    pub fn session(&self, online: bool) -> Session {
        Session::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.transport) as Arc<dyn Transport>,
            Arc::clone(&self.notifier),
            online,
        )
    }
}

//! savoir-sync - Offline action queue for the Savoir+ learning platform
//!
//! This crate captures form submissions made while the LMS is unreachable,
//! persists them in an ordered queue, and replays them once connectivity
//! returns.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod connectivity;
pub mod delivery;
pub mod error;
pub mod logging;
pub mod notify;
pub mod output;
pub mod queue;
pub mod session;
pub mod storage;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::SyncError;
pub use queue::{OfflineQueue, QueuedAction};
pub use session::Session;

//! Storage layer for savoir-sync.
//!
//! This module provides SQLite-based persistence for named slots, the
//! durable home of the offline queue.

mod database;
mod slot;

pub use database::Database;
pub use slot::{MemoryStore, SlotStore, SqliteStore};

//! # webchat-store
//!
//! Durable storage for the chat message log. The log is kept as a single
//! indented JSON array on disk, in the same shape `/get_messages` serves.
//! Each flush overwrites the file; which records a flush carries is decided
//! by [`PersistMode`].

pub mod mode;
pub mod snapshot;

mod error;

pub use error::{Result, StoreError};
pub use mode::PersistMode;
pub use snapshot::SnapshotFile;

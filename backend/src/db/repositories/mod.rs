//! Repository implementations module.
//!
//! This module contains the implementations of the `SpeedRepository` trait:
//! - `local`: In-memory store for unit testing and local development
//! - `snapshot`: Read-only store loaded from a JSON export
pub mod local;
pub mod snapshot;

pub use local::LocalRepository;
pub use snapshot::SnapshotRepository;

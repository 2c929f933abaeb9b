//! Repository trait definitions for records-store operations.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`speeds`]: Speed queries consumed by the analytics engine
//!
//! Services take the store as a trait bound so any implementation works:
//!
//! ```ignore
//! async fn my_service<R: SpeedRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let participants = repo.fetch_all_speed_tagged_participants().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod speeds;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use speeds::SpeedRepository;

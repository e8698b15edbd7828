//! # notebase-service
//!
//! Orchestration layer for the notebase note service.
//!
//! Composes the storage repositories from `notebase-db` with the Redis
//! cache into the user-facing operations: note CRUD under optimistic
//! locking, version history and revert, and sharing with graduated
//! permissions.
//!
//! The cache is strictly an optimization: every cache failure degrades to
//! store-only operation, and cache invalidation runs synchronously after
//! each committed mutation but never fails the mutation itself.

pub mod cache;
pub mod config;
pub mod notes;
pub mod shares;
pub mod versions;

pub use cache::{CacheCoordinator, NoteCache};
pub use config::{init_tracing, AppConfig};
pub use notes::NoteService;
pub use shares::ShareService;
pub use versions::VersionService;

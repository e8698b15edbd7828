//! # notebase-db
//!
//! PostgreSQL storage layer for notebase.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for notes, version snapshots, shares, users
//! - Effective-permission resolution ([`PgAccessResolver`])
//! - Full-text search over note content ([`PgNoteSearch`])
//!
//! Mutations that must be atomic with the optimistic-lock protocol expose
//! `_tx` variants taking a caller-owned [`sqlx::Transaction`]; the pool-level
//! trait methods each run in their own transaction.

pub mod access;
pub mod notes;
pub mod pool;
pub mod search;
pub mod shares;
pub mod users;
pub mod versions;

// Test fixtures for integration tests.
// Always compiled so tests/ suites in dependent crates can use them.
pub mod test_fixtures;

// Re-export core types
pub use notebase_core::*;

// Re-export repository implementations
pub use access::PgAccessResolver;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use search::PgNoteSearch;
pub use shares::PgShareRepository;
pub use users::PgUserRepository;
pub use versions::PgVersionRepository;

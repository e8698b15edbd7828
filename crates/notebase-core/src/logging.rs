//! Structured logging field name constants for notebase.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied (cache misses on error live here) |
//! | INFO  | Lifecycle events (startup, pool creation), operation completions |
//! | DEBUG | Decision points, cache hits/misses, invalidation counts |

/// Subsystem originating the log event.
/// Values: "service", "db", "cache"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "note_service", "pool", "note_cache", "access_resolver"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "update_note", "revert", "invalidate", "read_through"
pub const OPERATION: &str = "op";

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Acting user UUID.
pub const USER_ID: &str = "user_id";

/// Note version counter value involved in the operation.
pub const VERSION: &str = "version";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of cache keys removed by an invalidation.
pub const INVALIDATED_KEYS: &str = "invalidated_keys";

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

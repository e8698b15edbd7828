//! Redis-backed cache for single notes, per-user note lists, and per-user
//! search results.
//!
//! The cache is a derived, disposable view of the store: never the source
//! of truth, never required for correctness. Connection failures and
//! corrupt payloads are treated as cache misses; invalidation failures are
//! logged and swallowed.
//!
//! Key scheme:
//! - `note:{noteId}` — a single note
//! - `notes:{userId}` — a user's note list (owned plus shared)
//! - `notes:search:{userId}:{keywords}` — one search result set

use std::future::Future;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notebase_core::{Error, Result};

use crate::config::AppConfig;

/// Cache key for a single note.
pub fn note_key(note_id: Uuid) -> String {
    format!("note:{}", note_id)
}

/// Cache key for a user's note list.
pub fn list_key(user_id: Uuid) -> String {
    format!("notes:{}", user_id)
}

/// Cache key for one search result set. `keywords` is expected trimmed.
pub fn search_key(user_id: Uuid, keywords: &str) -> String {
    format!("notes:search:{}:{}", user_id, keywords)
}

/// Match pattern covering every search key of one user. Search keys are
/// parameterized by arbitrary keyword strings, so they can only be
/// invalidated by pattern scan.
fn search_pattern(user_id: Uuid) -> String {
    format!("notes:search:{}:*", user_id)
}

/// Low-level Redis cache client.
#[derive(Clone)]
pub struct NoteCache {
    inner: Arc<NoteCacheInner>,
}

struct NoteCacheInner {
    /// Redis connection manager (None if disabled or unreachable).
    /// Set once at construction; each operation clones the manager, which
    /// is a cheap handle onto one multiplexed connection, so no in-process
    /// lock is ever held across cache I/O.
    connection: Option<ConnectionManager>,
    note_ttl_secs: u64,
    list_ttl_secs: u64,
    search_ttl_secs: u64,
}

impl NoteCache {
    /// Connect according to `config`. A bad URL or unreachable Redis
    /// yields a disabled cache with a warning, never an error.
    pub async fn from_config(config: &AppConfig) -> Self {
        let connection = if config.redis_enabled {
            match redis::Client::open(config.redis_url.as_str()) {
                Ok(client) => match ConnectionManager::new(client).await {
                    Ok(conn) => {
                        info!(
                            subsystem = "cache",
                            component = "note_cache",
                            ttl_note = config.note_ttl_secs,
                            ttl_search = config.search_ttl_secs,
                            "Redis note cache enabled"
                        );
                        Some(conn)
                    }
                    Err(e) => {
                        warn!("Failed to connect to Redis, cache disabled: {}", e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Invalid Redis URL, cache disabled: {}", e);
                    None
                }
            }
        } else {
            info!("Redis note cache disabled via REDIS_ENABLED=false");
            None
        };

        Self {
            inner: Arc::new(NoteCacheInner {
                connection,
                note_ttl_secs: config.note_ttl_secs,
                list_ttl_secs: config.list_ttl_secs,
                search_ttl_secs: config.search_ttl_secs,
            }),
        }
    }

    /// Create a disabled cache (for testing or when Redis is unavailable).
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(NoteCacheInner {
                connection: None,
                note_ttl_secs: notebase_core::defaults::NOTE_CACHE_TTL_SECS,
                list_ttl_secs: notebase_core::defaults::NOTE_LIST_CACHE_TTL_SECS,
                search_ttl_secs: notebase_core::defaults::SEARCH_CACHE_TTL_SECS,
            }),
        }
    }

    /// Check if caching is connected.
    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_some()
    }

    pub fn note_ttl_secs(&self) -> u64 {
        self.inner.note_ttl_secs
    }

    pub fn list_ttl_secs(&self) -> u64 {
        self.inner.list_ttl_secs
    }

    pub fn search_ttl_secs(&self) -> u64 {
        self.inner.search_ttl_secs
    }

    /// Get a cached value. Any failure is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.inner.connection.clone()?;

        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => {
                    debug!("Cache HIT: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Cache deserialization error, treating as miss: {}", e);
                    None
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                None
            }
            Err(e) => {
                error!("Redis GET error: {}", e);
                None
            }
        }
    }

    /// Store a value with a TTL. Returns false (without failing) when the
    /// cache is disabled or the write errors.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let mut conn = match self.inner.connection.clone() {
            Some(c) => c,
            None => return false,
        };

        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!("Cache serialization error: {}", e);
                return false;
            }
        };

        match conn.set_ex::<_, _, ()>(key, serialized, ttl_secs).await {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", key, ttl_secs);
                true
            }
            Err(e) => {
                error!("Redis SET error: {}", e);
                false
            }
        }
    }

    /// Return the cached value for `key`, or run `loader`, cache its
    /// result with `ttl_secs`, and return it. Loader errors propagate;
    /// cache errors never do.
    pub async fn read_through<T, F, Fut>(&self, key: &str, ttl_secs: u64, loader: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(hit) = self.get::<T>(key).await {
            return Ok(hit);
        }

        let value = loader().await?;
        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }

    /// Delete a specific cache key.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut conn = match self.inner.connection.clone() {
            Some(c) => c,
            None => return false,
        };

        match conn.del::<_, ()>(key).await {
            Ok(_) => {
                debug!("Cache INVALIDATE: {}", key);
                true
            }
            Err(e) => {
                error!("Redis DEL error: {}", e);
                false
            }
        }
    }

    /// Delete every search-result entry for one user by pattern scan.
    /// Returns the number of keys removed.
    pub async fn invalidate_search(&self, user_id: Uuid) -> usize {
        let mut conn = match self.inner.connection.clone() {
            Some(c) => c,
            None => return 0,
        };

        let pattern = search_pattern(user_id);
        let mut removed = 0usize;
        let mut cursor: u64 = 0;

        loop {
            let scan: std::result::Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next, keys) = match scan {
                Ok(r) => r,
                Err(e) => {
                    error!("Redis SCAN error: {}", e);
                    return removed;
                }
            };

            if !keys.is_empty() {
                match conn.del::<_, ()>(&keys[..]).await {
                    Ok(_) => removed += keys.len(),
                    Err(e) => error!("Redis DEL error: {}", e),
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        if removed > 0 {
            debug!(
                subsystem = "cache",
                component = "note_cache",
                user_id = %user_id,
                invalidated_keys = removed,
                "Invalidated search cache entries"
            );
        }
        removed
    }
}

/// Write-invalidate coordinator.
///
/// Invoked synchronously after every committing mutation, before the
/// response is returned, so staleness is bounded by the commit-to-
/// invalidation window rather than the TTL.
#[derive(Clone)]
pub struct CacheCoordinator {
    cache: NoteCache,
    pool: PgPool,
}

impl CacheCoordinator {
    pub fn new(cache: NoteCache, pool: PgPool) -> Self {
        Self { cache, pool }
    }

    /// The underlying cache client, for read paths.
    pub fn cache(&self) -> &NoteCache {
        &self.cache
    }

    /// Invalidate every cache entry affected by a mutation of `note_id`:
    /// the note itself, each affected user's list, and each affected
    /// user's search results.
    ///
    /// When `explicit_users` is `None` the affected set is derived from the
    /// current owner and grantees. Callers deleting a note or revoking the
    /// last grant must pass the set explicitly, captured before the write,
    /// since afterwards the derivation would come up empty.
    pub async fn invalidate_note(&self, note_id: Uuid, explicit_users: Option<&[Uuid]>) {
        let derived;
        let users: &[Uuid] = match explicit_users {
            Some(users) if !users.is_empty() => users,
            _ => {
                derived = self.affected_user_ids(note_id).await;
                &derived
            }
        };

        self.cache.invalidate(&note_key(note_id)).await;
        for user_id in users {
            self.cache.invalidate(&list_key(*user_id)).await;
            self.cache.invalidate_search(*user_id).await;
        }

        if !users.is_empty() {
            debug!(
                subsystem = "cache",
                component = "coordinator",
                op = "invalidate",
                note_id = %note_id,
                result_count = users.len(),
                "Invalidated cache for note and affected users"
            );
        }
    }

    /// Current owner plus grantees of a note. Errors degrade to an empty
    /// set with a warning; a stale entry will expire on its TTL.
    async fn affected_user_ids(&self, note_id: Uuid) -> Vec<Uuid> {
        let result: std::result::Result<Vec<(Uuid,)>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT owner_id FROM note WHERE id = $1 AND deleted_at IS NULL
            UNION
            SELECT grantee_id FROM note_share WHERE note_id = $1
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await;

        match result {
            Ok(rows) => rows.into_iter().map(|r| r.0).collect(),
            Err(e) => {
                warn!(
                    note_id = %note_id,
                    error = %Error::Database(e),
                    "Failed to derive users with note access"
                );
                Vec::new()
            }
        }
    }
}

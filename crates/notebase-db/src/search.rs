//! Full-text search over note content.
//!
//! Search scope is owner-only: shared notes appear in list results but not
//! in search results, matching the upstream product behavior.

use sqlx::PgPool;
use uuid::Uuid;

use notebase_core::{Error, Note, Result};

use crate::notes::map_note_row;

/// Full-text search provider using PostgreSQL tsvector.
pub struct PgNoteSearch {
    pool: PgPool,
}

impl PgNoteSearch {
    /// Create a new PgNoteSearch with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Search a user's own active notes, ranked by relevance.
    ///
    /// `plainto_tsquery` treats the input as plain keywords, so no query
    /// syntax escaping is needed on the way in.
    pub async fn search_owned(&self, owner_id: Uuid, keywords: &str) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, content, category, version, deleted_at, created_at_utc, updated_at_utc
            FROM note
            WHERE owner_id = $1
              AND deleted_at IS NULL
              AND to_tsvector('english', content) @@ plainto_tsquery('english', $2)
            ORDER BY ts_rank(to_tsvector('english', content), plainto_tsquery('english', $2)) DESC,
                     created_at_utc DESC
            "#,
        )
        .bind(owner_id)
        .bind(keywords)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_note_row).collect()
    }
}

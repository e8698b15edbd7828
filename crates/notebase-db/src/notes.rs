//! Note repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use notebase_core::{
    CreateNoteRequest, Error, Note, NoteCategory, NoteRepository, Result,
};

/// Parse a category column value. Invalid stored values are an internal
/// error, not a validation error: validation happens on the way in.
pub(crate) fn parse_category(raw: Option<String>) -> Result<Option<NoteCategory>> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse::<NoteCategory>()
            .map(Some)
            .map_err(|_| Error::Internal(format!("Invalid category in store: {}", s))),
    }
}

/// Map a full note row to a [`Note`].
pub(crate) fn map_note_row(row: &PgRow) -> Result<Note> {
    Ok(Note {
        id: row.try_get("id").map_err(Error::Database)?,
        owner_id: row.try_get("owner_id").map_err(Error::Database)?,
        content: row.try_get("content").map_err(Error::Database)?,
        category: parse_category(row.try_get("category").map_err(Error::Database)?)?,
        version: row.try_get("version").map_err(Error::Database)?,
        deleted_at: row.try_get("deleted_at").map_err(Error::Database)?,
        created_at_utc: row.try_get("created_at_utc").map_err(Error::Database)?,
        updated_at_utc: row.try_get("updated_at_utc").map_err(Error::Database)?,
    })
}

const NOTE_COLUMNS: &str =
    "id, owner_id, content, category, version, deleted_at, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of [`NoteRepository`].
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load an active note inside `tx`, taking a row lock.
    ///
    /// `FOR UPDATE` guarantees the read observes the latest committed
    /// version and serializes same-note writers for the lifetime of the
    /// transaction.
    pub async fn fetch_for_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_note_row).transpose()
    }

    /// Conditional write: update the row only if its stored version still
    /// equals `guard_version`. Returns the written row, or `None` when no
    /// row matched, which means another writer won the race (or the note
    /// was deleted). Returning the row directly keeps the result coupled to
    /// this transaction's write rather than a later read that could observe
    /// someone else's commit.
    pub async fn conditional_update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        guard_version: i32,
        content: &str,
        category: Option<NoteCategory>,
        new_version: i32,
    ) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE note
            SET content = $1, category = $2, version = $3, updated_at_utc = $4
            WHERE id = $5 AND version = $6 AND deleted_at IS NULL
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(content)
        .bind(category.map(|c| c.as_str()))
        .bind(new_version)
        .bind(Utc::now())
        .bind(id)
        .bind(guard_version)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_note_row).transpose()
    }

    /// Current version of an active note, read outside any transaction.
    /// Used to populate the detail of a `ConcurrentModification` error.
    pub async fn current_version(&self, id: Uuid) -> Result<Option<i32>> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT version FROM note WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(row.map(|r| r.0))
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        let note = Note {
            id: Uuid::new_v4(),
            owner_id,
            content: req.content,
            category: req.category,
            version: notebase_core::defaults::INITIAL_NOTE_VERSION,
            deleted_at: None,
            created_at_utc: Utc::now(),
            updated_at_utc: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO note (id, owner_id, content, category, version, created_at_utc, updated_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(note.id)
        .bind(note.owner_id)
        .bind(&note.content)
        .bind(note.category.map(|c| c.as_str()))
        .bind(note.version)
        .bind(note.created_at_utc)
        .bind(note.updated_at_utc)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note WHERE id = $1 AND deleted_at IS NULL",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_note_row).transpose()
    }

    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM note
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY created_at_utc DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_note_row).collect()
    }

    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Note>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM note
            WHERE id = ANY($1) AND deleted_at IS NULL
            ORDER BY created_at_utc DESC
            "#,
            NOTE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_note_row).collect()
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE note SET deleted_at = $1, updated_at_utc = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        // Physical delete; versions and shares go with the note via FK cascade.
        let result =
            sqlx::query("DELETE FROM note WHERE deleted_at IS NOT NULL AND deleted_at < $1")
                .bind(cutoff)
                .execute(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}

//! Version snapshot repository.
//!
//! Snapshots are pre-image archives created lazily: a mutation about to
//! advance a note's counter past version `v` first ensures a snapshot of
//! `v` exists. They are immutable once written.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

use notebase_core::{Error, NoteCategory, Result, VersionRepository, VersionSnapshot};

use crate::notes::parse_category;

fn map_snapshot_row(row: &PgRow) -> Result<VersionSnapshot> {
    Ok(VersionSnapshot {
        id: row.try_get("id").map_err(Error::Database)?,
        note_id: row.try_get("note_id").map_err(Error::Database)?,
        content: row.try_get("content").map_err(Error::Database)?,
        category: parse_category(row.try_get("category").map_err(Error::Database)?)?,
        version_number: row.try_get("version_number").map_err(Error::Database)?,
        created_by: row.try_get("created_by").map_err(Error::Database)?,
        created_at_utc: row.try_get("created_at_utc").map_err(Error::Database)?,
    })
}

const SNAPSHOT_COLUMNS: &str =
    "id, note_id, content, category, version_number, created_by, created_at_utc";

/// PostgreSQL implementation of [`VersionRepository`].
pub struct PgVersionRepository {
    pool: PgPool,
}

impl PgVersionRepository {
    /// Create a new PgVersionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotently archive a note state as the snapshot for
    /// `version_number`, inside the caller's transaction.
    ///
    /// Must run in the same transaction as the mutation that supersedes
    /// this version, so mutation and pre-image archival are atomic. The
    /// unique constraint on (note_id, version_number) makes the insert a
    /// no-op when the snapshot already exists.
    pub async fn ensure_snapshot_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        version_number: i32,
        content: &str,
        category: Option<NoteCategory>,
        created_by: Uuid,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO note_version (id, note_id, content, category, version_number, created_by, created_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (note_id, version_number) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note_id)
        .bind(content)
        .bind(category.map(|c| c.as_str()))
        .bind(version_number)
        .bind(created_by)
        .bind(Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    /// Transaction-aware variant of `get_version`.
    pub async fn get_version_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        note_id: Uuid,
        version_number: i32,
    ) -> Result<Option<VersionSnapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_version WHERE note_id = $1 AND version_number = $2",
            SNAPSHOT_COLUMNS
        ))
        .bind(note_id)
        .bind(version_number)
        .fetch_optional(&mut **tx)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_snapshot_row).transpose()
    }
}

#[async_trait]
impl VersionRepository for PgVersionRepository {
    async fn list_versions(&self, note_id: Uuid) -> Result<Vec<VersionSnapshot>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM note_version
            WHERE note_id = $1
            ORDER BY version_number DESC
            "#,
            SNAPSHOT_COLUMNS
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(map_snapshot_row).collect()
    }

    async fn get_version(
        &self,
        note_id: Uuid,
        version_number: i32,
    ) -> Result<Option<VersionSnapshot>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_version WHERE note_id = $1 AND version_number = $2",
            SNAPSHOT_COLUMNS
        ))
        .bind(note_id)
        .bind(version_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_snapshot_row).transpose()
    }
}

//! Share grant repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use notebase_core::{
    Error, NoteShareInfo, Result, ShareGrant, SharePermission, ShareRepository, SharedNote,
};

use crate::notes::map_note_row;

fn map_grant_row(row: &PgRow) -> Result<ShareGrant> {
    let permission: String = row.try_get("permission").map_err(Error::Database)?;
    Ok(ShareGrant {
        id: row.try_get("id").map_err(Error::Database)?,
        note_id: row.try_get("note_id").map_err(Error::Database)?,
        grantee_id: row.try_get("grantee_id").map_err(Error::Database)?,
        permission: permission
            .parse::<SharePermission>()
            .map_err(|_| Error::Internal(format!("Invalid permission in store: {}", permission)))?,
        granted_by: row.try_get("granted_by").map_err(Error::Database)?,
        created_at_utc: row.try_get("created_at_utc").map_err(Error::Database)?,
    })
}

const GRANT_COLUMNS: &str = "id, note_id, grantee_id, permission, granted_by, created_at_utc";

/// PostgreSQL implementation of [`ShareRepository`].
pub struct PgShareRepository {
    pool: PgPool,
}

impl PgShareRepository {
    /// Create a new PgShareRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grants on a note joined with each grantee's username.
    pub async fn list_views_for_note(&self, note_id: Uuid) -> Result<Vec<NoteShareInfo>> {
        let rows = sqlx::query(
            r#"
            SELECT s.id, s.grantee_id, u.username, s.permission, s.created_at_utc
            FROM note_share s
            JOIN app_user u ON u.id = s.grantee_id
            WHERE s.note_id = $1
            ORDER BY s.created_at_utc ASC
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let permission: String = row.try_get("permission").map_err(Error::Database)?;
                Ok(NoteShareInfo {
                    id: row.try_get("id").map_err(Error::Database)?,
                    grantee_id: row.try_get("grantee_id").map_err(Error::Database)?,
                    grantee_username: row.try_get("username").map_err(Error::Database)?,
                    permission: permission.parse::<SharePermission>().map_err(|_| {
                        Error::Internal(format!("Invalid permission in store: {}", permission))
                    })?,
                    created_at_utc: row.try_get("created_at_utc").map_err(Error::Database)?,
                })
            })
            .collect()
    }

    /// Active notes shared with a user, each paired with its grant.
    pub async fn list_shared_with(&self, grantee_id: Uuid) -> Result<Vec<SharedNote>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.owner_id, n.content, n.category, n.version, n.deleted_at,
                   n.created_at_utc, n.updated_at_utc,
                   s.permission AS share_permission, s.granted_by
            FROM note_share s
            JOIN note n ON n.id = s.note_id
            WHERE s.grantee_id = $1 AND n.deleted_at IS NULL
            ORDER BY n.created_at_utc DESC
            "#,
        )
        .bind(grantee_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let permission: String =
                    row.try_get("share_permission").map_err(Error::Database)?;
                Ok(SharedNote {
                    note: map_note_row(row)?,
                    permission: permission.parse::<SharePermission>().map_err(|_| {
                        Error::Internal(format!("Invalid permission in store: {}", permission))
                    })?,
                    shared_by: row.try_get("granted_by").map_err(Error::Database)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ShareRepository for PgShareRepository {
    async fn find(&self, note_id: Uuid, grantee_id: Uuid) -> Result<Option<ShareGrant>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_share WHERE note_id = $1 AND grantee_id = $2",
            GRANT_COLUMNS
        ))
        .bind(note_id)
        .bind(grantee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_grant_row).transpose()
    }

    async fn insert(
        &self,
        note_id: Uuid,
        grantee_id: Uuid,
        permission: SharePermission,
        granted_by: Uuid,
    ) -> Result<ShareGrant> {
        let grant = ShareGrant {
            id: Uuid::new_v4(),
            note_id,
            grantee_id,
            permission,
            granted_by,
            created_at_utc: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO note_share (id, note_id, grantee_id, permission, granted_by, created_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(grant.id)
        .bind(grant.note_id)
        .bind(grant.grantee_id)
        .bind(grant.permission.as_str())
        .bind(grant.granted_by)
        .bind(grant.created_at_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            // Unique (note_id, grantee_id) violation: a concurrent share
            // landed first. Surface the same conflict as a duplicate share.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                Error::Conflict("Note is already shared with this user".to_string())
            }
            _ => Error::Database(e),
        })?;

        Ok(grant)
    }

    async fn set_permission(
        &self,
        note_id: Uuid,
        grantee_id: Uuid,
        permission: SharePermission,
    ) -> Result<Option<ShareGrant>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE note_share SET permission = $1
            WHERE note_id = $2 AND grantee_id = $3
            RETURNING {}
            "#,
            GRANT_COLUMNS
        ))
        .bind(permission.as_str())
        .bind(note_id)
        .bind(grantee_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(map_grant_row).transpose()
    }

    async fn remove(&self, note_id: Uuid, grantee_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM note_share WHERE note_id = $1 AND grantee_id = $2")
            .bind(note_id)
            .bind(grantee_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn grantee_ids(&self, note_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT grantee_id FROM note_share WHERE note_id = $1")
                .bind(note_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    async fn shared_note_ids(&self, grantee_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> =
            sqlx::query_as("SELECT note_id FROM note_share WHERE grantee_id = $1")
                .bind(grantee_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

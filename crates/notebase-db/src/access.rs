//! Effective-permission resolution.
//!
//! Every operation on a note is gated by the access level this resolver
//! computes. A missing or soft-deleted note resolves to `NoteAccess::None`,
//! and callers translate that into the same not-found outcome as a denied
//! grant, so requesters cannot learn of notes they cannot see.

use sqlx::PgPool;
use uuid::Uuid;

use notebase_core::{Error, NoteAccess, Result, SharePermission};

/// Computes a principal's effective permission on a note.
///
/// Side-effect free: two pool lookups at most.
pub struct PgAccessResolver {
    pool: PgPool,
}

impl PgAccessResolver {
    /// Create a new PgAccessResolver with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve `user_id`'s access to `note_id`.
    pub async fn resolve(&self, note_id: Uuid, user_id: Uuid) -> Result<NoteAccess> {
        let owner: Option<(Uuid,)> =
            sqlx::query_as("SELECT owner_id FROM note WHERE id = $1 AND deleted_at IS NULL")
                .bind(note_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        let owner_id = match owner {
            Some((owner_id,)) => owner_id,
            None => return Ok(NoteAccess::None),
        };

        if owner_id == user_id {
            return Ok(NoteAccess::Owner);
        }

        let grant: Option<(String,)> = sqlx::query_as(
            "SELECT permission FROM note_share WHERE note_id = $1 AND grantee_id = $2",
        )
        .bind(note_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match grant {
            None => Ok(NoteAccess::None),
            Some((permission,)) => {
                let permission = permission.parse::<SharePermission>().map_err(|_| {
                    Error::Internal(format!("Invalid permission in store: {}", permission))
                })?;
                Ok(NoteAccess::from(permission))
            }
        }
    }
}

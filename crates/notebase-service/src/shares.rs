//! Sharing service: granting, updating, and revoking note access.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use notebase_core::{
    Error, NoteShareInfo, Result, ShareGrant, SharePermission, ShareRepository, ShareTarget,
    SharedNote, UserRepository,
};
use notebase_db::{PgAccessResolver, PgShareRepository, PgUserRepository};

use crate::cache::{CacheCoordinator, NoteCache};

/// Orchestrates share grants. All grant mutations are owner-only.
pub struct ShareService {
    shares: PgShareRepository,
    users: PgUserRepository,
    access: PgAccessResolver,
    coordinator: CacheCoordinator,
}

impl ShareService {
    /// Build a share service over `pool`.
    pub fn new(pool: PgPool, cache: NoteCache) -> Self {
        Self {
            shares: PgShareRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            access: PgAccessResolver::new(pool.clone()),
            coordinator: CacheCoordinator::new(cache, pool),
        }
    }

    async fn resolve_grantee(&self, target: &ShareTarget) -> Result<Uuid> {
        let user = match target {
            ShareTarget::UserId(id) => self.users.fetch(*id).await?,
            ShareTarget::Username(name) => self.users.find_by_username(name).await?,
        };
        user.map(|u| u.id)
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Share a note with another user, or update an existing grant's
    /// permission in place. Re-sharing with the identical permission is a
    /// conflict.
    pub async fn share_note(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
        target: ShareTarget,
        permission: SharePermission,
    ) -> Result<ShareGrant> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }
        if !access.is_owner() {
            return Err(Error::Unauthorized(
                "You can only share notes you own".to_string(),
            ));
        }

        let grantee_id = self.resolve_grantee(&target).await?;
        if grantee_id == actor_id {
            return Err(Error::Validation(
                "Cannot share note with yourself".to_string(),
            ));
        }

        let grant = match self.shares.find(note_id, grantee_id).await? {
            Some(existing) if existing.permission == permission => {
                return Err(Error::Conflict(
                    "Note is already shared with this user".to_string(),
                ));
            }
            Some(_) => {
                match self
                    .shares
                    .set_permission(note_id, grantee_id, permission)
                    .await?
                {
                    Some(updated) => updated,
                    // The grant was revoked between lookup and update;
                    // fall through to a fresh insert.
                    None => {
                        self.shares
                            .insert(note_id, grantee_id, permission, actor_id)
                            .await?
                    }
                }
            }
            None => {
                self.shares
                    .insert(note_id, grantee_id, permission, actor_id)
                    .await?
            }
        };

        self.coordinator.invalidate_note(note_id, None).await;

        info!(
            subsystem = "service",
            component = "share_service",
            op = "share",
            note_id = %note_id,
            user_id = %grantee_id,
            "Note shared with permission {}",
            permission
        );
        Ok(grant)
    }

    /// Revoke a grant. Owner-only; absent grants are not found.
    pub async fn unshare_note(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
        grantee_id: Uuid,
    ) -> Result<()> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }
        if !access.is_owner() {
            return Err(Error::Unauthorized(
                "You can only unshare notes you own".to_string(),
            ));
        }

        if self.shares.find(note_id, grantee_id).await?.is_none() {
            return Err(Error::NotFound("Share not found".to_string()));
        }

        // Capture the affected set before the delete: if this is the last
        // grant, the post-delete derivation would miss the grantee.
        let mut affected = vec![actor_id];
        affected.extend(self.shares.grantee_ids(note_id).await?);

        if !self.shares.remove(note_id, grantee_id).await? {
            return Err(Error::NotFound("Share not found".to_string()));
        }

        self.coordinator
            .invalidate_note(note_id, Some(&affected))
            .await;

        info!(
            subsystem = "service",
            component = "share_service",
            op = "unshare",
            note_id = %note_id,
            user_id = %grantee_id,
            "Share revoked"
        );
        Ok(())
    }

    /// The owner's view of who has access to a note.
    pub async fn list_note_shares(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
    ) -> Result<Vec<NoteShareInfo>> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }
        if !access.is_owner() {
            return Err(Error::Unauthorized(
                "You can only view shares for notes you own".to_string(),
            ));
        }

        self.shares.list_views_for_note(note_id).await
    }

    /// Notes shared with the actor, each with its grant.
    pub async fn list_shared_with(&self, actor_id: Uuid) -> Result<Vec<SharedNote>> {
        self.shares.list_shared_with(actor_id).await
    }
}

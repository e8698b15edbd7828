//! Repository trait definitions.
//!
//! These traits describe the storage seams of the service. The PostgreSQL
//! implementations live in `notebase-db`; transaction-scoped variants of the
//! mutating operations are inherent methods on the concrete types since they
//! are tied to the store's transaction handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreateNoteRequest, Note, ShareGrant, SharePermission, User, VersionSnapshot};

/// Storage for notes. All read paths exclude soft-deleted rows.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert a new note at version 1 and return it.
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch an active note by ID.
    async fn fetch(&self, id: Uuid) -> Result<Option<Note>>;

    /// List a user's own active notes, newest first.
    async fn list_owned(&self, owner_id: Uuid) -> Result<Vec<Note>>;

    /// Fetch the active notes among `ids`, newest first.
    async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Note>>;

    /// Logically delete a note. Returns false if it was already gone.
    async fn soft_delete(&self, id: Uuid) -> Result<bool>;

    /// Physically delete notes soft-deleted before `cutoff`, cascading to
    /// versions and shares. Returns the number of notes removed.
    async fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// Storage for immutable version snapshots.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// List all snapshots of a note, descending by version number.
    async fn list_versions(&self, note_id: Uuid) -> Result<Vec<VersionSnapshot>>;

    /// Fetch one snapshot by (note, version number).
    async fn get_version(&self, note_id: Uuid, version_number: i32)
        -> Result<Option<VersionSnapshot>>;
}

/// Storage for share grants.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Fetch the grant for (note, grantee), if any.
    async fn find(&self, note_id: Uuid, grantee_id: Uuid) -> Result<Option<ShareGrant>>;

    /// Create a new grant.
    async fn insert(
        &self,
        note_id: Uuid,
        grantee_id: Uuid,
        permission: SharePermission,
        granted_by: Uuid,
    ) -> Result<ShareGrant>;

    /// Update the permission of an existing grant in place.
    async fn set_permission(
        &self,
        note_id: Uuid,
        grantee_id: Uuid,
        permission: SharePermission,
    ) -> Result<Option<ShareGrant>>;

    /// Remove a grant. Returns false if it did not exist.
    async fn remove(&self, note_id: Uuid, grantee_id: Uuid) -> Result<bool>;

    /// Grantee user IDs for a note.
    async fn grantee_ids(&self, note_id: Uuid) -> Result<Vec<Uuid>>;

    /// IDs of notes shared with a user.
    async fn shared_note_ids(&self, grantee_id: Uuid) -> Result<Vec<Uuid>>;
}

/// Storage for user identities. Credential handling belongs to the auth
/// collaborator and is out of scope here.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user.
    async fn insert(&self, username: &str) -> Result<User>;

    /// Fetch a user by ID.
    async fn fetch(&self, id: Uuid) -> Result<Option<User>>;

    /// Fetch a user by username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

//! Note lifecycle service: create, read, update, delete, search.
//!
//! Mutations follow the optimistic-lock protocol: the note row is loaded
//! with a row lock inside a transaction, the pre-image is archived, the
//! version counter advances by exactly one, and the write is conditional
//! on the version observed at load time. Exactly one writer wins per
//! version value; losers get `ConcurrentModification` with the current
//! version and are expected to re-fetch and retry.

use std::collections::HashSet;

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use notebase_core::defaults::NOTE_CONTENT_MAX_CHARS;
use notebase_core::{
    CreateNoteRequest, Error, Note, NoteRepository, Result, ShareRepository, UpdateNoteRequest,
};
use notebase_db::{
    PgAccessResolver, PgNoteRepository, PgNoteSearch, PgShareRepository, PgVersionRepository,
};

use crate::cache::{list_key, note_key, search_key, CacheCoordinator, NoteCache};

/// Reject empty or over-long content before any store round-trip.
/// Length is measured in Unicode code points.
pub(crate) fn validate_content(content: &str) -> Result<()> {
    if content.is_empty() {
        return Err(Error::Validation("Content must not be empty".to_string()));
    }
    let chars = content.chars().count();
    if chars > NOTE_CONTENT_MAX_CHARS {
        return Err(Error::Validation(format!(
            "Content exceeds maximum length of {} characters (got {})",
            NOTE_CONTENT_MAX_CHARS, chars
        )));
    }
    Ok(())
}

/// Orchestrates note CRUD over the repositories and the cache.
pub struct NoteService {
    pool: PgPool,
    notes: PgNoteRepository,
    shares: PgShareRepository,
    versions: PgVersionRepository,
    access: PgAccessResolver,
    search: PgNoteSearch,
    coordinator: CacheCoordinator,
}

impl NoteService {
    /// Build a note service over `pool`, with `cache` for read-through and
    /// invalidation.
    pub fn new(pool: PgPool, cache: NoteCache) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            shares: PgShareRepository::new(pool.clone()),
            versions: PgVersionRepository::new(pool.clone()),
            access: PgAccessResolver::new(pool.clone()),
            search: PgNoteSearch::new(pool.clone()),
            coordinator: CacheCoordinator::new(cache, pool.clone()),
            pool,
        }
    }

    /// Create a note at version 1. No snapshot is written yet: snapshots
    /// are archived lazily, when a version is about to be superseded.
    pub async fn create_note(&self, actor_id: Uuid, req: CreateNoteRequest) -> Result<Note> {
        validate_content(&req.content)?;

        let note = self.notes.insert(actor_id, req).await?;

        self.coordinator
            .invalidate_note(note.id, Some(&[actor_id]))
            .await;

        info!(
            subsystem = "service",
            component = "note_service",
            op = "create",
            note_id = %note.id,
            user_id = %actor_id,
            "Note created"
        );
        Ok(note)
    }

    /// Fetch a note the actor can see. A note that does not exist and a
    /// note the actor has no access to produce the same error.
    pub async fn get_note(&self, actor_id: Uuid, note_id: Uuid) -> Result<Note> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }

        self.coordinator
            .cache()
            .read_through(
                &note_key(note_id),
                self.coordinator.cache().note_ttl_secs(),
                || async {
                    self.notes
                        .fetch(note_id)
                        .await?
                        .ok_or_else(Error::note_not_found)
                },
            )
            .await
    }

    /// All notes visible to the actor: owned plus shared, deduplicated,
    /// newest first.
    pub async fn list_notes(&self, actor_id: Uuid) -> Result<Vec<Note>> {
        self.coordinator
            .cache()
            .read_through(
                &list_key(actor_id),
                self.coordinator.cache().list_ttl_secs(),
                || async {
                    let owned = self.notes.list_owned(actor_id).await?;
                    let shared_ids = self.shares.shared_note_ids(actor_id).await?;
                    let shared = self.notes.list_by_ids(&shared_ids).await?;

                    let mut seen: HashSet<Uuid> = HashSet::new();
                    let mut all: Vec<Note> = owned
                        .into_iter()
                        .chain(shared)
                        .filter(|n| seen.insert(n.id))
                        .collect();
                    all.sort_by(|a, b| b.created_at_utc.cmp(&a.created_at_utc));
                    Ok(all)
                },
            )
            .await
    }

    /// Full-text search over the actor's own notes. Shared notes are
    /// excluded from search scope (but present in lists).
    pub async fn search_notes(&self, actor_id: Uuid, keywords: &str) -> Result<Vec<Note>> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        self.coordinator
            .cache()
            .read_through(
                &search_key(actor_id, keywords),
                self.coordinator.cache().search_ttl_secs(),
                || async { self.search.search_owned(actor_id, keywords).await },
            )
            .await
    }

    /// Update a note under optimistic locking.
    ///
    /// Fields left `None` stay unchanged. When `expected_version` is
    /// supplied and stale, the update is rejected before any write.
    pub async fn update_note(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
        req: UpdateNoteRequest,
    ) -> Result<Note> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }
        if !access.can_edit() {
            return Err(Error::Unauthorized(
                "You do not have edit permission for this note".to_string(),
            ));
        }

        if let Some(content) = &req.content {
            validate_content(content)?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let note = self
            .notes
            .fetch_for_update_tx(&mut tx, note_id)
            .await?
            .ok_or_else(Error::note_not_found)?;

        // Early, cheap rejection. The conditional write below remains the
        // authoritative guard.
        if let Some(expected) = req.expected_version {
            if expected != note.version {
                tx.rollback().await.map_err(Error::Database)?;
                return Err(Error::ConcurrentModification {
                    current_version: note.version,
                });
            }
        }

        // Archive the pre-image before mutating, in the same transaction.
        self.versions
            .ensure_snapshot_tx(
                &mut tx,
                note.id,
                note.version,
                &note.content,
                note.category,
                actor_id,
            )
            .await?;

        let new_content = req.content.as_deref().unwrap_or(&note.content);
        let new_category = req.category.or(note.category);
        let new_version = note.version + 1;

        let updated = match self
            .notes
            .conditional_update_tx(
                &mut tx,
                note.id,
                note.version,
                new_content,
                new_category,
                new_version,
            )
            .await?
        {
            Some(updated) => updated,
            None => {
                // A second writer raced between our read and write.
                tx.rollback().await.map_err(Error::Database)?;
                return match self.notes.current_version(note_id).await? {
                    Some(current_version) => {
                        Err(Error::ConcurrentModification { current_version })
                    }
                    None => Err(Error::note_not_found()),
                };
            }
        };

        tx.commit().await.map_err(Error::Database)?;

        self.coordinator.invalidate_note(note_id, None).await;

        info!(
            subsystem = "service",
            component = "note_service",
            op = "update",
            note_id = %note_id,
            user_id = %actor_id,
            version = updated.version,
            "Note updated"
        );

        Ok(updated)
    }

    /// Logically delete a note. Owner-only. Version history survives until
    /// a physical purge.
    pub async fn delete_note(&self, actor_id: Uuid, note_id: Uuid) -> Result<()> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }
        if !access.is_owner() {
            return Err(Error::Unauthorized(
                "You can only delete notes you own".to_string(),
            ));
        }

        // Capture the affected user set now; after the delete the
        // derivation would no longer see the note.
        let mut affected = vec![actor_id];
        affected.extend(self.shares.grantee_ids(note_id).await?);

        if !self.notes.soft_delete(note_id).await? {
            return Err(Error::note_not_found());
        }

        self.coordinator
            .invalidate_note(note_id, Some(&affected))
            .await;

        info!(
            subsystem = "service",
            component = "note_service",
            op = "delete",
            note_id = %note_id,
            user_id = %actor_id,
            "Note deleted"
        );
        Ok(())
    }

    /// Physically remove notes soft-deleted before `cutoff`, cascading to
    /// their versions and shares. Retention policy is an operational
    /// decision; this is the hook for it.
    pub async fn purge_deleted_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Result<u64> {
        let purged = self.notes.purge_deleted_before(cutoff).await?;
        if purged > 0 {
            debug!(
                subsystem = "service",
                component = "note_service",
                op = "purge",
                result_count = purged,
                "Purged soft-deleted notes"
            );
        }
        Ok(purged)
    }
}

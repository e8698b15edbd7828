//! Version history service: listing snapshots and reverting.

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use notebase_core::{Error, Note, Result, VersionRepository, VersionSnapshot};
use notebase_db::{PgAccessResolver, PgNoteRepository, PgVersionRepository};

use crate::cache::{CacheCoordinator, NoteCache};

/// Orchestrates version listing and revert.
pub struct VersionService {
    pool: PgPool,
    notes: PgNoteRepository,
    versions: PgVersionRepository,
    access: PgAccessResolver,
    coordinator: CacheCoordinator,
}

impl VersionService {
    /// Build a version service over `pool`.
    pub fn new(pool: PgPool, cache: NoteCache) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            versions: PgVersionRepository::new(pool.clone()),
            access: PgAccessResolver::new(pool.clone()),
            coordinator: CacheCoordinator::new(cache, pool.clone()),
            pool,
        }
    }

    /// List a note's snapshots, descending by version number. Requires
    /// read access; inaccessible and missing notes are indistinguishable.
    pub async fn list_versions(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
    ) -> Result<Vec<VersionSnapshot>> {
        let access = self.access.resolve(note_id, actor_id).await?;
        if !access.can_read() {
            return Err(Error::note_not_found());
        }

        self.versions.list_versions(note_id).await
    }

    /// Revert a note to the content/category of `target_version`.
    ///
    /// The current state is archived first, so a revert is itself
    /// undo-able — and so reverting to the current version is legal,
    /// producing a new version with identical content. The note's counter
    /// advances by one; version numbers are never reused or decreased.
    pub async fn revert_note(
        &self,
        actor_id: Uuid,
        note_id: Uuid,
        target_version: i32,
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

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let note = self
            .notes
            .fetch_for_update_tx(&mut tx, note_id)
            .await?
            .ok_or_else(Error::note_not_found)?;

        // Archive the pre-revert state before resolving the target: if the
        // target is the current version this is what makes it loadable. A
        // failure below rolls the snapshot back with everything else.
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

        let target = self
            .versions
            .get_version_tx(&mut tx, note_id, target_version)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Version {} not found", target_version)))?;

        let new_version = note.version + 1;
        let reverted = match self
            .notes
            .conditional_update_tx(
                &mut tx,
                note.id,
                note.version,
                &target.content,
                target.category,
                new_version,
            )
            .await?
        {
            Some(reverted) => reverted,
            None => {
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
            component = "version_service",
            op = "revert",
            note_id = %note_id,
            user_id = %actor_id,
            version = reverted.version,
            "Note reverted to version {}",
            target_version
        );

        Ok(reverted)
    }
}

//! Repository-level integration tests.
//!
//! Require a running PostgreSQL (see `test_fixtures::DEFAULT_TEST_DATABASE_URL`);
//! run with `cargo test -- --ignored`.

use notebase_db::test_fixtures::TestDatabase;
use notebase_db::{
    CreateNoteRequest, Error, NoteAccess, NoteCategory, NoteRepository, SharePermission,
    ShareRepository, VersionRepository,
};

fn note_req(content: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        content: content.to_string(),
        category: None,
    }
}

#[tokio::test]
#[ignore]
async fn insert_and_fetch_round_trip() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;

    let created = db
        .notes
        .insert(
            alice.id,
            CreateNoteRequest {
                content: "Hello".to_string(),
                category: Some(NoteCategory::Work),
            },
        )
        .await
        .unwrap();

    assert_eq!(created.version, 1);
    assert!(created.deleted_at.is_none());

    let fetched = db.notes.fetch(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.content, "Hello");
    assert_eq!(fetched.category, Some(NoteCategory::Work));
    assert_eq!(fetched.version, 1);

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn soft_deleted_note_is_invisible() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;

    let note = db.notes.insert(alice.id, note_req("gone soon")).await.unwrap();

    assert!(db.notes.soft_delete(note.id).await.unwrap());
    assert!(db.notes.fetch(note.id).await.unwrap().is_none());
    assert!(db.notes.list_owned(alice.id).await.unwrap().is_empty());

    // Second delete is a no-op
    assert!(!db.notes.soft_delete(note.id).await.unwrap());

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn conditional_update_guards_version() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let note = db.notes.insert(alice.id, note_req("v1")).await.unwrap();

    let mut tx = db.pool.begin().await.unwrap();
    let updated = db
        .notes
        .conditional_update_tx(&mut tx, note.id, 1, "v2", None, 2)
        .await
        .unwrap()
        .unwrap();
    tx.commit().await.unwrap();
    // The returned row is this write's result, not a later read
    assert_eq!(updated.content, "v2");
    assert_eq!(updated.version, 2);

    // Stale guard version matches zero rows
    let mut tx = db.pool.begin().await.unwrap();
    let stale = db
        .notes
        .conditional_update_tx(&mut tx, note.id, 1, "v3", None, 2)
        .await
        .unwrap();
    tx.rollback().await.unwrap();
    assert!(stale.is_none());

    assert_eq!(db.notes.current_version(note.id).await.unwrap(), Some(2));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn snapshot_archival_is_idempotent() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let note = db.notes.insert(alice.id, note_req("original")).await.unwrap();

    let mut tx = db.pool.begin().await.unwrap();
    db.versions
        .ensure_snapshot_tx(&mut tx, note.id, 1, "original", None, alice.id)
        .await
        .unwrap();
    // Re-archiving the same version must not duplicate or overwrite
    db.versions
        .ensure_snapshot_tx(&mut tx, note.id, 1, "tampered", None, alice.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let versions = db.versions.list_versions(note.id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, 1);
    assert_eq!(versions[0].content, "original");

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn failed_transaction_leaves_no_snapshot() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let note = db.notes.insert(alice.id, note_req("stays")).await.unwrap();

    let mut tx = db.pool.begin().await.unwrap();
    db.versions
        .ensure_snapshot_tx(&mut tx, note.id, 1, "stays", None, alice.id)
        .await
        .unwrap();
    tx.rollback().await.unwrap();

    assert!(db.versions.list_versions(note.id).await.unwrap().is_empty());

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn access_resolution_levels() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;
    let eve = db.seed_user("eve").await;

    let note = db.notes.insert(alice.id, note_req("secret")).await.unwrap();

    assert_eq!(
        db.access.resolve(note.id, alice.id).await.unwrap(),
        NoteAccess::Owner
    );
    assert_eq!(
        db.access.resolve(note.id, eve.id).await.unwrap(),
        NoteAccess::None
    );

    db.shares
        .insert(note.id, bob.id, SharePermission::Read, alice.id)
        .await
        .unwrap();
    assert_eq!(
        db.access.resolve(note.id, bob.id).await.unwrap(),
        NoteAccess::Read
    );

    db.shares
        .set_permission(note.id, bob.id, SharePermission::Edit)
        .await
        .unwrap();
    assert_eq!(
        db.access.resolve(note.id, bob.id).await.unwrap(),
        NoteAccess::Edit
    );

    // A soft-deleted note resolves to None for everyone, owner included
    db.notes.soft_delete(note.id).await.unwrap();
    assert_eq!(
        db.access.resolve(note.id, alice.id).await.unwrap(),
        NoteAccess::None
    );

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn duplicate_grant_insert_is_a_conflict() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;
    let note = db.notes.insert(alice.id, note_req("shared")).await.unwrap();

    db.shares
        .insert(note.id, bob.id, SharePermission::Read, alice.id)
        .await
        .unwrap();

    // A second insert for the same (note, grantee) hits the unique
    // constraint, as two racing first-shares would, and must surface as a
    // conflict rather than a bare database error.
    let err = db
        .shares
        .insert(note.id, bob.id, SharePermission::Edit, alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn purge_cascades_versions_and_shares() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = db.notes.insert(alice.id, note_req("ephemeral")).await.unwrap();
    let mut tx = db.pool.begin().await.unwrap();
    db.versions
        .ensure_snapshot_tx(&mut tx, note.id, 1, "ephemeral", None, alice.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();
    db.shares
        .insert(note.id, bob.id, SharePermission::Read, alice.id)
        .await
        .unwrap();

    db.notes.soft_delete(note.id).await.unwrap();
    let purged = db
        .notes
        .purge_deleted_before(chrono::Utc::now() + chrono::Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(purged, 1);

    assert!(db.versions.list_versions(note.id).await.unwrap().is_empty());
    assert!(db.shares.grantee_ids(note.id).await.unwrap().is_empty());

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn full_text_search_is_owner_scoped() {
    let db = TestDatabase::new().await;
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = db
        .notes
        .insert(alice.id, note_req("the quick brown fox jumps"))
        .await
        .unwrap();
    db.notes
        .insert(alice.id, note_req("unrelated grocery list"))
        .await
        .unwrap();
    db.shares
        .insert(note.id, bob.id, SharePermission::Read, alice.id)
        .await
        .unwrap();

    let hits = db.search.search_owned(alice.id, "quick fox").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, note.id);

    // Shared-with notes are list-visible but not search-visible
    let bob_hits = db.search.search_owned(bob.id, "quick fox").await.unwrap();
    assert!(bob_hits.is_empty());

    db.cleanup().await;
}

//! Sharing and access-control tests.
//!
//! Require a running PostgreSQL; run with `cargo test -- --ignored`.

use notebase_core::{
    CreateNoteRequest, Error, SharePermission, ShareTarget, UpdateNoteRequest,
};
use notebase_db::test_fixtures::TestDatabase;
use notebase_service::{NoteCache, NoteService, ShareService};

fn services(db: &TestDatabase) -> (NoteService, ShareService) {
    let cache = NoteCache::disabled();
    (
        NoteService::new(db.pool.clone(), cache.clone()),
        ShareService::new(db.pool.clone(), cache),
    )
}

fn content_req(content: &str) -> CreateNoteRequest {
    CreateNoteRequest {
        content: content.to_string(),
        category: None,
    }
}

#[tokio::test]
#[ignore]
async fn read_grant_allows_reading_but_not_editing() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes.create_note(alice.id, content_req("draft")).await.unwrap();

    // Before the grant, the note is invisible to Bob
    assert!(matches!(
        notes.get_note(bob.id, note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Read,
        )
        .await
        .unwrap();

    let seen = notes.get_note(bob.id, note.id).await.unwrap();
    assert_eq!(seen.content, "draft");

    // Shared notes appear in Bob's list
    let listed = notes.list_notes(bob.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, note.id);

    // Read permission does not confer edit
    let err = notes
        .update_note(
            bob.id,
            note.id,
            UpdateNoteRequest {
                content: Some("overwritten".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn upgrading_permission_updates_the_grant_in_place() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes.create_note(alice.id, content_req("draft")).await.unwrap();

    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Read,
        )
        .await
        .unwrap();

    // Re-sharing with the same permission is a conflict
    let err = shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Read,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Re-sharing with a different permission upgrades the existing grant
    let grant = shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Edit,
        )
        .await
        .unwrap();
    assert_eq!(grant.permission, SharePermission::Edit);

    let views = shares.list_note_shares(alice.id, note.id).await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].permission, SharePermission::Edit);

    // The upgraded grant now allows edits
    let updated = notes
        .update_note(
            bob.id,
            note.id,
            UpdateNoteRequest {
                content: Some("edited by bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.version, 2);

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn sharing_by_username_resolves_the_grantee() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes.create_note(alice.id, content_req("hello bob")).await.unwrap();

    let grant = shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::Username(bob.username.clone()),
            SharePermission::Read,
        )
        .await
        .unwrap();
    assert_eq!(grant.grantee_id, bob.id);

    let err = shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::Username("nobody-here".to_string()),
            SharePermission::Read,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn only_the_owner_can_share_delete_or_list_shares() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;
    let carol = db.seed_user("carol").await;

    let note = notes.create_note(alice.id, content_req("mine")).await.unwrap();
    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Edit,
        )
        .await
        .unwrap();

    // Bob can edit but cannot re-share, list shares, or delete
    assert!(matches!(
        shares
            .share_note(
                bob.id,
                note.id,
                ShareTarget::UserId(carol.id),
                SharePermission::Read
            )
            .await
            .unwrap_err(),
        Error::Unauthorized(_)
    ));
    assert!(matches!(
        shares.list_note_shares(bob.id, note.id).await.unwrap_err(),
        Error::Unauthorized(_)
    ));
    assert!(matches!(
        notes.delete_note(bob.id, note.id).await.unwrap_err(),
        Error::Unauthorized(_)
    ));

    // Carol has no grant at all; for her the note does not exist
    assert!(matches!(
        shares.list_note_shares(carol.id, note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        notes.delete_note(carol.id, note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn self_share_is_rejected() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;

    let note = notes.create_note(alice.id, content_req("mine")).await.unwrap();

    let err = shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(alice.id),
            SharePermission::Read,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn unshare_revokes_access_immediately() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes.create_note(alice.id, content_req("temporary")).await.unwrap();
    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Read,
        )
        .await
        .unwrap();
    assert!(notes.get_note(bob.id, note.id).await.is_ok());

    shares.unshare_note(alice.id, note.id, bob.id).await.unwrap();

    assert!(matches!(
        notes.get_note(bob.id, note.id).await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(notes.list_notes(bob.id).await.unwrap().is_empty());

    // Revoking again is a not-found
    assert!(matches!(
        shares.unshare_note(alice.id, note.id, bob.id).await.unwrap_err(),
        Error::NotFound(_)
    ));

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn shared_notes_are_excluded_from_search() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes
        .create_note(alice.id, content_req("quarterly budget review"))
        .await
        .unwrap();
    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Read,
        )
        .await
        .unwrap();

    // Search is owner-scoped: Alice finds it, Bob does not
    assert_eq!(notes.search_notes(alice.id, "budget").await.unwrap().len(), 1);
    assert!(notes.search_notes(bob.id, "budget").await.unwrap().is_empty());

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn shared_with_listing_carries_permission_and_sharer() {
    let db = TestDatabase::new().await;
    let (notes, shares) = services(&db);
    let alice = db.seed_user("alice").await;
    let bob = db.seed_user("bob").await;

    let note = notes.create_note(alice.id, content_req("for bob")).await.unwrap();
    shares
        .share_note(
            alice.id,
            note.id,
            ShareTarget::UserId(bob.id),
            SharePermission::Edit,
        )
        .await
        .unwrap();

    let shared = shares.list_shared_with(bob.id).await.unwrap();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].note.id, note.id);
    assert_eq!(shared[0].permission, SharePermission::Edit);
    assert_eq!(shared[0].shared_by, alice.id);

    // Deleting the note removes it from Bob's shared view
    notes.delete_note(alice.id, note.id).await.unwrap();
    assert!(shares.list_shared_with(bob.id).await.unwrap().is_empty());

    db.cleanup().await;
}

//! Optimistic-locking behavior under concurrent writers.
//!
//! Require a running PostgreSQL; run with `cargo test -- --ignored`.

use std::sync::Arc;

use notebase_core::{CreateNoteRequest, Error, UpdateNoteRequest};
use notebase_db::test_fixtures::TestDatabase;
use notebase_service::{NoteCache, NoteService};

#[tokio::test]
#[ignore]
async fn concurrent_updates_with_same_expected_version_have_one_winner() {
    let db = TestDatabase::new().await;
    let notes = Arc::new(NoteService::new(db.pool.clone(), NoteCache::disabled()));
    let alice = db.seed_user("alice").await;

    let note = notes
        .create_note(
            alice.id,
            CreateNoteRequest {
                content: "base".to_string(),
                category: None,
            },
        )
        .await
        .unwrap();

    let req = |content: &str| UpdateNoteRequest {
        content: Some(content.to_string()),
        expected_version: Some(1),
        ..Default::default()
    };

    let a = {
        let notes = notes.clone();
        let note_id = note.id;
        let req = req("writer a");
        tokio::spawn(async move { notes.update_note(alice.id, note_id, req).await })
    };
    let b = {
        let notes = notes.clone();
        let note_id = note.id;
        let req = req("writer b");
        tokio::spawn(async move { notes.update_note(alice.id, note_id, req).await })
    };

    let (winner, winner_content, loser) = match (a.await.unwrap(), b.await.unwrap()) {
        (Ok(n), Err(e)) => (n, "writer a", e),
        (Err(e), Ok(n)) => (n, "writer b", e),
        (Ok(_), Ok(_)) => panic!("Both writers succeeded against the same version"),
        (Err(ea), Err(eb)) => panic!("Both writers failed: {:?} / {:?}", ea, eb),
    };

    // The winner gets back its own write, never the other writer's state
    assert_eq!(winner.version, 2);
    assert_eq!(winner.content, winner_content);
    match loser {
        Error::ConcurrentModification { current_version } => assert_eq!(current_version, 2),
        other => panic!("Expected ConcurrentModification, got {:?}", other),
    }

    let final_note = notes.get_note(alice.id, note.id).await.unwrap();
    assert_eq!(final_note.version, 2);
    assert_eq!(final_note.content, winner_content);

    db.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn update_without_expected_version_is_last_writer_wins() {
    let db = TestDatabase::new().await;
    let notes = NoteService::new(db.pool.clone(), NoteCache::disabled());
    let alice = db.seed_user("alice").await;

    let note = notes
        .create_note(
            alice.id,
            CreateNoteRequest {
                content: "base".to_string(),
                category: None,
            },
        )
        .await
        .unwrap();

    // Two sequential updates with no expected_version both succeed; the
    // row lock serializes them and each gets its own version.
    for (i, content) in ["first", "second"].iter().enumerate() {
        let updated = notes
            .update_note(
                alice.id,
                note.id,
                UpdateNoteRequest {
                    content: Some(content.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.version, i as i32 + 2);
    }

    db.cleanup().await;
}

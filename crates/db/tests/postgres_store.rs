//! `PostgreSQL` store integration tests.
//!
//! These need a running database (see `TEST_DB_*` variables) and are
//! ignored by default:
//!
//! ```sh
//! cargo test -p colloquy-db --test postgres_store -- --ignored
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use colloquy_db::entities::{comment, reaction, reaction::ReactionType};
use colloquy_db::store::{CommentFilter, DocumentStore, ReactionFilter};
use colloquy_db::test_utils::TestDatabase;

fn comment(id: &str, reply_to_id: Option<&str>) -> comment::Model {
    comment::Model {
        id: id.to_string(),
        parent_id: "paper-7".to_string(),
        reply_to_id: reply_to_id.map(ToString::to_string),
        author_id: "alice".to_string(),
        author_name: "Alice".to_string(),
        author_role: "Member".to_string(),
        content: format!("comment {id}"),
        created_at: Utc::now().into(),
    }
}

fn reaction(id: &str, user_id: &str, reaction_type: ReactionType) -> reaction::Model {
    reaction::Model {
        id: id.to_string(),
        parent_id: "paper-7".to_string(),
        user_id: user_id.to_string(),
        reaction_type,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_comment_round_trip_and_orphan_survives_delete() {
    let db = TestDatabase::connect().await.expect("test database");
    let (comments, _) = db.stores();

    comments.put(comment("c1", None)).await.unwrap();
    comments.put(comment("c2", Some("c1"))).await.unwrap();

    assert!(comments.delete("c1").await.unwrap());
    let remaining = comments
        .query(&CommentFilter::for_parent("paper-7"))
        .await
        .unwrap();

    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].reply_to_id.as_deref(), Some("c1"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_reaction_pair_stays_unique() {
    let db = TestDatabase::connect().await.expect("test database");
    let (_, reactions) = db.stores();

    reactions
        .put(reaction("r1", "bob", ReactionType::Like))
        .await
        .unwrap();
    // A second writer with a fresh id lands on the same row
    reactions
        .put(reaction("r2", "bob", ReactionType::Dislike))
        .await
        .unwrap();

    let found = reactions
        .query(&ReactionFilter::for_user("paper-7", "bob"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].reaction_type, ReactionType::Dislike);
}

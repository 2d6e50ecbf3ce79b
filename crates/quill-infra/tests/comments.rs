mod common;

use quill_core::DomainError;
use quill_core::domain::{CommentAuthor, CommentDraft, CommentStatus};
use quill_core::ports::CommentQuery;

use common::{Harness, admin, author, draft, editor};

fn guest(content: &str) -> CommentDraft {
    CommentDraft {
        content: content.to_string(),
        author_name: Some("Ada".to_string()),
        author_email: Some("ada@example.com".to_string()),
        parent_id: None,
    }
}

fn fields(err: DomainError) -> Vec<String> {
    match err {
        DomainError::Validation(errors) => errors.iter().map(|e| e.field.clone()).collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_guest_comment_waits_for_moderation() {
    let h = Harness::new();
    let post = h.published(&author(), "Open thread", 1).await;

    let comment = h
        .comments
        .submit(post.id, guest("  Nice post  "), None)
        .await
        .unwrap();

    assert_eq!(comment.status, CommentStatus::Pending);
    assert_eq!(comment.content, "Nice post");
    assert!(matches!(
        comment.author,
        CommentAuthor::Guest { ref name, .. } if name == "Ada"
    ));
}

#[tokio::test]
async fn test_guest_needs_name_and_valid_email() {
    let h = Harness::new();
    let post = h.published(&author(), "Open thread", 1).await;

    let err = h
        .comments
        .submit(
            post.id,
            CommentDraft {
                content: "Hello".to_string(),
                author_email: Some("not-an-email".to_string()),
                ..CommentDraft::default()
            },
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(fields(err), vec!["author_name", "author_email"]);
}

#[tokio::test]
async fn test_guest_email_length_is_capped() {
    let h = Harness::new();
    let post = h.published(&author(), "Open thread", 1).await;
    let long_email = format!(
        "{}@{}.{}.{}.com",
        "a".repeat(64),
        "x".repeat(63),
        "y".repeat(63),
        "z".repeat(63)
    );
    assert!(long_email.len() > 255);

    let err = h
        .comments
        .submit(
            post.id,
            CommentDraft {
                author_email: Some(long_email),
                ..guest("Hello")
            },
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(fields(err), vec!["author_email"]);
}

#[tokio::test]
async fn test_comment_length_is_capped() {
    let h = Harness::new();
    let post = h.published(&author(), "Open thread", 1).await;

    let err = h
        .comments
        .submit(post.id, guest(&"x".repeat(2001)), None)
        .await
        .unwrap_err();
    assert_eq!(fields(err), vec!["content"]);

    h.comments
        .submit(post.id, guest(&"x".repeat(2000)), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_replies_are_one_level_deep() {
    let h = Harness::new();
    let actor = author();
    let post = h.published(&actor, "Open thread", 1).await;
    let other = h.published(&actor, "Elsewhere", 2).await;

    let root = h.comments.submit(post.id, guest("Root"), None).await.unwrap();
    let reply = h
        .comments
        .submit(
            post.id,
            CommentDraft {
                parent_id: Some(root.id),
                ..guest("Reply")
            },
            None,
        )
        .await
        .unwrap();
    assert!(reply.is_reply());

    let err = h
        .comments
        .submit(
            post.id,
            CommentDraft {
                parent_id: Some(reply.id),
                ..guest("Too deep")
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(fields(err), vec!["parent_id"]);

    let err = h
        .comments
        .submit(
            other.id,
            CommentDraft {
                parent_id: Some(root.id),
                ..guest("Wrong post")
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(fields(err), vec!["parent_id"]);
}

#[tokio::test]
async fn test_cannot_comment_on_hidden_post() {
    let h = Harness::new();
    let post = h.lifecycle.create(&author(), draft("Draft")).await.unwrap();

    let err = h
        .comments
        .submit(post.id, guest("Sneaky"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_moderation_requires_capability() {
    let h = Harness::new();
    let actor = author();
    let post = h.published(&actor, "Open thread", 1).await;
    let comment = h.comments.submit(post.id, guest("Hi"), None).await.unwrap();

    let err = h
        .comments
        .moderate(&actor, comment.id, CommentStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    let approved = h
        .comments
        .moderate(&editor(), comment.id, CommentStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, CommentStatus::Approved);
    assert!(approved.is_visible());

    let rejected = h
        .comments
        .moderate(&admin(), comment.id, CommentStatus::Rejected)
        .await
        .unwrap();
    assert!(!rejected.is_visible());
}

#[tokio::test]
async fn test_deleting_comment_removes_replies() {
    let h = Harness::new();
    let moderator = editor();
    let post = h.published(&author(), "Open thread", 1).await;
    let root = h.comments.submit(post.id, guest("Root"), None).await.unwrap();
    let reply = h
        .comments
        .submit(
            post.id,
            CommentDraft {
                parent_id: Some(root.id),
                ..guest("Reply")
            },
            None,
        )
        .await
        .unwrap();

    h.comments.delete(&moderator, root.id).await.unwrap();

    assert!(matches!(
        h.comments.get(&moderator, reply.id).await,
        Err(DomainError::NotFound { .. })
    ));
    assert!(matches!(
        h.comments.delete(&moderator, root.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_moderation_queue_filters() {
    let h = Harness::new();
    let moderator = editor();
    let post = h.published(&author(), "Open thread", 1).await;
    let keep = h.comments.submit(post.id, guest("Great read"), None).await.unwrap();
    h.comments.submit(post.id, guest("Buy pills"), None).await.unwrap();
    h.comments
        .moderate(&moderator, keep.id, CommentStatus::Approved)
        .await
        .unwrap();

    let pending = h
        .comments
        .list(
            &moderator,
            CommentQuery {
                status: Some(CommentStatus::Pending),
                ..CommentQuery::default()
            },
            1,
        )
        .await
        .unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].content, "Buy pills");

    let searched = h
        .comments
        .list(
            &moderator,
            CommentQuery {
                search: Some("great".to_string()),
                ..CommentQuery::default()
            },
            1,
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 1);

    let err = h
        .comments
        .list(&author(), CommentQuery::default(), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
}

#[tokio::test]
async fn test_deleting_post_removes_its_comments() {
    let h = Harness::new();
    let actor = author();
    let moderator = editor();
    let post = h.published(&actor, "Short lived", 1).await;
    let comment = h.comments.submit(post.id, guest("Bye"), None).await.unwrap();

    h.lifecycle.delete(&actor, post.id).await.unwrap();

    assert!(matches!(
        h.comments.get(&moderator, comment.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

mod common;

use chrono::Duration;

use quill_core::DomainError;
use quill_core::domain::{LabelDraft, PostDraft, PostStatus};

use common::{Harness, author, draft, editor, label, t0};

#[tokio::test]
async fn test_category_defaults_and_slug_conflicts() {
    let h = Harness::new();
    let boss = editor();

    let category = h
        .taxonomy
        .create_category(&boss, label("Web Development"))
        .await
        .unwrap();
    assert_eq!(category.slug, "web-development");
    assert_eq!(category.color, "#6b7280");

    let err = h
        .taxonomy
        .create_category(&boss, label("Web development!"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref e) if e.has("slug")));

    let err = h
        .taxonomy
        .create_category(
            &boss,
            LabelDraft {
                color: Some("teal".to_string()),
                ..label("Design")
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref e) if e.has("color")));
}

#[tokio::test]
async fn test_authors_cannot_manage_taxonomy() {
    let h = Harness::new();

    let err = h
        .taxonomy
        .create_tag(&author(), label("Rust"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));
}

#[tokio::test]
async fn test_rename_keeps_identity() {
    let h = Harness::new();
    let boss = editor();
    let tag = h.taxonomy.create_tag(&boss, label("Rust")).await.unwrap();
    let other = h.taxonomy.create_tag(&boss, label("Go")).await.unwrap();

    let renamed = h
        .taxonomy
        .update_tag(
            &boss,
            tag.id,
            LabelDraft {
                slug: Some("rust".to_string()),
                color: Some("#dea584".to_string()),
                ..label("Rust Lang")
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.id, tag.id);
    assert_eq!(renamed.slug, "rust");
    assert_eq!(renamed.name, "Rust Lang");
    assert_eq!(renamed.created_at, tag.created_at);

    let err = h
        .taxonomy
        .update_tag(&boss, other.id, label("Rust"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(ref e) if e.has("slug")));
}

#[tokio::test]
async fn test_counts_only_include_live_posts() {
    let h = Harness::new();
    let boss = editor();
    let news = h.taxonomy.create_category(&boss, label("News")).await.unwrap();
    let rust = h.taxonomy.create_tag(&boss, label("Rust")).await.unwrap();

    h.lifecycle
        .create(
            &boss,
            PostDraft {
                status: PostStatus::Published,
                published_at: Some(t0() - Duration::hours(1)),
                category_id: Some(news.id),
                tag_ids: vec![rust.id],
                ..draft("Live")
            },
        )
        .await
        .unwrap();
    h.lifecycle
        .create(
            &boss,
            PostDraft {
                category_id: Some(news.id),
                tag_ids: vec![rust.id],
                ..draft("Not yet")
            },
        )
        .await
        .unwrap();

    let categories = h.taxonomy.categories().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].posts_count, 1);

    let tags = h.taxonomy.tags().await.unwrap();
    assert_eq!(tags[0].posts_count, 1);
}

#[tokio::test]
async fn test_deleting_labels_detaches_posts() {
    let h = Harness::new();
    let boss = editor();
    let news = h.taxonomy.create_category(&boss, label("News")).await.unwrap();
    let rust = h.taxonomy.create_tag(&boss, label("Rust")).await.unwrap();
    let post = h
        .lifecycle
        .create(
            &boss,
            PostDraft {
                category_id: Some(news.id),
                tag_ids: vec![rust.id],
                ..draft("Filed")
            },
        )
        .await
        .unwrap();

    h.taxonomy.delete_category(&boss, news.id).await.unwrap();
    h.taxonomy.delete_tag(&boss, rust.id).await.unwrap();

    let stored = h.lifecycle.get(post.id).await.unwrap();
    assert_eq!(stored.category_id, None);
    assert!(stored.tag_ids.is_empty());

    assert!(matches!(
        h.taxonomy.delete_tag(&boss, rust.id).await,
        Err(DomainError::NotFound { .. })
    ));
}

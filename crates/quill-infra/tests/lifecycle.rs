mod common;

use chrono::Duration;

use quill_core::DomainError;
use quill_core::domain::{PostDraft, PostId, PostStatus, TagId};
use quill_core::services::PostFilter;

use common::{Harness, author, draft, editor, label, t0};

fn field_errors(err: DomainError) -> Vec<String> {
    match err {
        DomainError::Validation(errors) => errors.iter().map(|e| e.field.clone()).collect(),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_publishing_without_date_stamps_now() {
    let h = Harness::new();
    let actor = author();

    let post = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                status: PostStatus::Published,
                ..draft("Hello World")
            },
        )
        .await
        .unwrap();

    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.version, 1);
    assert_eq!(post.published_at, Some(t0()));
    assert!(h.lifecycle.is_publicly_visible(&post, None));
}

#[tokio::test]
async fn test_publish_now_flow() {
    let h = Harness::new();
    let actor = author();

    let post = h.lifecycle.create(&actor, draft("Drafted")).await.unwrap();
    assert_eq!(post.status, PostStatus::Draft);
    assert_eq!(post.published_at, None);
    assert!(!h.lifecycle.is_publicly_visible(&post, None));

    h.clock.advance(Duration::hours(2));
    let published = h
        .lifecycle
        .update(
            &actor,
            post.id,
            PostDraft {
                status: PostStatus::Published,
                ..draft("Drafted")
            },
        )
        .await
        .unwrap();

    assert_eq!(published.published_at, Some(t0() + Duration::hours(2)));
    assert!(h.lifecycle.is_publicly_visible(&published, None));
}

#[tokio::test]
async fn test_republishing_keeps_original_date() {
    let h = Harness::new();
    let actor = author();
    let post = h.published(&actor, "Old News", 24).await;

    h.clock.advance(Duration::days(3));
    let edited = h
        .lifecycle
        .update(
            &actor,
            post.id,
            PostDraft {
                status: PostStatus::Published,
                content: "Edited body".to_string(),
                ..draft("Old News")
            },
        )
        .await
        .unwrap();

    assert_eq!(edited.published_at, post.published_at);
    assert_eq!(edited.content, "Edited body");
}

#[tokio::test]
async fn test_create_rejects_future_publication_date() {
    let h = Harness::new();

    let err = h
        .lifecycle
        .create(
            &author(),
            PostDraft {
                status: PostStatus::Published,
                published_at: Some(t0() + Duration::hours(1)),
                ..draft("From the future")
            },
        )
        .await
        .unwrap_err();

    assert_eq!(field_errors(err), vec!["published_at"]);
}

#[tokio::test]
async fn test_scheduled_requires_future_date() {
    let h = Harness::new();
    let actor = author();

    let missing = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                status: PostStatus::Scheduled,
                ..draft("No date")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_errors(missing), vec!["scheduled_at"]);

    let past = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                status: PostStatus::Scheduled,
                scheduled_at: Some(t0() - Duration::minutes(1)),
                ..draft("Past date")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_errors(past), vec!["scheduled_at"]);

    let post = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                status: PostStatus::Scheduled,
                scheduled_at: Some(t0() + Duration::days(1)),
                ..draft("Tomorrow")
            },
        )
        .await
        .unwrap();
    assert_eq!(post.status, PostStatus::Scheduled);
    assert_eq!(post.published_at, None);
}

#[tokio::test]
async fn test_scheduled_post_is_never_promoted() {
    let h = Harness::new();
    let actor = author();
    let post = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                status: PostStatus::Scheduled,
                scheduled_at: Some(t0() + Duration::hours(1)),
                ..draft("Later")
            },
        )
        .await
        .unwrap();

    h.clock.advance(Duration::days(2));

    let stored = h.lifecycle.get(post.id).await.unwrap();
    assert_eq!(stored.status, PostStatus::Scheduled);
    assert!(!h.lifecycle.is_publicly_visible(&stored, None));
}

#[tokio::test]
async fn test_slug_uniqueness() {
    let h = Harness::new();
    let actor = author();

    let first = h.lifecycle.create(&actor, draft("Hello World")).await.unwrap();
    let err = h
        .lifecycle
        .create(&actor, draft("Hello, World!"))
        .await
        .unwrap_err();
    assert_eq!(field_errors(err), vec!["slug"]);

    let second = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                slug: Some("Another One".to_string()),
                ..draft("Hello World")
            },
        )
        .await
        .unwrap();
    assert_eq!(second.slug, "another-one");

    let err = h
        .lifecycle
        .update(
            &actor,
            second.id,
            PostDraft {
                slug: Some(first.slug.clone()),
                ..draft("Hello World")
            },
        )
        .await
        .unwrap_err();
    assert_eq!(field_errors(err), vec!["slug"]);

    // keeping its own slug is not a conflict
    let same = h
        .lifecycle
        .update(
            &actor,
            first.id,
            PostDraft {
                slug: Some(first.slug.clone()),
                ..draft("Hello World, again")
            },
        )
        .await
        .unwrap();
    assert_eq!(same.slug, "hello-world");
    assert_eq!(same.title, "Hello World, again");
}

#[tokio::test]
async fn test_validation_collects_every_field() {
    let h = Harness::new();

    let err = h
        .lifecycle
        .create(
            &author(),
            PostDraft {
                title: "   ".to_string(),
                content: String::new(),
                featured_image: Some("not a url".to_string()),
                category_id: Some(quill_core::domain::CategoryId(99)),
                tag_ids: vec![TagId(7)],
                ..PostDraft::default()
            },
        )
        .await
        .unwrap_err();

    let fields = field_errors(err);
    for field in ["title", "slug", "content", "featured_image", "category_id", "tags"] {
        assert!(fields.iter().any(|f| f == field), "missing {field}");
    }
}

#[tokio::test]
async fn test_record_view_is_cumulative() {
    let h = Harness::new();
    let post = h.published(&author(), "Popular", 1).await;

    for _ in 0..5 {
        h.lifecycle.record_view(post.id).await.unwrap();
    }

    assert_eq!(h.lifecycle.get(post.id).await.unwrap().views_count, 5);
    assert!(matches!(
        h.lifecycle.record_view(PostId(999)).await,
        Err(DomainError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_views_are_all_counted() {
    let h = Harness::new();
    let id = h.published(&author(), "Trending", 1).await.id;

    let readers: Vec<_> = (0..50)
        .map(|_| {
            let lifecycle = h.lifecycle.clone();
            tokio::spawn(async move { lifecycle.record_view(id).await })
        })
        .collect();
    for reader in readers {
        reader.await.unwrap().unwrap();
    }

    assert_eq!(h.lifecycle.get(id).await.unwrap().views_count, 50);
}

#[tokio::test]
async fn test_draft_visibility() {
    let h = Harness::new();
    let owner = author();
    let post = h.lifecycle.create(&owner, draft("Secret")).await.unwrap();

    assert!(!h.lifecycle.is_publicly_visible(&post, None));
    assert!(!h.lifecycle.is_publicly_visible(&post, Some(&author())));
    assert!(h.lifecycle.is_publicly_visible(&post, Some(&owner)));
    assert!(h.lifecycle.is_publicly_visible(&post, Some(&editor())));
}

#[tokio::test]
async fn test_reading_time() {
    let h = Harness::new();
    let actor = author();

    let long = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                content: vec!["word"; 400].join(" "),
                ..draft("Long read")
            },
        )
        .await
        .unwrap();
    let short = h
        .lifecycle
        .create(
            &actor,
            PostDraft {
                content: "<p>Hi</p>".to_string(),
                ..draft("Short read")
            },
        )
        .await
        .unwrap();

    assert_eq!(long.reading_time(), 2);
    assert_eq!(short.reading_time(), 1);
}

#[tokio::test]
async fn test_versions_are_numbered_and_drafted() {
    let h = Harness::new();
    let actor = author();
    let original = h.published(&actor, "Guide", 5).await;

    let v2 = h
        .lifecycle
        .create_version(
            &actor,
            original.id,
            PostDraft {
                status: PostStatus::Published,
                published_at: Some(t0()),
                ..draft("Guide, revised")
            },
        )
        .await
        .unwrap();
    let v3 = h
        .lifecycle
        .create_version(&actor, original.id, draft("Guide, revised again"))
        .await
        .unwrap();

    assert_eq!(v2.version, 2);
    assert_eq!(v2.slug, "guide-v2");
    assert_eq!(v2.status, PostStatus::Draft);
    assert_eq!(v2.published_at, None);
    assert_eq!(v2.parent_id, Some(original.id));
    assert_eq!(v3.version, 3);
    assert_eq!(v3.slug, "guide-v3");

    let shown = h.lifecycle.show(&actor, original.id).await.unwrap();
    let versions: Vec<i32> = shown.versions.iter().map(|v| v.version).collect();
    assert_eq!(versions, vec![2, 3]);
}

#[tokio::test]
async fn test_deleting_parent_removes_versions() {
    let h = Harness::new();
    let actor = author();
    let original = h.lifecycle.create(&actor, draft("Parent")).await.unwrap();
    let version = h
        .lifecycle
        .create_version(&actor, original.id, draft("Child"))
        .await
        .unwrap();
    let nested = h
        .lifecycle
        .create_version(&actor, version.id, draft("Grandchild"))
        .await
        .unwrap();

    h.lifecycle.delete(&actor, original.id).await.unwrap();

    for id in [original.id, version.id, nested.id] {
        assert!(matches!(
            h.lifecycle.get(id).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}

#[tokio::test]
async fn test_only_owner_or_editor_may_edit() {
    let h = Harness::new();
    let owner = author();
    let post = h.lifecycle.create(&owner, draft("Mine")).await.unwrap();

    let err = h
        .lifecycle
        .update(&author(), post.id, draft("Stolen"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    let err = h.lifecycle.delete(&author(), post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Forbidden));

    let edited = h
        .lifecycle
        .update(&editor(), post.id, draft("Copy-edited"))
        .await
        .unwrap();
    assert_eq!(edited.title, "Copy-edited");
    assert_eq!(edited.author_id, owner.user_id);
}

#[tokio::test]
async fn test_listing_scopes_authors_to_their_posts() {
    let h = Harness::new();
    let alice = author();
    let bob = author();
    h.lifecycle.create(&alice, draft("Alice one")).await.unwrap();
    h.lifecycle.create(&alice, draft("Alice two")).await.unwrap();
    h.lifecycle.create(&bob, draft("Bob one")).await.unwrap();

    let own = h
        .lifecycle
        .list(
            &alice,
            PostFilter {
                author_id: Some(bob.user_id),
                ..PostFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(own.total, 2);
    assert!(own.items.iter().all(|p| p.author_id == alice.user_id));

    let all = h.lifecycle.list(&editor(), PostFilter::default()).await.unwrap();
    assert_eq!(all.total, 3);

    let searched = h
        .lifecycle
        .list(
            &editor(),
            PostFilter {
                search: Some("BOB".to_string()),
                ..PostFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(searched.total, 1);
}

#[tokio::test]
async fn test_tags_and_category_are_attached() {
    let h = Harness::new();
    let boss = editor();
    let category = h
        .taxonomy
        .create_category(&boss, label("Engineering"))
        .await
        .unwrap();
    let tag = h.taxonomy.create_tag(&boss, label("Rust")).await.unwrap();

    let post = h
        .lifecycle
        .create(
            &author(),
            PostDraft {
                category_id: Some(category.id),
                tag_ids: vec![tag.id, tag.id],
                ..draft("Tagged")
            },
        )
        .await
        .unwrap();

    assert_eq!(post.category_id, Some(category.id));
    assert_eq!(post.tag_ids.len(), 1);
    assert!(post.tag_ids.contains(&tag.id));
}

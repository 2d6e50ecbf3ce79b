#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use quill_core::domain::{Actor, LabelDraft, Post, PostDraft, PostStatus, Role};
use quill_core::ports::{CapabilityChecker, ManualClock, RoleCapabilities};
use quill_core::services::{BlogService, CommentService, PostLifecycleManager, TaxonomyService};
use quill_infra::InMemoryStore;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Every service wired to one in-memory store and a clock frozen at [`t0`].
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub clock: Arc<ManualClock>,
    pub lifecycle: Arc<PostLifecycleManager>,
    pub blog: BlogService,
    pub comments: CommentService,
    pub taxonomy: TaxonomyService,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(t0()));
        let capabilities: Arc<dyn CapabilityChecker> = Arc::new(RoleCapabilities);

        let lifecycle = Arc::new(PostLifecycleManager::new(
            store.clone(),
            store.clone(),
            store.clone(),
            capabilities.clone(),
            clock.clone(),
        ));
        let blog = BlogService::new(
            lifecycle.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
        );
        let comments = CommentService::new(
            lifecycle.clone(),
            store.clone(),
            capabilities.clone(),
            clock.clone(),
        );
        let taxonomy = TaxonomyService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            capabilities,
            clock.clone(),
        );

        Self {
            store,
            clock,
            lifecycle,
            blog,
            comments,
            taxonomy,
        }
    }

    /// Create a post that went live `hours_ago` hours before now.
    pub async fn published(&self, actor: &Actor, title: &str, hours_ago: i64) -> Post {
        self.lifecycle
            .create(
                actor,
                PostDraft {
                    status: PostStatus::Published,
                    published_at: Some(t0() - Duration::hours(hours_ago)),
                    ..draft(title)
                },
            )
            .await
            .unwrap()
    }
}

pub fn author() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Author)
}

pub fn editor() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Editor)
}

pub fn admin() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Admin)
}

pub fn draft(title: &str) -> PostDraft {
    PostDraft {
        title: title.to_string(),
        content: "A short body about Rust and blogging.".to_string(),
        ..PostDraft::default()
    }
}

pub fn label(name: &str) -> LabelDraft {
    LabelDraft {
        name: name.to_string(),
        ..LabelDraft::default()
    }
}

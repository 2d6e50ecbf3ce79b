//! Post lifecycle: status and publish-date invariants, ownership checks and
//! the parent/version linkage.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    Actor, NewPost, Page, PageRequest, Post, PostDraft, PostId, PostMeta, PostStatus, TagId, slugify,
};
use crate::error::{DomainError, RepoError, ValidationErrors};
use crate::ports::{
    Action, CapabilityChecker, CategoryRepository, Clock, PostQuery, PostRepository, TagRepository,
};

use super::validation;

/// Posts per page in the editorial listing.
pub const DASHBOARD_PAGE_SIZE: u64 = 15;

const MAX_TITLE: usize = 255;
const MAX_SLUG: usize = 255;
const MAX_EXCERPT: usize = 500;
const MAX_SEO_TITLE: usize = 60;
const MAX_SEO_DESCRIPTION: usize = 160;

/// Filters accepted by the editorial post listing.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Only honoured for actors who may edit all content.
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: u64,
}

/// A post together with its direct versions.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithVersions {
    #[serde(flatten)]
    pub post: Post,
    pub versions: Vec<Post>,
}

/// Owns every state change a post goes through.
pub struct PostLifecycleManager {
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    capabilities: Arc<dyn CapabilityChecker>,
    clock: Arc<dyn Clock>,
}

impl PostLifecycleManager {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
        capabilities: Arc<dyn CapabilityChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            categories,
            tags,
            capabilities,
            clock,
        }
    }

    /// Create an original post (version 1) owned by `actor`.
    pub async fn create(&self, actor: &Actor, draft: PostDraft) -> Result<Post, DomainError> {
        let now = self.clock.now();
        let slug = draft
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&draft.title));

        let mut errors = self.validate(&draft, &slug, None, now).await?;
        if draft.published_at.is_some_and(|at| at > now) {
            errors.add("published_at", "Publication date cannot be in the future.");
        }
        errors.into_result()?;

        let published_at = match (draft.status, draft.published_at) {
            (PostStatus::Published, None) => Some(now),
            (_, supplied) => supplied,
        };

        let post = self
            .posts
            .insert(new_post(actor.user_id, slug, published_at, draft, 1, None, now))
            .await?;

        tracing::info!(
            post_id = %post.id,
            slug = %post.slug,
            status = %post.status,
            "Post created"
        );
        Ok(post)
    }

    /// Create a new draft version of `parent_id`.
    ///
    /// The version number is one past the highest of the parent and its
    /// existing versions. A missing slug becomes `<parent-slug>-v<version>`.
    pub async fn create_version(
        &self,
        actor: &Actor,
        parent_id: PostId,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let parent = self.get(parent_id).await?;
        self.authorize_edit(actor, &parent)?;

        let now = self.clock.now();
        let version = self
            .posts
            .versions_of(parent.id)
            .await?
            .iter()
            .map(|v| v.version)
            .fold(parent.version, i32::max)
            + 1;

        let slug = draft
            .slug
            .as_deref()
            .map(slugify)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{}-v{}", parent.slug, version));

        let draft = PostDraft {
            status: PostStatus::Draft,
            published_at: None,
            scheduled_at: None,
            ..draft
        };
        self.validate(&draft, &slug, None, now).await?.into_result()?;

        let post = self
            .posts
            .insert(new_post(actor.user_id, slug, None, draft, version, Some(parent.id), now))
            .await?;

        tracing::info!(
            post_id = %post.id,
            parent_id = %parent.id,
            version = post.version,
            "Post version created"
        );
        Ok(post)
    }

    /// Replace the editable fields of a post. The author never changes.
    pub async fn update(
        &self,
        actor: &Actor,
        id: PostId,
        draft: PostDraft,
    ) -> Result<Post, DomainError> {
        let existing = self.get(id).await?;
        self.authorize_edit(actor, &existing)?;

        let now = self.clock.now();
        let slug = match draft.slug.as_deref() {
            Some(slug) => slugify(slug),
            None => existing.slug.clone(),
        };
        self.validate(&draft, &slug, Some(existing.id), now)
            .await?
            .into_result()?;

        let published_at = match (draft.status, draft.published_at) {
            (PostStatus::Published, None) if existing.status != PostStatus::Published => Some(now),
            (PostStatus::Published, None) => existing.published_at.or(Some(now)),
            (_, supplied) => supplied,
        };

        let previous_status = existing.status;
        let updated = Post {
            title: draft.title.trim().to_string(),
            slug,
            excerpt: validation::non_blank(draft.excerpt),
            content: draft.content,
            featured_image: validation::non_blank(draft.featured_image),
            status: draft.status,
            meta: draft.meta,
            published_at,
            scheduled_at: draft.scheduled_at,
            category_id: draft.category_id,
            tag_ids: draft.tag_ids.into_iter().collect(),
            updated_at: now,
            ..existing
        };

        let post = self.posts.update(updated).await.map_err(|e| not_found(e, id))?;

        if previous_status != post.status {
            tracing::info!(
                post_id = %post.id,
                from = %previous_status,
                to = %post.status,
                "Post status changed"
            );
        } else {
            tracing::debug!(post_id = %post.id, "Post updated");
        }
        Ok(post)
    }

    /// Delete a post together with its versions, comments and tag links.
    pub async fn delete(&self, actor: &Actor, id: PostId) -> Result<(), DomainError> {
        let post = self.get(id).await?;
        self.authorize_edit(actor, &post)?;

        self.posts.delete(id).await.map_err(|e| not_found(e, id))?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Count one read. No deduplication or throttling.
    pub async fn record_view(&self, id: PostId) -> Result<(), DomainError> {
        self.posts
            .increment_views(id)
            .await
            .map_err(|e| not_found(e, id))
    }

    /// Whether `requester` may read `post` right now.
    ///
    /// Live posts are visible to everyone; anything else only to its author and
    /// to actors who may edit all content.
    pub fn is_publicly_visible(&self, post: &Post, requester: Option<&Actor>) -> bool {
        if post.is_live_at(self.clock.now()) {
            return true;
        }
        requester.is_some_and(|actor| self.can_manage(actor, post))
    }

    /// Editorial view of a single post with its versions.
    pub async fn show(&self, actor: &Actor, id: PostId) -> Result<PostWithVersions, DomainError> {
        let post = self.get(id).await?;
        self.authorize_edit(actor, &post)?;
        let versions = self.posts.versions_of(post.id).await?;
        Ok(PostWithVersions { post, versions })
    }

    /// Editorial listing, newest first. Authors only ever see their own posts.
    pub async fn list(&self, actor: &Actor, filter: PostFilter) -> Result<Page<Post>, DomainError> {
        let author_id = if self.capabilities.can(actor, Action::EditAllContent) {
            filter.author_id
        } else {
            Some(actor.user_id)
        };

        let query = PostQuery {
            status: filter.status,
            author_id,
            search: validation::non_blank(filter.search),
            ..PostQuery::default()
        };
        let page = PageRequest::new(filter.page, DASHBOARD_PAGE_SIZE);
        Ok(self.posts.list(&query, page).await?)
    }

    pub async fn get(&self, id: PostId) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", id))
    }

    fn can_manage(&self, actor: &Actor, post: &Post) -> bool {
        post.is_owned_by(actor.user_id) || self.capabilities.can(actor, Action::EditAllContent)
    }

    fn authorize_edit(&self, actor: &Actor, post: &Post) -> Result<(), DomainError> {
        if self.can_manage(actor, post) {
            Ok(())
        } else {
            tracing::warn!(post_id = %post.id, user_id = %actor.user_id, "Post access denied");
            Err(DomainError::Forbidden)
        }
    }

    async fn validate(
        &self,
        draft: &PostDraft,
        slug: &str,
        except: Option<PostId>,
        now: DateTime<Utc>,
    ) -> Result<ValidationErrors, DomainError> {
        let mut errors = ValidationErrors::new();

        if validation::required(&mut errors, "title", &draft.title, "Post title is required.") {
            validation::max_chars(&mut errors, "title", draft.title.trim(), MAX_TITLE);
        }

        if slug.is_empty() {
            errors.add("slug", "Post slug is required.");
        } else if slug.len() > MAX_SLUG {
            validation::max_chars(&mut errors, "slug", slug, MAX_SLUG);
        } else if self.posts.slug_exists(slug, except).await? {
            errors.add("slug", "This slug is already taken.");
        }

        validation::required(&mut errors, "content", &draft.content, "Post content is required.");

        if let Some(excerpt) = &draft.excerpt {
            validation::max_chars(&mut errors, "excerpt", excerpt, MAX_EXCERPT);
        }

        validation::url(
            &mut errors,
            "featured_image",
            draft.featured_image.as_ref().filter(|s| !s.trim().is_empty()),
            "Featured image must be a valid URL.",
        );

        match draft.scheduled_at {
            Some(at) if at <= now => {
                errors.add("scheduled_at", "Scheduled date must be in the future.");
            }
            None if draft.status == PostStatus::Scheduled => {
                errors.add("scheduled_at", "A scheduled post needs a scheduled date.");
            }
            _ => {}
        }

        if let Some(category_id) = draft.category_id {
            if self.categories.find_by_id(category_id).await?.is_none() {
                errors.add("category_id", "Selected category does not exist.");
            }
        }

        let wanted: BTreeSet<TagId> = draft.tag_ids.iter().copied().collect();
        if !wanted.is_empty() {
            let ids: Vec<TagId> = wanted.iter().copied().collect();
            let found = self.tags.find_by_ids(&ids).await?;
            if found.len() != wanted.len() {
                errors.add("tags", "One or more selected tags do not exist.");
            }
        }

        if let Some(meta) = &draft.meta {
            validate_meta(&mut errors, meta);
        }

        Ok(errors)
    }
}

fn validate_meta(errors: &mut ValidationErrors, meta: &PostMeta) {
    if let Some(title) = &meta.seo_title {
        validation::max_chars(errors, "meta.seo_title", title, MAX_SEO_TITLE);
    }
    if let Some(description) = &meta.seo_description {
        validation::max_chars(errors, "meta.seo_description", description, MAX_SEO_DESCRIPTION);
    }
    validation::url(
        errors,
        "meta.canonical_url",
        meta.canonical_url.as_ref(),
        "Canonical URL must be a valid URL.",
    );
}

fn new_post(
    author_id: Uuid,
    slug: String,
    published_at: Option<DateTime<Utc>>,
    draft: PostDraft,
    version: i32,
    parent_id: Option<PostId>,
    now: DateTime<Utc>,
) -> NewPost {
    NewPost {
        title: draft.title.trim().to_string(),
        slug,
        excerpt: validation::non_blank(draft.excerpt),
        content: draft.content,
        featured_image: validation::non_blank(draft.featured_image),
        status: draft.status,
        meta: draft.meta,
        published_at,
        scheduled_at: draft.scheduled_at,
        author_id,
        category_id: draft.category_id,
        tag_ids: draft.tag_ids.into_iter().collect(),
        version,
        parent_id,
        created_at: now,
    }
}

fn not_found(err: RepoError, id: PostId) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found("post", id),
        other => other.into(),
    }
}

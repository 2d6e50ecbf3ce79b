use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryId, Comment, CommentId, CommentStatus, NewComment, NewLabel, NewPost, Page,
    PageRequest, Post, PostId, PostStatus, Tag, TagId, User,
};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Overwrite an existing entity.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, along with everything that depends on it.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Sort order for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Most recently created first.
    #[default]
    Newest,
    /// Most recently published first.
    RecentlyPublished,
}

/// "Shares the category or any of these tags".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTo {
    pub category_id: Option<CategoryId>,
    pub tag_ids: Vec<TagId>,
}

/// Filters for post listings. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    /// Substring of title, excerpt or content (case-insensitive).
    pub search: Option<String>,
    pub category_id: Option<CategoryId>,
    pub tag_id: Option<TagId>,
    /// Only posts readers can see at this instant.
    pub live_at: Option<DateTime<Utc>>,
    pub with_featured_image: bool,
    pub exclude: Option<PostId>,
    pub related: Option<RelatedTo>,
    pub order: PostOrder,
}

impl PostQuery {
    /// In-process evaluation of the filter, used by stores without a query engine.
    pub fn matches(&self, post: &Post) -> bool {
        if self.status.is_some_and(|s| s != post.status) {
            return false;
        }
        if self.author_id.is_some_and(|a| a != post.author_id) {
            return false;
        }
        if let Some(term) = &self.search {
            let term = term.to_lowercase();
            let hit = post.title.to_lowercase().contains(&term)
                || post.content.to_lowercase().contains(&term)
                || post
                    .excerpt
                    .as_deref()
                    .is_some_and(|e| e.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if self.category_id.is_some() && self.category_id != post.category_id {
            return false;
        }
        if self.tag_id.is_some_and(|t| !post.tag_ids.contains(&t)) {
            return false;
        }
        if self.live_at.is_some_and(|now| !post.is_live_at(now)) {
            return false;
        }
        if self.with_featured_image && post.featured_image.is_none() {
            return false;
        }
        if self.exclude == Some(post.id) {
            return false;
        }
        if let Some(related) = &self.related {
            let same_category =
                related.category_id.is_some() && related.category_id == post.category_id;
            let shared_tag = related.tag_ids.iter().any(|t| post.tag_ids.contains(t));
            if !same_category && !shared_tag {
                return false;
            }
        }
        true
    }

    /// Sort `posts` in place according to [`PostQuery::order`].
    pub fn sort(&self, posts: &mut [Post]) {
        match self.order {
            PostOrder::Newest => {
                posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
            }
            PostOrder::RecentlyPublished => posts
                .sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id))),
        }
    }
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, PostId> {
    async fn insert(&self, post: NewPost) -> Result<Post, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// Whether any post other than `except` already uses `slug`.
    async fn slug_exists(&self, slug: &str, except: Option<PostId>) -> Result<bool, RepoError>;

    /// Direct versions of `parent`, lowest version first.
    async fn versions_of(&self, parent: PostId) -> Result<Vec<Post>, RepoError>;

    /// Add one to the view counter.
    async fn increment_views(&self, id: PostId) -> Result<(), RepoError>;

    async fn list(&self, query: &PostQuery, page: PageRequest) -> Result<Page<Post>, RepoError>;

    /// Number of posts live at `now`, per category.
    async fn live_counts_by_category(
        &self,
        now: DateTime<Utc>,
    ) -> Result<HashMap<CategoryId, u64>, RepoError>;

    /// Number of posts live at `now`, per tag.
    async fn live_counts_by_tag(&self, now: DateTime<Utc>) -> Result<HashMap<TagId, u64>, RepoError>;
}

/// Filters for the comment moderation listing.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub post_id: Option<PostId>,
    pub status: Option<CommentStatus>,
    pub search: Option<String>,
}

impl CommentQuery {
    pub fn matches(&self, comment: &Comment) -> bool {
        self.post_id.is_none_or(|p| p == comment.post_id)
            && self.status.is_none_or(|s| s == comment.status)
            && self.search.as_deref().is_none_or(|term| {
                comment
                    .content
                    .to_lowercase()
                    .contains(&term.to_lowercase())
            })
    }
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, CommentId> {
    async fn insert(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// All comments matching `query`, newest first.
    async fn find_all(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError>;

    async fn list(&self, query: &CommentQuery, page: PageRequest)
    -> Result<Page<Comment>, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, CategoryId> {
    async fn insert(&self, category: NewLabel) -> Result<Category, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    async fn slug_exists(&self, slug: &str, except: Option<CategoryId>)
    -> Result<bool, RepoError>;

    /// Every category, alphabetically.
    async fn all(&self) -> Result<Vec<Category>, RepoError>;
}

/// Tag repository.
#[async_trait]
pub trait TagRepository: BaseRepository<Tag, TagId> {
    async fn insert(&self, tag: NewLabel) -> Result<Tag, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Tag>, RepoError>;

    async fn slug_exists(&self, slug: &str, except: Option<TagId>) -> Result<bool, RepoError>;

    async fn find_by_ids(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepoError>;

    /// Every tag, alphabetically.
    async fn all(&self) -> Result<Vec<Tag>, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    async fn insert(&self, user: User) -> Result<User, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
}

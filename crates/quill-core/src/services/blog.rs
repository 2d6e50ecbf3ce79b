//! Reader-facing blog queries.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    Actor, Category, Comment, CommentStatus, CommentThread, Counted, Page, PageRequest, Post, Tag,
};
use crate::error::DomainError;
use crate::ports::{
    CategoryRepository, Clock, CommentQuery, CommentRepository, PostOrder, PostQuery,
    PostRepository, RelatedTo, TagRepository,
};

use super::lifecycle::PostLifecycleManager;
use super::taxonomy::{with_category_counts, with_tag_counts};
use super::validation;

/// Posts per page on the public index.
pub const BLOG_PAGE_SIZE: u64 = 12;
const FEATURED_POSTS: u64 = 3;
const RELATED_POSTS: u64 = 3;
const INDEX_TAGS: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct BlogQuery {
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    pub page: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlogIndex {
    pub posts: Page<Post>,
    pub featured: Vec<Post>,
    pub categories: Vec<Counted<Category>>,
    pub tags: Vec<Counted<Tag>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub post: Post,
    pub comments: Vec<CommentThread>,
    pub related: Vec<Post>,
}

pub struct BlogService {
    lifecycle: Arc<PostLifecycleManager>,
    posts: Arc<dyn PostRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    comments: Arc<dyn CommentRepository>,
    clock: Arc<dyn Clock>,
}

impl BlogService {
    pub fn new(
        lifecycle: Arc<PostLifecycleManager>,
        posts: Arc<dyn PostRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
        comments: Arc<dyn CommentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            lifecycle,
            posts,
            categories,
            tags,
            comments,
            clock,
        }
    }

    /// The public front page: live posts, featured posts and taxonomy counts.
    pub async fn index(&self, query: BlogQuery) -> Result<BlogIndex, DomainError> {
        let now = self.clock.now();
        let page = PageRequest::new(query.page, BLOG_PAGE_SIZE);

        let mut filter = PostQuery {
            live_at: Some(now),
            search: validation::non_blank(query.search),
            order: PostOrder::RecentlyPublished,
            ..PostQuery::default()
        };

        let mut unknown_filter = false;
        if let Some(slug) = validation::non_blank(query.category) {
            match self.categories.find_by_slug(&slug).await? {
                Some(category) => filter.category_id = Some(category.id),
                None => unknown_filter = true,
            }
        }
        if let Some(slug) = validation::non_blank(query.tag) {
            match self.tags.find_by_slug(&slug).await? {
                Some(tag) => filter.tag_id = Some(tag.id),
                None => unknown_filter = true,
            }
        }

        let posts = if unknown_filter {
            page.slice(Vec::new())
        } else {
            self.posts.list(&filter, page).await?
        };

        let featured = self
            .posts
            .list(
                &PostQuery {
                    live_at: Some(now),
                    with_featured_image: true,
                    order: PostOrder::RecentlyPublished,
                    ..PostQuery::default()
                },
                PageRequest::new(1, FEATURED_POSTS),
            )
            .await?
            .items;

        let categories = with_category_counts(
            self.categories.all().await?,
            &self.posts.live_counts_by_category(now).await?,
        );

        let mut tags = with_tag_counts(
            self.tags.all().await?,
            &self.posts.live_counts_by_tag(now).await?,
        );
        tags.sort_by(|a, b| b.posts_count.cmp(&a.posts_count));
        tags.truncate(INDEX_TAGS);

        Ok(BlogIndex {
            posts,
            featured,
            categories,
            tags,
        })
    }

    /// A single post by slug, with approved comments and related posts.
    ///
    /// Every successful call counts as a view.
    pub async fn show(&self, slug: &str, viewer: Option<&Actor>) -> Result<PostPage, DomainError> {
        let mut post = self
            .posts
            .find_by_slug(slug)
            .await?
            .filter(|post| self.lifecycle.is_publicly_visible(post, viewer))
            .ok_or_else(|| DomainError::not_found("post", slug))?;

        let approved = self
            .comments
            .find_all(&CommentQuery {
                post_id: Some(post.id),
                status: Some(CommentStatus::Approved),
                search: None,
            })
            .await?;

        self.lifecycle.record_view(post.id).await?;
        post.views_count += 1;

        let related = self
            .posts
            .list(
                &PostQuery {
                    live_at: Some(self.clock.now()),
                    exclude: Some(post.id),
                    related: Some(RelatedTo {
                        category_id: post.category_id,
                        tag_ids: post.tag_ids.iter().copied().collect(),
                    }),
                    order: PostOrder::RecentlyPublished,
                    ..PostQuery::default()
                },
                PageRequest::new(1, RELATED_POSTS),
            )
            .await?
            .items;

        tracing::debug!(post_id = %post.id, views = post.views_count, "Post viewed");

        Ok(PostPage {
            post,
            comments: thread(approved),
            related,
        })
    }
}

/// Group newest-first comments into top-level threads with oldest-first replies.
fn thread(comments: Vec<Comment>) -> Vec<CommentThread> {
    let (roots, mut replies): (Vec<Comment>, Vec<Comment>) =
        comments.into_iter().partition(|c| !c.is_reply());
    replies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    roots
        .into_iter()
        .map(|comment| {
            let replies = replies
                .iter()
                .filter(|r| r.parent_id == Some(comment.id))
                .cloned()
                .collect();
            CommentThread { comment, replies }
        })
        .collect()
}

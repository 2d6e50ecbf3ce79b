//! Reader-facing blog handlers.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use quill_core::domain::{Category, CommentDraft, CommentId, CommentThread, Counted, PostId, Tag};
use quill_core::services::BlogQuery;
use quill_shared::dto::{BlogParams, CommentRequest};
use quill_shared::{ApiResponse, Paginated};

use super::{PostView, paginated};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BlogIndexResponse {
    pub posts: Paginated<PostView>,
    pub featured: Vec<PostView>,
    pub categories: Vec<Counted<Category>>,
    pub tags: Vec<Counted<Tag>>,
}

#[derive(Serialize)]
pub struct BlogPostResponse {
    pub post: PostView,
    pub comments: Vec<CommentThread>,
    pub related: Vec<PostView>,
}

/// GET /api/blog
pub async fn index(
    state: web::Data<AppState>,
    params: web::Query<BlogParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let index = state
        .blog
        .index(BlogQuery {
            search: params.search,
            category: params.category,
            tag: params.tag,
            page: params.page.unwrap_or(1),
        })
        .await?;

    Ok(HttpResponse::Ok().json(BlogIndexResponse {
        posts: paginated(index.posts, PostView::from),
        featured: index.featured.into_iter().map(PostView::from).collect(),
        categories: index.categories,
        tags: index.tags,
    }))
}

/// GET /api/blog/{slug}
///
/// Counts a view. Drafts and scheduled posts are only shown to their owner
/// and to editors.
pub async fn show(
    state: web::Data<AppState>,
    path: web::Path<String>,
    identity: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let viewer = identity.actor();
    let page = state.blog.show(&path, viewer.as_ref()).await?;

    Ok(HttpResponse::Ok().json(BlogPostResponse {
        post: page.post.into(),
        comments: page.comments,
        related: page.related.into_iter().map(PostView::from).collect(),
    }))
}

/// POST /api/blog/{post_id}/comments
pub async fn comment(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    identity: OptionalIdentity,
    body: web::Json<CommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let viewer = identity.actor();

    let comment = state
        .comments
        .submit(
            PostId(path.into_inner()),
            CommentDraft {
                content: req.content,
                author_name: req.author_name,
                author_email: req.author_email,
                parent_id: req.parent_id.map(CommentId),
            },
            viewer.as_ref(),
        )
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        comment,
        "Your comment has been submitted and is awaiting moderation.",
    )))
}

//! Editorial post handlers. Every route requires a signed-in user.

use actix_web::{HttpResponse, web};
use serde::Serialize;

use quill_core::domain::{CategoryId, PostDraft, PostId, PostMeta, PostStatus, TagId};
use quill_core::services::PostFilter;
use quill_shared::dto::{PostListParams, PostRequest};

use super::{PostView, paginated, parse_field};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// A post with its direct versions.
#[derive(Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub versions: Vec<PostView>,
}

/// Build a draft from a request body. Create and update must name a status;
/// versions are always drafts, so `fallback` lets them omit it.
fn post_draft(req: PostRequest, fallback: Option<PostStatus>) -> AppResult<PostDraft> {
    let status = match (req.status.as_deref(), fallback) {
        (Some(status), _) => parse_field("status", status)?,
        (None, Some(status)) => status,
        (None, None) => return Err(AppError::field("status", "Post status is required.")),
    };

    Ok(PostDraft {
        title: req.title,
        slug: req.slug,
        excerpt: req.excerpt,
        content: req.content,
        featured_image: req.featured_image,
        status,
        meta: req.meta.map(|meta| PostMeta {
            seo_title: meta.seo_title,
            seo_description: meta.seo_description,
            canonical_url: meta.canonical_url,
        }),
        published_at: req.published_at,
        scheduled_at: req.scheduled_at,
        category_id: req.category_id.map(CategoryId),
        tag_ids: req.tags.into_iter().map(TagId).collect(),
    })
}

/// GET /api/posts
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    params: web::Query<PostListParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let status = params
        .status
        .as_deref()
        .map(|s| parse_field("status", s))
        .transpose()?;

    let page = state
        .lifecycle
        .list(
            &identity.actor(),
            PostFilter {
                status,
                author_id: params.author_id,
                search: params.search,
                page: params.page.unwrap_or(1),
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(paginated(page, PostView::from)))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = post_draft(body.into_inner(), None)?;
    let post = state.lifecycle.create(&identity.actor(), draft).await?;

    Ok(HttpResponse::Created().json(PostView::from(post)))
}

/// GET /api/posts/{id}
pub async fn show(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let found = state
        .lifecycle
        .show(&identity.actor(), PostId(path.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(PostDetail {
        post: found.post.into(),
        versions: found.versions.into_iter().map(PostView::from).collect(),
    }))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = post_draft(body.into_inner(), None)?;
    let post = state
        .lifecycle
        .update(&identity.actor(), PostId(path.into_inner()), draft)
        .await?;

    Ok(HttpResponse::Ok().json(PostView::from(post)))
}

/// DELETE /api/posts/{id}
///
/// Also removes the post's versions and comments.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    state
        .lifecycle
        .delete(&identity.actor(), PostId(path.into_inner()))
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/posts/{id}/versions
pub async fn create_version(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<PostRequest>,
) -> AppResult<HttpResponse> {
    let draft = post_draft(body.into_inner(), Some(PostStatus::Draft))?;
    let version = state
        .lifecycle
        .create_version(&identity.actor(), PostId(path.into_inner()), draft)
        .await?;

    Ok(HttpResponse::Created().json(PostView::from(version)))
}

//! Comment moderation handlers.

use actix_web::{HttpResponse, web};

use quill_core::domain::{CommentId, CommentStatus, PostId};
use quill_core::ports::CommentQuery;
use quill_shared::dto::{CommentListParams, ModerateCommentRequest};

use super::{paginated, parse_field};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/comments
pub async fn list(
    state: web::Data<AppState>,
    identity: Identity,
    params: web::Query<CommentListParams>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let status = params
        .status
        .as_deref()
        .map(|s| parse_field("status", s))
        .transpose()?;

    let page = state
        .comments
        .list(
            &identity.actor(),
            CommentQuery {
                post_id: params.post_id.map(PostId),
                status,
                search: params.search,
            },
            params.page.unwrap_or(1),
        )
        .await?;

    Ok(HttpResponse::Ok().json(paginated(page, |comment| comment)))
}

/// GET /api/comments/{id}
pub async fn show(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let comment = state
        .comments
        .get(&identity.actor(), CommentId(path.into_inner()))
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// PUT /api/comments/{id}
pub async fn moderate(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<ModerateCommentRequest>,
) -> AppResult<HttpResponse> {
    let status: CommentStatus = parse_field("status", &body.status)?;
    let comment = state
        .comments
        .moderate(&identity.actor(), CommentId(path.into_inner()), status)
        .await?;

    Ok(HttpResponse::Ok().json(comment))
}

/// DELETE /api/comments/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    state
        .comments
        .delete(&identity.actor(), CommentId(path.into_inner()))
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

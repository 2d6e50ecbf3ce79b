//! Category and tag handlers. Listings are public; changes need an editor.

use actix_web::{HttpResponse, web};

use quill_core::domain::{CategoryId, LabelDraft, TagId};
use quill_shared::dto::LabelRequest;

use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn label_draft(body: web::Json<LabelRequest>) -> LabelDraft {
    let req = body.into_inner();
    LabelDraft {
        name: req.name,
        slug: req.slug,
        description: req.description,
        color: req.color,
    }
}

/// GET /api/categories
pub async fn list_categories(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.taxonomy.categories().await?))
}

/// POST /api/categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<LabelRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .taxonomy
        .create_category(&identity.actor(), label_draft(body))
        .await?;

    Ok(HttpResponse::Created().json(category))
}

/// PUT /api/categories/{id}
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<LabelRequest>,
) -> AppResult<HttpResponse> {
    let category = state
        .taxonomy
        .update_category(
            &identity.actor(),
            CategoryId(path.into_inner()),
            label_draft(body),
        )
        .await?;

    Ok(HttpResponse::Ok().json(category))
}

/// DELETE /api/categories/{id}
///
/// Posts in the category become uncategorized.
pub async fn delete_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    state
        .taxonomy
        .delete_category(&identity.actor(), CategoryId(path.into_inner()))
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/tags
pub async fn list_tags(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.taxonomy.tags().await?))
}

/// POST /api/tags
pub async fn create_tag(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<LabelRequest>,
) -> AppResult<HttpResponse> {
    let tag = state
        .taxonomy
        .create_tag(&identity.actor(), label_draft(body))
        .await?;

    Ok(HttpResponse::Created().json(tag))
}

/// PUT /api/tags/{id}
pub async fn update_tag(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    body: web::Json<LabelRequest>,
) -> AppResult<HttpResponse> {
    let tag = state
        .taxonomy
        .update_tag(&identity.actor(), TagId(path.into_inner()), label_draft(body))
        .await?;

    Ok(HttpResponse::Ok().json(tag))
}

/// DELETE /api/tags/{id}
pub async fn delete_tag(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    state
        .taxonomy
        .delete_tag(&identity.actor(), TagId(path.into_inner()))
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

//! Data Transfer Objects - request/response types for the API.
//!
//! Request bodies default every field so a missing value surfaces as a field
//! validation error instead of a deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a new user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// SEO fields of a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostMetaRequest {
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub canonical_url: Option<String>,
}

/// Body of `POST /posts`, `PUT /posts/{id}` and `POST /posts/{id}/versions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    /// `draft`, `published` or `scheduled`. Required on create and update;
    /// ignored for versions, which always start as drafts.
    pub status: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
    pub tags: Vec<i64>,
    pub meta: Option<PostMetaRequest>,
}

/// Query string of the editorial post listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostListParams {
    pub status: Option<String>,
    pub author_id: Option<Uuid>,
    pub search: Option<String>,
    pub page: Option<u64>,
}

/// Query string of the public blog index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogParams {
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Tag slug.
    pub tag: Option<String>,
    pub page: Option<u64>,
}

/// Body of `POST /blog/{post_id}/comments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentRequest {
    pub content: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub parent_id: Option<i64>,
}

/// Body of `PUT /comments/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerateCommentRequest {
    /// `pending`, `approved` or `rejected`.
    pub status: String,
}

/// Query string of the comment moderation listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentListParams {
    pub status: Option<String>,
    pub post_id: Option<i64>,
    pub search: Option<String>,
    pub page: Option<u64>,
}

/// Body for creating or updating a category or tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRequest {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

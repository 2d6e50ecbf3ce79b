//! HTTP handlers and route configuration.

mod auth;
mod blog;
mod comments;
mod health;
mod posts;
mod taxonomy;

use std::str::FromStr;

use actix_web::{HttpRequest, error::JsonPayloadError, error::QueryPayloadError, web};
use serde::Serialize;

use quill_core::domain::{Page, Post};
use quill_shared::{PageMeta, Paginated};

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::QueryConfig::default().error_handler(query_error))
        .service(
            web::scope("/api")
                // Public routes
                .route("/health", web::get().to(health::health_check))
                // Auth routes
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/me", web::get().to(auth::me)),
                )
                // Reader-facing blog
                .service(
                    web::scope("/blog")
                        .route("", web::get().to(blog::index))
                        .route("/{post_id}/comments", web::post().to(blog::comment))
                        .route("/{slug}", web::get().to(blog::show)),
                )
                // Editorial routes
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(posts::list))
                        .route("", web::post().to(posts::create))
                        .route("/{id}", web::get().to(posts::show))
                        .route("/{id}", web::put().to(posts::update))
                        .route("/{id}", web::delete().to(posts::delete))
                        .route("/{id}/versions", web::post().to(posts::create_version)),
                )
                .service(
                    web::scope("/comments")
                        .route("", web::get().to(comments::list))
                        .route("/{id}", web::get().to(comments::show))
                        .route("/{id}", web::put().to(comments::moderate))
                        .route("/{id}", web::delete().to(comments::delete)),
                )
                .service(
                    web::scope("/categories")
                        .route("", web::get().to(taxonomy::list_categories))
                        .route("", web::post().to(taxonomy::create_category))
                        .route("/{id}", web::put().to(taxonomy::update_category))
                        .route("/{id}", web::delete().to(taxonomy::delete_category)),
                )
                .service(
                    web::scope("/tags")
                        .route("", web::get().to(taxonomy::list_tags))
                        .route("", web::post().to(taxonomy::create_tag))
                        .route("/{id}", web::put().to(taxonomy::update_tag))
                        .route("/{id}", web::delete().to(taxonomy::delete_tag)),
                ),
        );
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

fn query_error(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// A post as rendered by the API, with its estimated reading time.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    /// Minutes.
    pub reading_time: u32,
}

impl From<Post> for PostView {
    fn from(post: Post) -> Self {
        let reading_time = post.reading_time();
        Self { post, reading_time }
    }
}

pub(crate) fn paginated<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> Paginated<U> {
    let meta = PageMeta::new(page.page, page.per_page, page.total);
    Paginated {
        data: page.items.into_iter().map(f).collect(),
        meta,
    }
}

/// Parse an enum-valued request field, reporting failure against `field`.
pub(crate) fn parse_field<T: FromStr>(field: &str, value: &str) -> AppResult<T> {
    value
        .parse()
        .map_err(|_| AppError::field(field, format!("The selected {field} is invalid.")))
}

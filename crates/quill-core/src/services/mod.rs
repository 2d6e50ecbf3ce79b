//! Application services - orchestrate ports to carry out use cases.

mod blog;
mod comments;
mod lifecycle;
mod taxonomy;
mod validation;

pub use blog::{BLOG_PAGE_SIZE, BlogIndex, BlogQuery, BlogService, PostPage};
pub use comments::{CommentService, MODERATION_PAGE_SIZE};
pub use lifecycle::{DASHBOARD_PAGE_SIZE, PostFilter, PostLifecycleManager, PostWithVersions};
pub use taxonomy::TaxonomyService;

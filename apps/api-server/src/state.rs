//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{
    CapabilityChecker, CategoryRepository, Clock, CommentRepository, PostRepository,
    RoleCapabilities, SystemClock, TagRepository, UserRepository,
};
use quill_core::services::{BlogService, CommentService, PostLifecycleManager, TaxonomyService};
use quill_infra::InMemoryStore;

#[cfg(feature = "postgres")]
use quill_infra::DatabaseConfig;
#[cfg(feature = "postgres")]
use quill_infra::database::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresPostRepository,
    PostgresTagRepository, PostgresUserRepository, connect,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub lifecycle: Arc<PostLifecycleManager>,
    pub blog: Arc<BlogService>,
    pub comments: Arc<CommentService>,
    pub taxonomy: Arc<TaxonomyService>,
    pub clock: Arc<dyn Clock>,
    pub bootstrap_admin_email: Option<String>,
    /// `"postgres"` or `"memory"`, reported by the health check.
    pub storage: &'static str,
}

/// One implementation per repository port.
struct Repositories {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
    users: Arc<dyn UserRepository>,
    storage: &'static str,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            posts: store.clone(),
            comments: store.clone(),
            categories: store.clone(),
            tags: store.clone(),
            users: store,
            storage: "memory",
        }
    }

    #[cfg(feature = "postgres")]
    async fn postgres(config: &DatabaseConfig) -> Option<Self> {
        match connect(config).await {
            Ok(db) => Some(Self {
                posts: Arc::new(PostgresPostRepository::new(db.clone())),
                comments: Arc::new(PostgresCommentRepository::new(db.clone())),
                categories: Arc::new(PostgresCategoryRepository::new(db.clone())),
                tags: Arc::new(PostgresTagRepository::new(db.clone())),
                users: Arc::new(PostgresUserRepository::new(db)),
                storage: "postgres",
            }),
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                None
            }
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let repos = match &config.database {
            Some(db_config) => match Repositories::postgres(db_config).await {
                Some(repos) => repos,
                None => Repositories::in_memory(),
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                Repositories::in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let repos = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            Repositories::in_memory()
        };

        let state = Self::assemble(
            repos,
            Arc::new(SystemClock),
            config.bootstrap_admin_email.clone(),
        );
        tracing::info!(storage = state.storage, "Application state initialized");
        state
    }

    /// State backed by a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(clock: Arc<dyn Clock>, bootstrap_admin_email: Option<String>) -> Self {
        Self::assemble(Repositories::in_memory(), clock, bootstrap_admin_email)
    }

    fn assemble(
        repos: Repositories,
        clock: Arc<dyn Clock>,
        bootstrap_admin_email: Option<String>,
    ) -> Self {
        let capabilities: Arc<dyn CapabilityChecker> = Arc::new(RoleCapabilities);

        let lifecycle = Arc::new(PostLifecycleManager::new(
            repos.posts.clone(),
            repos.categories.clone(),
            repos.tags.clone(),
            capabilities.clone(),
            clock.clone(),
        ));
        let blog = Arc::new(BlogService::new(
            lifecycle.clone(),
            repos.posts.clone(),
            repos.categories.clone(),
            repos.tags.clone(),
            repos.comments.clone(),
            clock.clone(),
        ));
        let comments = Arc::new(CommentService::new(
            lifecycle.clone(),
            repos.comments,
            capabilities.clone(),
            clock.clone(),
        ));
        let taxonomy = Arc::new(TaxonomyService::new(
            repos.categories,
            repos.tags,
            repos.posts,
            capabilities,
            clock.clone(),
        ));

        Self {
            users: repos.users,
            lifecycle,
            blog,
            comments,
            taxonomy,
            clock,
            bootstrap_admin_email,
            storage: repos.storage,
        }
    }
}

//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::pagination::DEFAULT_PAGE_SIZE;
use quill_core::ports::{
    Cache, CategoryRepository, CommentRepository, ContactRepository, NewsletterRepository,
    PostRepository, RateLimiter, UserRepository,
};
use quill_infra::{
    InMemoryCache, InMemoryCategoryRepository, InMemoryCommentRepository,
    InMemoryContactRepository, InMemoryDb, InMemoryNewsletterRepository, InMemoryPostRepository,
    InMemoryUserRepository, KeyedRateLimiter,
};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub contacts: Arc<dyn ContactRepository>,
    pub newsletter: Arc<dyn NewsletterRepository>,
    pub cache: Arc<dyn Cache>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub page_size: u32,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        if let Some(db_config) = &config.database {
            match quill_infra::database::connect(db_config).await {
                Ok(conn) => return Self::postgres(conn, config.page_size),
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                }
            }
        } else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }

        #[cfg(not(feature = "postgres"))]
        tracing::info!("Running without postgres feature - using in-memory repositories");

        let mut state = Self::in_memory();
        state.page_size = config.page_size;
        state
    }

    /// Database-backed state.
    #[cfg(feature = "postgres")]
    fn postgres(conn: quill_infra::database::DbConn, page_size: u32) -> Self {
        use quill_infra::{
            PostgresCategoryRepository, PostgresCommentRepository, PostgresContactRepository,
            PostgresNewsletterRepository, PostgresPostRepository, PostgresUserRepository,
        };

        tracing::info!("Application state initialized (postgres)");

        Self {
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(conn.clone())),
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            contacts: Arc::new(PostgresContactRepository::new(conn.clone())),
            newsletter: Arc::new(PostgresNewsletterRepository::new(conn)),
            cache: Arc::new(InMemoryCache::new()),
            rate_limiter: Arc::new(KeyedRateLimiter::from_env()),
            page_size,
        }
    }

    /// State backed entirely by in-memory tables. Used when no database is
    /// configured and by the handler tests.
    pub fn in_memory() -> Self {
        let db = InMemoryDb::new();

        Self {
            posts: Arc::new(InMemoryPostRepository::new(db.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(db.clone())),
            categories: Arc::new(InMemoryCategoryRepository::new(db.clone())),
            users: Arc::new(InMemoryUserRepository::new(db.clone())),
            contacts: Arc::new(InMemoryContactRepository::new(db.clone())),
            newsletter: Arc::new(InMemoryNewsletterRepository::new(db)),
            cache: Arc::new(InMemoryCache::new()),
            rate_limiter: Arc::new(KeyedRateLimiter::from_env()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

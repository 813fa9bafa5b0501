//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains the PostgreSQL adapters, the in-memory adapters the
//! server falls back to when no database is configured, and auth/rate-limit
//! services.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory adapters only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor

pub mod cache;
pub mod memory;

#[cfg(feature = "postgres")]
pub mod database;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use memory::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryContactRepository, InMemoryDb,
    InMemoryNewsletterRepository, InMemoryPostRepository, InMemoryUserRepository,
};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, PostgresCategoryRepository, PostgresCommentRepository,
    PostgresContactRepository, PostgresNewsletterRepository, PostgresPostRepository,
    PostgresUserRepository,
};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{KeyedRateLimiter, RateLimitConfig};

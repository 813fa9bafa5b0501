//! PostgreSQL persistence via SeaORM.

mod connections;
pub mod entity;
mod postgres_base;
mod postgres_repo;

pub use connections::{DatabaseConfig, connect};
pub use sea_orm::DbConn;
pub use postgres_base::PostgresRepository;
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresContactRepository,
    PostgresNewsletterRepository, PostgresPostRepository, PostgresUserRepository,
};

#[cfg(test)]
mod tests;

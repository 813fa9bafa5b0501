//! HTTP handlers and route configuration.

mod auth;
mod blog;
mod health;
mod site;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, web};
use uuid::Uuid;

use quill_core::domain::Post;
use quill_shared::dto::{PostSummary, SNIPPET_LEN, snippet};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Blog routes. Fixed segments are registered before the `{id}`
            // match so `/blog/sidebar` never parses as a post id.
            .service(
                web::scope("/blog")
                    .route("", web::get().to(blog::list))
                    .route("/sidebar", web::get().to(blog::sidebar))
                    .route("/category/{name}", web::get().to(blog::by_category))
                    .route("/{id}", web::get().to(blog::detail))
                    .route("/{id}/comments", web::post().to(blog::submit_comment)),
            )
            // Lead capture
            .route("/contact", web::post().to(site::contact))
            .route("/newsletter", web::post().to(site::newsletter))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            ),
    );
}

/// Admission check for public form posts, keyed by client address.
pub(crate) async fn enforce_rate_limit(
    state: &AppState,
    scope: &str,
    req: &HttpRequest,
) -> AppResult<()> {
    let key = {
        let info = req.connection_info();
        let ip = info.realip_remote_addr().unwrap_or("unknown");
        format!("{scope}:{ip}")
    };

    let result = state
        .rate_limiter
        .check(&key)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if result.allowed {
        Ok(())
    } else {
        tracing::debug!(key, "Rate limit exceeded");
        Err(AppError::RateLimited {
            retry_after: result.reset_after,
        })
    }
}

/// Resolve a category id to its display name.
pub(crate) async fn category_name(
    state: &AppState,
    id: Option<Uuid>,
) -> AppResult<Option<String>> {
    match id {
        Some(id) => Ok(state.categories.find_by_id(id).await?.map(|c| c.name)),
        None => Ok(None),
    }
}

/// Shape a post into its listing-card view.
pub(crate) async fn summarize(state: &AppState, post: Post) -> AppResult<PostSummary> {
    let category = category_name(state, post.category_id).await?;

    Ok(PostSummary {
        id: post.id,
        title: post.title,
        snippet: snippet(&post.content, SNIPPET_LEN),
        category,
        tags: post.tags,
        counted_views: post.counted_views,
        published_at: post.published_at,
    })
}

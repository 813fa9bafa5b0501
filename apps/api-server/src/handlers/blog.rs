//! Blog handlers: listing, sidebar, detail, comment submission.

use std::time::Duration;

use actix_web::{HttpRequest, HttpResponse, cookie::Cookie, web};
use serde::Deserialize;
use uuid::Uuid;

use quill_core::domain::{Comment, Viewer};
use quill_core::error::DomainError;
use quill_core::pagination::{Page, PageRequest};
use quill_core::ports::PostFilter;
use quill_shared::ApiResponse;
use quill_shared::dto::{
    CategoryCountResponse, CommentResponse, PageResponse, PostDetail, SidebarResponse,
    SubmitCommentRequest,
};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::viewer::{VIEWER_COOKIE, ViewerToken};
use crate::state::AppState;

use super::{category_name, enforce_rate_limit, summarize};

const SIDEBAR_CACHE_KEY: &str = "sidebar";
const SIDEBAR_TTL: Duration = Duration::from_secs(60);
const SIDEBAR_LATEST: u64 = 3;
const SIDEBAR_TAGS: u64 = 20;

/// Listing query parameters. `page` deserializes as a raw string so that
/// non-numeric values fall back to page 1 instead of a 400.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

fn requested_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse().ok()).unwrap_or(1)
}

/// GET /api/blog
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let page = PageRequest::new(requested_page(query.page.as_deref()), state.page_size);
    let filter = PostFilter {
        category: query.category,
        author: query.author,
        tag: query.tag,
        search: query.q,
    };

    serve_listing(&state, &filter, page).await
}

/// GET /api/blog/category/{name}
///
/// A category with no published posts (or an unknown name) serves an empty
/// first page rather than a 404.
pub async fn by_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(requested_page(query.page.as_deref()), state.page_size);
    let filter = PostFilter::by_category(path.into_inner());

    serve_listing(&state, &filter, page).await
}

async fn serve_listing(
    state: &AppState,
    filter: &PostFilter,
    page: PageRequest,
) -> AppResult<HttpResponse> {
    let Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    } = state.posts.list_published(filter, page).await?;

    let mut summaries = Vec::with_capacity(items.len());
    for post in items {
        summaries.push(summarize(state, post).await?);
    }

    Ok(HttpResponse::Ok().json(PageResponse {
        items: summaries,
        page,
        per_page,
        total_items,
        total_pages,
    }))
}

/// GET /api/blog/sidebar
///
/// Aggregates for the site chrome: post total, latest posts, category counts
/// and the tag cloud. Memoized briefly since every page renders it.
pub async fn sidebar(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    if let Some(cached) = state.cache.get(SIDEBAR_CACHE_KEY).await {
        if let Ok(parsed) = serde_json::from_str::<SidebarResponse>(&cached) {
            return Ok(HttpResponse::Ok().json(parsed));
        }
    }

    let total_posts = state.posts.count_published().await?;

    let mut latest_posts = Vec::new();
    for post in state.posts.latest_published(SIDEBAR_LATEST).await? {
        latest_posts.push(summarize(&state, post).await?);
    }

    let categories = state
        .categories
        .list_with_counts()
        .await?
        .into_iter()
        .map(|c| CategoryCountResponse {
            name: c.name,
            posts: c.published_posts,
        })
        .collect();

    let tags = state.posts.tag_cloud(SIDEBAR_TAGS).await?;

    let response = SidebarResponse {
        total_posts,
        latest_posts,
        categories,
        tags,
    };

    match serde_json::to_string(&response) {
        Ok(serialized) => {
            if let Err(e) = state
                .cache
                .set(SIDEBAR_CACHE_KEY, &serialized, Some(SIDEBAR_TTL))
                .await
            {
                tracing::warn!("Failed to cache sidebar: {}", e);
            }
        }
        Err(e) => tracing::warn!("Failed to serialize sidebar for cache: {}", e),
    }

    Ok(HttpResponse::Ok().json(response))
}

/// GET /api/blog/{id}
///
/// Drafts and unknown ids are indistinguishable 404s. Posts marked
/// login-required turn anonymous readers away with a 401. Each distinct
/// viewer bumps the view counter at most once; the marker for anonymous
/// readers rides on the viewer cookie, set here on first contact.
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    identity: OptionalIdentity,
    viewer_token: ViewerToken,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let mut post = state
        .posts
        .find_published(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    if post.login_required && identity.0.is_none() {
        return Err(DomainError::LoginRequired.into());
    }

    let (viewer, set_cookie) = match &identity.0 {
        Some(user) => (Viewer::User(user.user_id), false),
        None => (
            Viewer::Anonymous(viewer_token.token.clone()),
            viewer_token.fresh,
        ),
    };

    if state.posts.mark_viewed(post.id, &viewer).await? {
        state.posts.increment_views(post.id).await?;
        post.counted_views += 1;
    }

    let author = state
        .users
        .find_by_id(post.author_id)
        .await?
        .map(|u| u.username)
        .unwrap_or_else(|| "unknown".to_string());
    let category = category_name(&state, post.category_id).await?;
    let comments: Vec<CommentResponse> = state
        .comments
        .approved_for_post(post.id)
        .await?
        .into_iter()
        .map(comment_response)
        .collect();
    let comment_count = state.comments.count_approved(post.id).await?;

    let detail = PostDetail {
        id: post.id,
        title: post.title,
        content: post.content,
        author,
        category,
        tags: post.tags,
        counted_views: post.counted_views,
        published_at: post.published_at,
        comments,
        comment_count,
    };

    let mut response = HttpResponse::Ok();
    if set_cookie {
        response.cookie(
            Cookie::build(VIEWER_COOKIE, viewer_token.token)
                .path("/")
                .http_only(true)
                .finish(),
        );
    }
    Ok(response.json(detail))
}

/// POST /api/blog/{id}/comments
///
/// Comments persist unapproved and stay invisible until moderation.
pub async fn submit_comment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SubmitCommentRequest>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    enforce_rate_limit(&state, "comments", &req).await?;

    let id = path.into_inner();
    let post = state
        .posts
        .find_published(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {id} not found")))?;

    let request = body.into_inner();
    request.validate().map_err(AppError::Validation)?;

    let comment = Comment::new(
        post.id,
        request.author_name.trim().to_string(),
        request.email.trim().to_string(),
        request.subject.unwrap_or_default(),
        request.message,
    );
    let saved = state.comments.save(comment).await?;

    tracing::info!(
        post_id = %post.id,
        comment_id = %saved.id,
        "Comment submitted for moderation"
    );

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        saved.id,
        "Your comment has been submitted and is awaiting moderation.",
    )))
}

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        author_name: comment.author_name,
        subject: comment.subject,
        message: comment.message,
        created_at: comment.created_at,
    }
}

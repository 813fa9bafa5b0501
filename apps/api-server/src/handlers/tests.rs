//! Handler tests over the in-memory state.

use std::sync::Arc;

use actix_web::{App, http::header, test, web};
use chrono::{Duration, Utc};
use uuid::Uuid;

use quill_core::domain::{Category, Post, User};
use quill_core::ports::{PasswordService, TokenService};
use quill_infra::{Argon2PasswordService, JwtTokenService, KeyedRateLimiter, RateLimitConfig};
use quill_shared::ApiResponse;
use quill_shared::dto::{AuthResponse, PageResponse, PostDetail, PostSummary, SidebarResponse, UserResponse};

use crate::handlers::configure_routes;
use crate::middleware::viewer::VIEWER_COOKIE;
use crate::state::AppState;

macro_rules! test_app {
    ($state:expr) => {{
        let token_service: Arc<dyn TokenService> =
            Arc::new(JwtTokenService::new(Default::default()));
        let password_service: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::Data::new(token_service))
                .app_data(web::Data::new(password_service))
                .configure(configure_routes),
        )
        .await
    }};
}

/// Save a published post whose `published_at` lies `age_secs` in the past.
async fn seed_post(state: &AppState, author: Uuid, title: &str, age_secs: i64) -> Post {
    let mut post = Post::new(author, title.to_string(), format!("{title} content body"));
    post.publish();
    post.published_at = Some(Utc::now() - Duration::seconds(age_secs));
    state.posts.save(post).await.unwrap()
}

fn comment_body(message: &str) -> serde_json::Value {
    serde_json::json!({
        "author_name": "Ada",
        "email": "ada@example.com",
        "message": message,
    })
}

#[actix_rt::test]
async fn health_reports_ok() {
    let app = test_app!(AppState::in_memory());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn listing_serves_three_per_page_newest_first() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    for i in 0..5 {
        // post-0 is the newest
        seed_post(&state, author, &format!("post-{i}"), i * 60).await;
    }
    let app = test_app!(state);

    let first: PageResponse<PostSummary> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blog").to_request(),
    )
    .await;
    assert_eq!(first.page, 1);
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.total_items, 5);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items[0].title, "post-0");

    let second: PageResponse<PostSummary> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blog?page=2").to_request(),
    )
    .await;
    assert_eq!(second.page, 2);
    assert_eq!(second.items.len(), 2);
    assert_eq!(second.items[1].title, "post-4");
}

#[actix_rt::test]
async fn invalid_page_values_serve_page_one() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    for i in 0..4 {
        seed_post(&state, author, &format!("post-{i}"), i * 60).await;
    }
    let app = test_app!(state);

    for uri in [
        "/api/blog?page=999",
        "/api/blog?page=abc",
        "/api/blog?page=0",
    ] {
        let page: PageResponse<PostSummary> =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri(uri).to_request())
                .await;
        assert_eq!(page.page, 1, "uri {uri} should fall back to page 1");
        assert_eq!(page.items.len(), 3);
    }
}

#[actix_rt::test]
async fn category_route_scopes_results() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    let rust = state
        .categories
        .save(Category::new("rust".to_string()))
        .await
        .unwrap();

    let mut inside = seed_post(&state, author, "inside", 0).await;
    inside.category_id = Some(rust.id);
    state.posts.save(inside).await.unwrap();
    seed_post(&state, author, "outside", 60).await;

    let app = test_app!(state);

    let page: PageResponse<PostSummary> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/blog/category/rust")
            .to_request(),
    )
    .await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "inside");
    assert_eq!(page.items[0].category.as_deref(), Some("rust"));

    // Unknown category serves an empty first page, not a 404.
    let empty: PageResponse<PostSummary> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/blog/category/nope")
            .to_request(),
    )
    .await;
    assert!(empty.items.is_empty());
    assert_eq!(empty.page, 1);
}

#[actix_rt::test]
async fn search_filters_content() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    let mut hit = Post::new(author, "hit".to_string(), "Exploring Borrow Checker".to_string());
    hit.publish();
    state.posts.save(hit).await.unwrap();
    seed_post(&state, author, "miss", 60).await;

    let app = test_app!(state);

    let page: PageResponse<PostSummary> = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/blog?q=borrow")
            .to_request(),
    )
    .await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "hit");
}

#[actix_rt::test]
async fn draft_and_unknown_posts_are_not_found() {
    let state = AppState::in_memory();
    let draft = state
        .posts
        .save(Post::new(Uuid::new_v4(), "draft".into(), "hidden".into()))
        .await
        .unwrap();
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/blog/{}", draft.id))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/blog/{}", Uuid::new_v4()))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn gated_post_requires_login() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    let mut post = Post::new(author, "members only".into(), "secret body".into());
    post.publish();
    post.login_required = true;
    let post = state.posts.save(post).await.unwrap();

    let app = test_app!(state);
    let uri = format!("/api/blog/{}", post.id);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({
                "username": "reader",
                "email": "reader@example.com",
                "password": "password123",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let auth: AuthResponse = test::read_body_json(resp).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header((
                header::AUTHORIZATION,
                format!("Bearer {}", auth.access_token),
            ))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn views_count_once_per_viewer() {
    let state = AppState::in_memory();
    let author = state
        .users
        .save(User::new(
            "ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        ))
        .await
        .unwrap();
    let post = seed_post(&state, author.id, "counted", 0).await;

    let app = test_app!(state);
    let uri = format!("/api/blog/{}", post.id);

    // First anonymous visit counts and hands back the viewer cookie.
    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), 200);
    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == VIEWER_COOKIE)
        .map(|c| c.into_owned())
        .expect("first visit sets the viewer cookie");
    let detail: PostDetail = test::read_body_json(resp).await;
    assert_eq!(detail.counted_views, 1);
    assert_eq!(detail.author, "ada");

    // Replaying with the cookie does not count again.
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert!(
        resp.response()
            .cookies()
            .all(|c| c.name() != VIEWER_COOKIE),
        "a returning viewer keeps their cookie"
    );
    let detail: PostDetail = test::read_body_json(resp).await;
    assert_eq!(detail.counted_views, 1);

    // A different viewer (no cookie) counts once more.
    let detail: PostDetail = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(&uri).to_request(),
    )
    .await;
    assert_eq!(detail.counted_views, 2);
}

#[actix_rt::test]
async fn authenticated_views_count_once_per_user() {
    let state = AppState::in_memory();
    let post = seed_post(&state, Uuid::new_v4(), "tracked", 0).await;
    let app = test_app!(state);
    let uri = format!("/api/blog/{}", post.id);

    let mut tokens = Vec::new();
    for name in ["one", "two"] {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(serde_json::json!({
                    "username": format!("reader-{name}"),
                    "email": format!("{name}@example.com"),
                    "password": "password123",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 201);
        let auth: AuthResponse = test::read_body_json(resp).await;
        tokens.push(auth.access_token);
    }

    // Two fetches by the same user count once.
    for _ in 0..2 {
        let detail: PostDetail = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&uri)
                .insert_header((header::AUTHORIZATION, format!("Bearer {}", tokens[0])))
                .to_request(),
        )
        .await;
        assert_eq!(detail.counted_views, 1);
    }

    // A distinct user counts again.
    let detail: PostDetail = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&uri)
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", tokens[1])))
            .to_request(),
    )
    .await;
    assert_eq!(detail.counted_views, 2);
}

#[actix_rt::test]
async fn comments_are_moderated() {
    let state = AppState::in_memory();
    let post = seed_post(&state, Uuid::new_v4(), "commented", 0).await;
    let app = test_app!(state.clone());
    let uri = format!("/api/blog/{}", post.id);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("{uri}/comments"))
            .set_json(comment_body("Great read."))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: ApiResponse<Uuid> = test::read_body_json(resp).await;
    let comment_id = body.data.unwrap();

    // Unapproved comments are invisible on the detail page.
    let detail: PostDetail =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert!(detail.comments.is_empty());
    assert_eq!(detail.comment_count, 0);

    // Moderation flips the flag; the comment appears.
    let mut comment = state.comments.find_by_id(comment_id).await.unwrap().unwrap();
    comment.approved = true;
    state.comments.save(comment).await.unwrap();

    let detail: PostDetail =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].message, "Great read.");
    assert_eq!(detail.comment_count, 1);
}

#[actix_rt::test]
async fn comment_validation_failures_are_reported() {
    let state = AppState::in_memory();
    let post = seed_post(&state, Uuid::new_v4(), "strict", 0).await;
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/blog/{}/comments", post.id))
            .set_json(comment_body(""))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 422);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/blog/{}/comments", Uuid::new_v4()))
            .set_json(comment_body("orphan"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn contact_defaults_missing_name_to_anonymous() {
    let state = AppState::in_memory();
    let app = test_app!(state.clone());

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/contact")
            .set_json(serde_json::json!({
                "email": "someone@example.com",
                "message": "Hello there",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);
    let body: ApiResponse<Uuid> = test::read_body_json(resp).await;

    let saved = state
        .contacts
        .find_by_id(body.data.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.name, "Anonymous");

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/contact")
            .set_json(serde_json::json!({
                "email": "not-an-email",
                "message": "Hello there",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 422);
}

#[actix_rt::test]
async fn newsletter_signup_is_idempotent() {
    let app = test_app!(AppState::in_memory());
    let body = serde_json::json!({"email": "fan@example.com"});

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(&body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    // Repeat signup is a quiet no-op.
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(&body)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}

#[actix_rt::test]
async fn register_login_me_flow() {
    let app = test_app!(AppState::in_memory());
    let register = serde_json::json!({
        "username": "grace",
        "email": "grace@example.com",
        "password": "password123",
    });

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&register)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 201);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&register)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 409);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({
                "email": "grace@example.com",
                "password": "wrong-password",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({
                "email": "grace@example.com",
                "password": "password123",
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    let auth: AuthResponse = test::read_body_json(resp).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/api/auth/me").to_request()).await;
    assert_eq!(resp.status(), 401);

    let me: UserResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((
                header::AUTHORIZATION,
                format!("Bearer {}", auth.access_token),
            ))
            .to_request(),
    )
    .await;
    assert_eq!(me.username, "grace");
    assert_eq!(me.email, "grace@example.com");
}

#[actix_rt::test]
async fn sidebar_aggregates_and_caches() {
    let state = AppState::in_memory();
    let author = Uuid::new_v4();
    state
        .categories
        .save(Category::new("rust".to_string()))
        .await
        .unwrap();
    let mut post = seed_post(&state, author, "sidebar seed", 0).await;
    post.tags = vec!["async".to_string(), "web".to_string()];
    state.posts.save(post).await.unwrap();

    let app = test_app!(state.clone());

    let sidebar: SidebarResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blog/sidebar").to_request(),
    )
    .await;
    assert_eq!(sidebar.total_posts, 1);
    assert_eq!(sidebar.latest_posts.len(), 1);
    assert_eq!(sidebar.categories.len(), 1);
    assert_eq!(sidebar.tags, vec!["async".to_string(), "web".to_string()]);

    // Within the TTL the memoized copy is served.
    seed_post(&state, author, "after cache", 0).await;
    let cached: SidebarResponse = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/blog/sidebar").to_request(),
    )
    .await;
    assert_eq!(cached.total_posts, 1);
}

#[actix_rt::test]
async fn repeated_submissions_are_rate_limited() {
    let state = AppState {
        rate_limiter: Arc::new(KeyedRateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: std::time::Duration::from_secs(60),
        })),
        ..AppState::in_memory()
    };
    let app = test_app!(state);

    for i in 0..2 {
        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/newsletter")
                .set_json(serde_json::json!({"email": format!("fan{i}@example.com")}))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), 201);
    }

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(serde_json::json!({"email": "fan3@example.com"}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 429);
    assert!(resp.headers().contains_key(header::RETRY_AFTER));
}

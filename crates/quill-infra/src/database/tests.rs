use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use quill_core::domain::Viewer;
use quill_core::pagination::PageRequest;
use quill_core::ports::{CommentRepository, PostFilter, PostRepository};

use crate::database::entity::{comment, post, post_tag};
use crate::database::postgres_repo::{PostgresCommentRepository, PostgresPostRepository};

fn post_model(id: Uuid, status: &str) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        author_id: Uuid::new_v4(),
        category_id: None,
        title: "Test Post".to_owned(),
        content: "Content".to_owned(),
        status: status.to_owned(),
        login_required: false,
        counted_views: 4,
        published_at: Some(now.into()),
        created_at: now.into(),
        updated_at: now.into(),
    }
}

#[tokio::test]
async fn find_published_folds_in_tags() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, "published")]])
        .append_query_results(vec![vec![
            post_tag::Model {
                id: Uuid::new_v4(),
                post_id,
                tag: "rust".to_owned(),
            },
            post_tag::Model {
                id: Uuid::new_v4(),
                post_id,
                tag: "web".to_owned(),
            },
        ]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo.find_published(post_id).await.unwrap().unwrap();
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.counted_views, 4);
    assert_eq!(post.tags, vec!["rust".to_owned(), "web".to_owned()]);
}

#[tokio::test]
async fn find_published_misses_on_absent_row() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let post = repo.find_published(Uuid::new_v4()).await.unwrap();
    assert!(post.is_none());
}

#[tokio::test]
async fn list_published_with_search_pages_results() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![BTreeMap::from([(
            "num_items",
            Value::BigInt(Some(1)),
        )])]])
        .append_query_results(vec![vec![post_model(post_id, "published")]])
        .append_query_results(vec![Vec::<post_tag::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let filter = PostFilter {
        search: Some("content".to_owned()),
        ..PostFilter::default()
    };

    let page = repo
        .list_published(&filter, PageRequest::first())
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, post_id);
}

#[tokio::test]
async fn mark_viewed_reports_marker_freshness() {
    // First insert lands a row; the second hits the unique index and
    // DO NOTHING reports zero affected rows.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            },
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let post_id = Uuid::new_v4();
    let viewer = Viewer::Anonymous("token".to_owned());

    assert!(repo.mark_viewed(post_id, &viewer).await.unwrap());
    assert!(!repo.mark_viewed(post_id, &viewer).await.unwrap());
}

#[tokio::test]
async fn approved_for_post_maps_rows() {
    let post_id = Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![comment::Model {
            id: Uuid::new_v4(),
            post_id,
            author_name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            subject: "Hi".to_owned(),
            message: "Nice post.".to_owned(),
            approved: true,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let comments = repo.approved_for_post(post_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].author_name, "Ada");
    assert!(comments[0].approved);
}

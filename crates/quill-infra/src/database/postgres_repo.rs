//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, OnConflict, Query, SelectStatement};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryCount, Comment, NewsletterSignup, Post, PostStatus, User, Viewer,
};
use quill_core::error::RepoError;
use quill_core::pagination::{Page, PageRequest};
use quill_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, ContactRepository,
    NewsletterRepository, PostFilter, PostRepository, UserRepository,
};

use super::entity::{category, comment, contact, newsletter, post, post_tag, post_view, user};
use super::postgres_base::{PostgresRepository, map_save_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresRepository<user::ActiveModel>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresRepository<category::ActiveModel>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresRepository<comment::ActiveModel>;

/// PostgreSQL contact-message repository.
pub type PostgresContactRepository = PostgresRepository<contact::ActiveModel>;

/// PostgreSQL newsletter repository.
pub type PostgresNewsletterRepository = PostgresRepository<newsletter::ActiveModel>;

fn query_err(e: DbErr) -> RepoError {
    RepoError::Query(e.to_string())
}

/// Escape LIKE wildcards in user-supplied search input.
fn like_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let result = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn approved_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let result = comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Approved.eq(true))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn count_approved(&self, post_id: Uuid) -> Result<u64, RepoError> {
        comment::Entity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::Approved.eq(true))
            .count(&self.db)
            .await
            .map_err(query_err)
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        // Count published posts per category in one grouped query so
        // zero-post categories still show up.
        let counts: Vec<(Option<Uuid>, i64)> = post::Entity::find()
            .select_only()
            .column(post::Column::CategoryId)
            .column_as(post::Column::Id.count(), "posts")
            .filter(post::Column::Status.eq(PostStatus::Published.as_str()))
            .group_by(post::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let by_category: HashMap<Uuid, i64> = counts
            .into_iter()
            .filter_map(|(id, n)| id.map(|id| (id, n)))
            .collect();

        Ok(categories
            .into_iter()
            .map(|c| CategoryCount {
                published_posts: by_category.get(&c.id).copied().unwrap_or(0) as u64,
                name: c.name,
            })
            .collect())
    }
}

#[async_trait]
impl NewsletterRepository for PostgresNewsletterRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterSignup>, RepoError> {
        let result = newsletter::Entity::find()
            .filter(newsletter::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl ContactRepository for PostgresContactRepository {}

/// PostgreSQL post repository. Not an alias of the generic base: posts carry
/// tag rows that have to be folded in and replaced alongside the post row.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Base select for publicly visible posts under `filter`.
    fn published_select(filter: &PostFilter) -> Select<post::Entity> {
        let mut query = post::Entity::find()
            .filter(post::Column::Status.eq(PostStatus::Published.as_str()));

        if let Some(name) = &filter.category {
            query = query.filter(post::Column::CategoryId.in_subquery(
                Query::select()
                    .column(category::Column::Id)
                    .from(category::Entity)
                    .and_where(category::Column::Name.eq(name.clone()))
                    .to_owned(),
            ));
        }

        if let Some(username) = &filter.author {
            query = query.filter(post::Column::AuthorId.in_subquery(
                Query::select()
                    .column(user::Column::Id)
                    .from(user::Entity)
                    .and_where(user::Column::Username.eq(username.clone()))
                    .to_owned(),
            ));
        }

        if let Some(tag) = &filter.tag {
            query = query.filter(post::Column::Id.in_subquery(
                Query::select()
                    .column(post_tag::Column::PostId)
                    .from(post_tag::Entity)
                    .and_where(post_tag::Column::Tag.eq(tag.clone()))
                    .to_owned(),
            ));
        }

        if let Some(q) = &filter.search {
            query = query.filter(
                Expr::col(post::Column::Content).ilike(format!("%{}%", like_escape(q))),
            );
        }

        query
            .order_by_desc(post::Column::PublishedAt)
            .order_by_desc(post::Column::Id)
    }

    fn published_ids_select() -> SelectStatement {
        Query::select()
            .column(post::Column::Id)
            .from(post::Entity)
            .and_where(post::Column::Status.eq(PostStatus::Published.as_str()))
            .to_owned()
    }

    /// Fold tag rows into domain posts, one query for the whole batch.
    async fn attach_tags(&self, models: Vec<post::Model>) -> Result<Vec<Post>, RepoError> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let rows = post_tag::Entity::find()
            .filter(post_tag::Column::PostId.is_in(ids))
            .all(&self.db)
            .await
            .map_err(query_err)?;

        let mut tags_by_post: HashMap<Uuid, Vec<String>> = HashMap::new();
        for row in rows {
            tags_by_post.entry(row.post_id).or_default().push(row.tag);
        }

        Ok(models
            .into_iter()
            .map(|m| {
                let tags = tags_by_post.remove(&m.id).unwrap_or_default();
                m.into_domain(tags)
            })
            .collect())
    }

    async fn one_with_tags(&self, model: Option<post::Model>) -> Result<Option<Post>, RepoError> {
        match model {
            Some(model) => Ok(self.attach_tags(vec![model]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl BaseRepository<Post> for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = post::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_err)?;

        self.one_with_tags(model).await
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let id = entity.id;
        let tags = entity.tags.clone();

        let active_model: post::ActiveModel = entity.into();
        let model = match active_model.clone().update(&self.db).await {
            Ok(model) => model,
            Err(DbErr::RecordNotUpdated) => {
                active_model.insert(&self.db).await.map_err(map_save_err)?
            }
            Err(e) => return Err(RepoError::Query(e.to_string())),
        };

        // Replace the tag rows wholesale; the set is tiny.
        post_tag::Entity::delete_many()
            .filter(post_tag::Column::PostId.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if !tags.is_empty() {
            let rows = tags.iter().map(|tag| post_tag::ActiveModel {
                id: Set(Uuid::new_v4()),
                post_id: Set(id),
                tag: Set(tag.clone()),
            });
            post_tag::Entity::insert_many(rows)
                .exec_without_returning(&self.db)
                .await
                .map_err(query_err)?;
        }

        Ok(model.into_domain(tags))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = post::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let model = post::Entity::find_by_id(id)
            .filter(post::Column::Status.eq(PostStatus::Published.as_str()))
            .one(&self.db)
            .await
            .map_err(query_err)?;

        self.one_with_tags(model).await
    }

    async fn list_published(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let paginator =
            Self::published_select(filter).paginate(&self.db, u64::from(page.per_page));

        let total_items = paginator.num_items().await.map_err(query_err)?;
        let served = page.clamp(total_items);

        let models = paginator
            .fetch_page(u64::from(served - 1))
            .await
            .map_err(query_err)?;

        tracing::debug!(
            total_items,
            requested = page.page,
            served,
            "Listing published posts"
        );

        let posts = self.attach_tags(models).await?;
        Ok(Page::new(posts, page, total_items))
    }

    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let models = Self::published_select(&PostFilter::default())
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_err)?;

        self.attach_tags(models).await
    }

    async fn count_published(&self) -> Result<u64, RepoError> {
        post::Entity::find()
            .filter(post::Column::Status.eq(PostStatus::Published.as_str()))
            .count(&self.db)
            .await
            .map_err(query_err)
    }

    async fn tag_cloud(&self, limit: u64) -> Result<Vec<String>, RepoError> {
        post_tag::Entity::find()
            .select_only()
            .column(post_tag::Column::Tag)
            .distinct()
            .filter(post_tag::Column::PostId.in_subquery(Self::published_ids_select()))
            .limit(limit)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(query_err)
    }

    async fn mark_viewed(&self, post_id: Uuid, viewer: &Viewer) -> Result<bool, RepoError> {
        let marker = post_view::ActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post_id),
            viewer_key: Set(viewer.key()),
            viewed_at: Set(Utc::now().into()),
        };

        // Single atomic statement: the unique index on (post_id, viewer_key)
        // decides whether this viewer has been counted, even under
        // concurrent requests from the same viewer.
        let inserted = post_view::Entity::insert(marker)
            .on_conflict(
                OnConflict::columns([post_view::Column::PostId, post_view::Column::ViewerKey])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .map_err(query_err)?;

        Ok(inserted > 0)
    }

    async fn increment_views(&self, post_id: Uuid) -> Result<(), RepoError> {
        post::Entity::update_many()
            .col_expr(
                post::Column::CountedViews,
                Expr::col(post::Column::CountedViews).add(1i64),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(query_err)?;

        Ok(())
    }
}

//! In-memory repository implementations.
//!
//! These back the server when `DATABASE_URL` is not configured and give the
//! handler tests real repository semantics without a database. Tables are
//! `RwLock`-guarded maps shared through one [`InMemoryDb`]; the view-marker
//! set plays the role of the unique index, so `mark_viewed` stays a single
//! atomic check-and-insert under the write lock. Data is lost on restart.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryCount, Comment, ContactMessage, NewsletterSignup, Post, User, Viewer,
};
use quill_core::error::RepoError;
use quill_core::pagination::{Page, PageRequest};
use quill_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, ContactRepository,
    NewsletterRepository, PostFilter, PostRepository, UserRepository,
};

/// Shared in-memory tables.
#[derive(Default)]
pub struct InMemoryDb {
    users: RwLock<HashMap<Uuid, User>>,
    categories: RwLock<HashMap<Uuid, Category>>,
    posts: RwLock<HashMap<Uuid, Post>>,
    post_views: RwLock<HashSet<(Uuid, String)>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
    contacts: RwLock<HashMap<Uuid, ContactMessage>>,
    newsletter: RwLock<HashMap<Uuid, NewsletterSignup>>,
}

impl InMemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

macro_rules! base_repository {
    ($repo:ident, $entity:ty, $table:ident) => {
        pub struct $repo {
            db: Arc<InMemoryDb>,
        }

        impl $repo {
            pub fn new(db: Arc<InMemoryDb>) -> Self {
                Self { db }
            }
        }

        #[async_trait]
        impl BaseRepository<$entity> for $repo {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$entity>, RepoError> {
                Ok(self.db.$table.read().await.get(&id).cloned())
            }

            async fn save(&self, entity: $entity) -> Result<$entity, RepoError> {
                self.db
                    .$table
                    .write()
                    .await
                    .insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                match self.db.$table.write().await.remove(&id) {
                    Some(_) => Ok(()),
                    None => Err(RepoError::NotFound),
                }
            }
        }
    };
}

base_repository!(InMemoryUserRepository, User, users);
base_repository!(InMemoryCategoryRepository, Category, categories);
base_repository!(InMemoryCommentRepository, Comment, comments);
base_repository!(InMemoryContactRepository, ContactMessage, contacts);
base_repository!(InMemoryNewsletterRepository, NewsletterSignup, newsletter);

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.db.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.db.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn approved_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let comments = self.db.comments.read().await;
        let mut approved: Vec<Comment> = comments
            .values()
            .filter(|c| c.post_id == post_id && c.approved)
            .cloned()
            .collect();
        approved.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(approved)
    }

    async fn count_approved(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let comments = self.db.comments.read().await;
        Ok(comments
            .values()
            .filter(|c| c.post_id == post_id && c.approved)
            .count() as u64)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, RepoError> {
        let categories = self.db.categories.read().await;
        Ok(categories.values().find(|c| c.name == name).cloned())
    }

    async fn list_with_counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let categories = self.db.categories.read().await;
        let posts = self.db.posts.read().await;

        let mut counts: Vec<CategoryCount> = categories
            .values()
            .map(|c| CategoryCount {
                name: c.name.clone(),
                published_posts: posts
                    .values()
                    .filter(|p| p.is_published() && p.category_id == Some(c.id))
                    .count() as u64,
            })
            .collect();
        counts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(counts)
    }
}

#[async_trait]
impl ContactRepository for InMemoryContactRepository {}

#[async_trait]
impl NewsletterRepository for InMemoryNewsletterRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterSignup>, RepoError> {
        let signups = self.db.newsletter.read().await;
        Ok(signups.values().find(|s| s.email == email).cloned())
    }
}

pub struct InMemoryPostRepository {
    db: Arc<InMemoryDb>,
}

impl InMemoryPostRepository {
    pub fn new(db: Arc<InMemoryDb>) -> Self {
        Self { db }
    }

    async fn published_matching(&self, filter: &PostFilter) -> Vec<Post> {
        let categories = self.db.categories.read().await;
        let users = self.db.users.read().await;
        let posts = self.db.posts.read().await;

        let mut matching: Vec<Post> = posts.values().filter(|p| p.is_published()).cloned().collect();

        if let Some(name) = &filter.category {
            let category_id = categories.values().find(|c| &c.name == name).map(|c| c.id);
            matching.retain(|p| p.category_id.is_some() && p.category_id == category_id);
        }

        if let Some(username) = &filter.author {
            let author_id = users.values().find(|u| &u.username == username).map(|u| u.id);
            matching.retain(|p| Some(p.author_id) == author_id);
        }

        if let Some(tag) = &filter.tag {
            matching.retain(|p| p.tags.iter().any(|t| t == tag));
        }

        if let Some(q) = &filter.search {
            let q = q.to_lowercase();
            matching.retain(|p| p.content.to_lowercase().contains(&q));
        }

        // published_at DESC, id DESC as the same-timestamp tie-break
        matching.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        matching
    }
}

#[async_trait]
impl BaseRepository<Post> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.db.posts.read().await.get(&id).cloned())
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        self.db
            .posts
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.db.posts.write().await.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        // Mirror the database's cascade deletes.
        self.db.comments.write().await.retain(|_, c| c.post_id != id);
        self.db.post_views.write().await.retain(|(pid, _)| *pid != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let posts = self.db.posts.read().await;
        Ok(posts.get(&id).filter(|p| p.is_published()).cloned())
    }

    async fn list_published(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let matching = self.published_matching(filter).await;
        let total_items = matching.len() as u64;

        let items = matching
            .into_iter()
            .skip(page.offset(total_items) as usize)
            .take(page.per_page as usize)
            .collect();

        Ok(Page::new(items, page, total_items))
    }

    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let mut matching = self.published_matching(&PostFilter::default()).await;
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn count_published(&self) -> Result<u64, RepoError> {
        let posts = self.db.posts.read().await;
        Ok(posts.values().filter(|p| p.is_published()).count() as u64)
    }

    async fn tag_cloud(&self, limit: u64) -> Result<Vec<String>, RepoError> {
        let posts = self.db.posts.read().await;
        let tags: BTreeSet<String> = posts
            .values()
            .filter(|p| p.is_published())
            .flat_map(|p| p.tags.iter().cloned())
            .collect();
        Ok(tags.into_iter().take(limit as usize).collect())
    }

    async fn mark_viewed(&self, post_id: Uuid, viewer: &Viewer) -> Result<bool, RepoError> {
        // Check-and-insert under one write lock; `insert` reports freshness.
        let mut views = self.db.post_views.write().await;
        Ok(views.insert((post_id, viewer.key())))
    }

    async fn increment_views(&self, post_id: Uuid) -> Result<(), RepoError> {
        let mut posts = self.db.posts.write().await;
        if let Some(post) = posts.get_mut(&post_id) {
            post.counted_views += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn published_post(author_id: Uuid, title: &str) -> Post {
        let mut post = Post::new(author_id, title.to_string(), format!("{title} body"));
        post.publish();
        post
    }

    fn repo() -> (Arc<InMemoryDb>, InMemoryPostRepository) {
        let db = InMemoryDb::new();
        (db.clone(), InMemoryPostRepository::new(db))
    }

    #[tokio::test]
    async fn mark_viewed_is_at_most_once_per_viewer() {
        let (_, repo) = repo();
        let post = published_post(Uuid::new_v4(), "counted");
        let post = repo.save(post).await.unwrap();

        let user = Viewer::User(Uuid::new_v4());
        let anon = Viewer::Anonymous("tok-1".to_string());

        assert!(repo.mark_viewed(post.id, &user).await.unwrap());
        assert!(!repo.mark_viewed(post.id, &user).await.unwrap());
        assert!(repo.mark_viewed(post.id, &anon).await.unwrap());
        assert!(!repo.mark_viewed(post.id, &anon).await.unwrap());
    }

    #[tokio::test]
    async fn increment_views_accumulates() {
        let (_, repo) = repo();
        let post = repo
            .save(published_post(Uuid::new_v4(), "views"))
            .await
            .unwrap();

        repo.increment_views(post.id).await.unwrap();
        repo.increment_views(post.id).await.unwrap();

        let found = repo.find_published(post.id).await.unwrap().unwrap();
        assert_eq!(found.counted_views, 2);
    }

    #[tokio::test]
    async fn drafts_are_invisible() {
        let (_, repo) = repo();
        let draft = Post::new(Uuid::new_v4(), "draft".into(), "hidden".into());
        let draft = repo.save(draft).await.unwrap();

        assert!(repo.find_published(draft.id).await.unwrap().is_none());
        assert_eq!(repo.count_published().await.unwrap(), 0);

        let page = repo
            .list_published(&PostFilter::default(), PageRequest::first())
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn listing_orders_newest_first_and_pages() {
        let (_, repo) = repo();
        let author = Uuid::new_v4();
        let base = Utc::now();
        for i in 0..5 {
            let mut post = published_post(author, &format!("post-{i}"));
            post.published_at = Some(base + Duration::seconds(i));
            repo.save(post).await.unwrap();
        }

        let first = repo
            .list_published(&PostFilter::default(), PageRequest::new(1, 3))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.total_items, 5);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.items[0].title, "post-4");

        let second = repo
            .list_published(&PostFilter::default(), PageRequest::new(2, 3))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
    }

    #[tokio::test]
    async fn out_of_range_page_serves_page_one() {
        let (_, repo) = repo();
        repo.save(published_post(Uuid::new_v4(), "only"))
            .await
            .unwrap();

        let page = repo
            .list_published(&PostFilter::default(), PageRequest::new(999, 3))
            .await
            .unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn filters_are_conjunctive_and_can_match_nothing() {
        let db = InMemoryDb::new();
        let posts = InMemoryPostRepository::new(db.clone());
        let categories = InMemoryCategoryRepository::new(db);

        let rust_cat = categories.save(Category::new("rust".into())).await.unwrap();

        let mut tagged = published_post(Uuid::new_v4(), "tagged");
        tagged.category_id = Some(rust_cat.id);
        tagged.tags = vec!["async".into()];
        posts.save(tagged).await.unwrap();

        let hit = posts
            .list_published(&PostFilter::by_category("rust"), PageRequest::first())
            .await
            .unwrap();
        assert_eq!(hit.items.len(), 1);

        let miss = posts
            .list_published(
                &PostFilter {
                    category: Some("rust".into()),
                    tag: Some("gpu".into()),
                    ..PostFilter::default()
                },
                PageRequest::first(),
            )
            .await
            .unwrap();
        assert!(miss.items.is_empty());
        assert_eq!(miss.page, 1);

        let unknown_category = posts
            .list_published(&PostFilter::by_category("nope"), PageRequest::first())
            .await
            .unwrap();
        assert!(unknown_category.items.is_empty());
    }

    #[tokio::test]
    async fn unapproved_comments_stay_hidden_until_flipped() {
        let db = InMemoryDb::new();
        let comments = InMemoryCommentRepository::new(db);
        let post_id = Uuid::new_v4();

        let comment = Comment::new(
            post_id,
            "Ada".into(),
            "ada@example.com".into(),
            "Hi".into(),
            "Nice post.".into(),
        );
        let mut comment = comments.save(comment).await.unwrap();

        assert!(comments.approved_for_post(post_id).await.unwrap().is_empty());
        assert_eq!(comments.count_approved(post_id).await.unwrap(), 0);

        comment.approved = true;
        comments.save(comment).await.unwrap();

        assert_eq!(comments.approved_for_post(post_id).await.unwrap().len(), 1);
        assert_eq!(comments.count_approved(post_id).await.unwrap(), 1);
    }
}

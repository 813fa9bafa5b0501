use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Category, CategoryCount, Comment, ContactMessage, NewsletterSignup, Post, User, Viewer,
};
use crate::error::RepoError;
use crate::pagination::{Page, PageRequest};

/// Generic repository trait defining standard CRUD operations.
/// All Quill entities key on a v4 UUID.
#[async_trait]
pub trait BaseRepository<T>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

/// Listing filters; all supplied filters apply conjunctively.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Category name.
    pub category: Option<String>,
    /// Author username.
    pub author: Option<String>,
    /// Tag name.
    pub tag: Option<String>,
    /// Case-insensitive substring match on content.
    pub search: Option<String>,
}

impl PostFilter {
    pub fn by_category(name: impl Into<String>) -> Self {
        Self {
            category: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Post repository with the public read surface and the view-marker write.
#[async_trait]
pub trait PostRepository: BaseRepository<Post> {
    /// Find a post by id, only if it is published.
    async fn find_published(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    /// Published posts matching `filter`, ordered by `published_at` DESC then
    /// id DESC, sliced per `page` (out-of-range pages serve page 1).
    async fn list_published(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// Most recently published posts.
    async fn latest_published(&self, limit: u64) -> Result<Vec<Post>, RepoError>;

    /// Total number of published posts.
    async fn count_published(&self) -> Result<u64, RepoError>;

    /// Distinct tags carried by published posts.
    async fn tag_cloud(&self, limit: u64) -> Result<Vec<String>, RepoError>;

    /// Record that `viewer` has seen `post_id`. Returns true exactly when
    /// the (post, viewer) marker did not exist before. Implementations must
    /// make this a single atomic insert against the uniqueness constraint,
    /// never a read followed by a write.
    async fn mark_viewed(&self, post_id: Uuid, viewer: &Viewer) -> Result<bool, RepoError>;

    /// Bump `counted_views` by one. Called only when `mark_viewed` reported
    /// a fresh marker; must be an expression update, not read-modify-write.
    async fn increment_views(&self, post_id: Uuid) -> Result<(), RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment> {
    /// Approved comments for a post, oldest first.
    async fn approved_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;

    /// Number of approved comments on a post.
    async fn count_approved(&self, post_id: Uuid) -> Result<u64, RepoError>;
}

/// Category repository.
#[async_trait]
pub trait CategoryRepository: BaseRepository<Category> {
    async fn find_by_name(&self, name: &str) -> Result<Option<Category>, RepoError>;

    /// Every category with its published-post count.
    async fn list_with_counts(&self) -> Result<Vec<CategoryCount>, RepoError>;
}

/// User repository.
#[async_trait]
pub trait UserRepository: BaseRepository<User> {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

/// Contact-message repository; capture only.
#[async_trait]
pub trait ContactRepository: BaseRepository<ContactMessage> {}

/// Newsletter-signup repository.
#[async_trait]
pub trait NewsletterRepository: BaseRepository<NewsletterSignup> {
    /// Lookup for duplicate signups.
    async fn find_by_email(&self, email: &str) -> Result<Option<NewsletterSignup>, RepoError>;
}

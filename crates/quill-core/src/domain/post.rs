use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Publication status of a post. Drafts are invisible to every public
/// operation; only the transition to `Published` stamps `published_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PostStatus::Draft),
            "published" => Some(PostStatus::Published),
            _ => None,
        }
    }
}

/// Post entity - a blog article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    /// When set, the detail page requires an authenticated viewer.
    pub login_required: bool,
    /// Monotonically non-decreasing; bumped at most once per distinct viewer.
    pub counted_views: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new draft post.
    pub fn new(author_id: Uuid, title: String, content: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            title,
            content,
            tags: Vec::new(),
            status: PostStatus::Draft,
            login_required: false,
            counted_views: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the post publicly visible, stamping `published_at` on the first
    /// transition only.
    pub fn publish(&mut self) {
        self.status = PostStatus::Published;
        if self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
        self.updated_at = Utc::now();
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// The unit of "one view counted": an authenticated user id or an anonymous
/// session token. Both kinds share one marker table keyed by `key()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    User(Uuid),
    Anonymous(String),
}

impl Viewer {
    /// Canonical marker key, unique per viewer identity.
    pub fn key(&self) -> String {
        match self {
            Viewer::User(id) => format!("user:{id}"),
            Viewer::Anonymous(token) => format!("anon:{token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_stamps_published_at_once() {
        let mut post = Post::new(Uuid::new_v4(), "title".into(), "body".into());
        assert!(!post.is_published());
        assert!(post.published_at.is_none());

        post.publish();
        let first = post.published_at;
        assert!(post.is_published());
        assert!(first.is_some());

        post.publish();
        assert_eq!(post.published_at, first);
    }

    #[test]
    fn viewer_keys_are_disjoint_by_kind() {
        let id = Uuid::new_v4();
        let user = Viewer::User(id);
        let anon = Viewer::Anonymous(id.to_string());
        assert_ne!(user.key(), anon.key());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Comment entity - a public submission attached to a post.
///
/// Comments persist with `approved = false` and stay invisible until
/// moderation flips the flag; nothing else about them is ever updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new, unapproved comment.
    pub fn new(
        post_id: Uuid,
        author_name: String,
        email: String,
        subject: String,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            author_name,
            email,
            subject,
            message,
            approved: false,
            created_at: Utc::now(),
        }
    }
}

//! Data Transfer Objects - request/response types for the API.
//!
//! Request types validate themselves; a failed validation returns the full
//! list of field errors so the client can re-render every problem at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Characters of content shown on listing cards before the ellipsis.
pub const SNIPPET_LEN: usize = 160;

const MAX_NAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;
const MAX_SUBJECT_LEN: usize = 255;
const MAX_MESSAGE_LEN: usize = 5000;

fn email_shape_ok(email: &str) -> bool {
    let trimmed = email.trim();
    !trimmed.is_empty()
        && trimmed.len() <= MAX_EMAIL_LEN
        && trimmed.contains('@')
        && !trimmed.starts_with('@')
        && !trimmed.ends_with('@')
}

/// Shorten content for a listing card.
pub fn snippet(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Public comment submission on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitCommentRequest {
    pub author_name: String,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl SubmitCommentRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.author_name.trim().is_empty() {
            errors.push("name is required".to_string());
        } else if self.author_name.trim().len() > MAX_NAME_LEN {
            errors.push("name is too long".to_string());
        }

        if !email_shape_ok(&self.email) {
            errors.push("a valid email is required".to_string());
        }

        if let Some(subject) = &self.subject {
            if subject.len() > MAX_SUBJECT_LEN {
                errors.push("subject is too long".to_string());
            }
        }

        if self.message.trim().is_empty() {
            errors.push("message is required".to_string());
        } else if self.message.len() > MAX_MESSAGE_LEN {
            errors.push("message is too long".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Contact form submission. A missing or blank name is captured as
/// "Anonymous" rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if let Some(name) = &self.name {
            if name.trim().len() > MAX_NAME_LEN {
                errors.push("name is too long".to_string());
            }
        }

        if !email_shape_ok(&self.email) {
            errors.push("a valid email is required".to_string());
        }

        if let Some(subject) = &self.subject {
            if subject.len() > MAX_SUBJECT_LEN {
                errors.push("subject is too long".to_string());
            }
        }

        if self.message.trim().is_empty() {
            errors.push("message is required".to_string());
        } else if self.message.len() > MAX_MESSAGE_LEN {
            errors.push("message is too long".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// The name stored with the message.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => "Anonymous".to_string(),
        }
    }
}

/// Newsletter signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

impl NewsletterRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        if email_shape_ok(&self.email) {
            Ok(())
        } else {
            Err(vec!["a valid email is required".to_string()])
        }
    }
}

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let username = self.username.trim();
        if username.len() < 3 || username.len() > 50 {
            errors.push("username must be between 3 and 50 characters".to_string());
        }

        if !email_shape_ok(&self.email) {
            errors.push("a valid email is required".to_string());
        }

        if self.password.len() < 8 {
            errors.push("password must be at least 8 characters".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Listing-card view of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub snippet: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub counted_views: i64,
    pub published_at: Option<DateTime<Utc>>,
}

/// Full detail view of a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub counted_views: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub comments: Vec<CommentResponse>,
    pub comment_count: u64,
}

/// Public view of an approved comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub author_name: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u64,
}

/// A category name with its published-post count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCountResponse {
    pub name: String,
    pub posts: u64,
}

/// Sidebar aggregates: totals, latest posts, category counts, tag cloud.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidebarResponse {
    pub total_posts: u64,
    pub latest_posts: Vec<PostSummary>,
    pub categories: Vec<CategoryCountResponse>,
    pub tags: Vec<String>,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Response containing an authentication token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

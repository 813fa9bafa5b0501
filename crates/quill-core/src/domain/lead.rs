//! Lead-capture records: contact messages and newsletter signups.
//! Captured once by public forms; no further lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message submitted through the contact form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ContactMessage {
    pub fn new(name: String, email: String, subject: Option<String>, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            subject,
            message,
            created_at: Utc::now(),
        }
    }
}

/// A newsletter signup; one row per distinct email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterSignup {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl NewsletterSignup {
    pub fn new(email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            created_at: Utc::now(),
        }
    }
}

//! Domain entities - the core business objects.

mod category;
mod comment;
mod lead;
mod post;
mod user;

pub use category::{Category, CategoryCount};
pub use comment::Comment;
pub use lead::{ContactMessage, NewsletterSignup};
pub use post::{Post, PostStatus, Viewer};
pub use user::User;

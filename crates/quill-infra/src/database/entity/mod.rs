//! SeaORM entities and their conversions to/from domain types.
//!
//! Tags live in the normalized `post_tags` table and are folded into
//! `Post.tags` at the repository boundary, so the post entity converts to a
//! domain `Post` only together with its tag rows.

pub mod category;
pub mod comment;
pub mod contact;
pub mod newsletter;
pub mod post;
pub mod post_tag;
pub mod post_view;
pub mod user;

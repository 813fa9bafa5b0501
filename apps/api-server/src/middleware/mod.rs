//! Request-level plumbing: error mapping and extractors.

pub mod auth;
pub mod error;
pub mod viewer;

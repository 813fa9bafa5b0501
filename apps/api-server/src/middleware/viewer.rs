//! Anonymous viewer identity, carried in a cookie.
//!
//! View counting needs a stable identity for readers who are not logged in.
//! The first detail request mints a random token; the handler sends it back
//! as a session cookie so replays from the same browser reuse the marker.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use std::future::{Ready, ready};
use uuid::Uuid;

/// Cookie holding the anonymous viewer token.
pub const VIEWER_COOKIE: &str = "qv";

/// The anonymous viewer token for this request. `fresh` is set when the
/// request carried no usable cookie and the token was minted here; the
/// handler is responsible for sending it back via `Set-Cookie`.
#[derive(Debug, Clone)]
pub struct ViewerToken {
    pub token: String,
    pub fresh: bool,
}

impl FromRequest for ViewerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = match req.cookie(VIEWER_COOKIE) {
            Some(cookie) if !cookie.value().is_empty() => Self {
                token: cookie.value().to_string(),
                fresh: false,
            },
            _ => Self {
                token: Uuid::new_v4().to_string(),
                fresh: true,
            },
        };
        ready(Ok(token))
    }
}

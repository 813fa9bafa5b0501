//! Lead-capture handlers: contact form and newsletter signup.

use actix_web::{HttpRequest, HttpResponse, web};

use quill_core::domain::{ContactMessage, NewsletterSignup};
use quill_shared::ApiResponse;
use quill_shared::dto::{ContactRequest, NewsletterRequest};

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

use super::enforce_rate_limit;

/// POST /api/contact
///
/// Captures the message; a blank or missing name is stored as "Anonymous".
pub async fn contact(
    state: web::Data<AppState>,
    body: web::Json<ContactRequest>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    enforce_rate_limit(&state, "contact", &req).await?;

    let request = body.into_inner();
    request.validate().map_err(AppError::Validation)?;

    let message = ContactMessage::new(
        request.display_name(),
        request.email.trim().to_string(),
        request.subject.clone(),
        request.message.clone(),
    );
    let saved = state.contacts.save(message).await?;

    tracing::info!(message_id = %saved.id, "Contact message received");

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        saved.id,
        "Thanks for reaching out. We will get back to you soon.",
    )))
}

/// POST /api/newsletter
///
/// Signing up an already-subscribed email is a quiet no-op.
pub async fn newsletter(
    state: web::Data<AppState>,
    body: web::Json<NewsletterRequest>,
    req: HttpRequest,
) -> AppResult<HttpResponse> {
    enforce_rate_limit(&state, "newsletter", &req).await?;

    let request = body.into_inner();
    request.validate().map_err(AppError::Validation)?;

    let email = request.email.trim().to_string();
    if let Some(existing) = state.newsletter.find_by_email(&email).await? {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
            existing.id,
            "You are already subscribed.",
        )));
    }

    let saved = state.newsletter.save(NewsletterSignup::new(email)).await?;

    tracing::info!(signup_id = %saved.id, "Newsletter signup");

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        saved.id,
        "Subscribed. Welcome aboard!",
    )))
}

//! HTTP-facing error type.

use actix_web::http::StatusCode;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpResponse, ResponseError};

use crate::templates;

/// Errors returned from request handlers.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// The resource does not exist (or the feature is not configured).
    #[error("Not found")]
    NotFound,

    /// The request was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Admin credentials are missing or wrong.
    #[error("Unauthorized")]
    Unauthorized,

    /// Storage failure.
    #[error(transparent)]
    Core(#[from] vaulty_core::Error),

    /// Failure talking to the OAuth provider.
    #[error(transparent)]
    OAuth(#[from] vaulty_oauth::Error),
}

/// Result type for handlers.
pub type WebResult<T> = Result<T, WebError>;

impl ResponseError for WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Core(err) if err.is_conflict() => StatusCode::CONFLICT,
            Self::Core(_) | Self::OAuth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let message = match self {
            Self::BadRequest(detail) => detail.clone(),
            _ => status.canonical_reason().unwrap_or("Error").to_string(),
        };

        let mut response = HttpResponse::build(status);
        if matches!(self, Self::Unauthorized) {
            response.insert_header((header::WWW_AUTHENTICATE, r#"Basic realm="Vaulty admin""#));
        }
        response
            .content_type(ContentType::html())
            .body(templates::error_page(status.as_u16(), &message))
    }
}

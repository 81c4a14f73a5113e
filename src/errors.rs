use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::repositories::post_repository::RepoError;

/// Uniform error envelope written to clients: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
struct ErrBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = ErrBody {
            error: self.to_string(),
        };
        match serde_json::to_string(&body) {
            Ok(json) => HttpResponse::build(self.status_code())
                .content_type(ContentType::json())
                .body(json),
            // A String field cannot realistically fail to encode, but a request
            // must never die without a response body.
            Err(e) => HttpResponse::build(self.status_code())
                .content_type(ContentType::plaintext())
                .body(format!("error while marshal error: {}", e)),
        }
    }
}

/// Routes JSON extractor failures through the service's own error envelope,
/// so a malformed body gets the same `{"error": ...}` shape as every other
/// failure.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

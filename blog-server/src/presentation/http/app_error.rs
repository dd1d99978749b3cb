use crate::domain::error::DomainError;
use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use utoipa::ToSchema;
use validator::ValidationErrors;

pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("json error: {0}")]
    Json(#[from] JsonRejection),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

pub(crate) type AppResult<T> = Result<T, AppError>;

/// `Json` body extractor whose rejections render as `ErrorBody`.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub(crate) struct AppJson<T>(pub(crate) T);

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ErrorBody {
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) details: Option<Vec<String>>,
}

impl ErrorBody {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    fn with_details(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(details),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Domain(err) => domain_error_body(err),
            AppError::Validation(err) => {
                let details = validator_details(&err);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::with_details(
                        format!("Validation failed: {}", details.join(", ")),
                        details,
                    ),
                )
            }
            AppError::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_details("Invalid JSON body", vec![rejection.body_text()]),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            AppError::Unauthorized(reason) => (StatusCode::UNAUTHORIZED, ErrorBody::new(reason)),
            AppError::Internal(err) => {
                error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(INTERNAL_ERROR_MESSAGE),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn domain_error_body(err: DomainError) -> (StatusCode, ErrorBody) {
    match err {
        err @ DomainError::Validation(_) => {
            let details: Vec<String> = err.violations().iter().map(ToString::to_string).collect();
            (
                StatusCode::BAD_REQUEST,
                ErrorBody::with_details(format!("Validation failed: {}", details.join(", ")), details),
            )
        }
        DomainError::DuplicateField(field) => (
            StatusCode::BAD_REQUEST,
            ErrorBody::new(format!("User with this {field} already exists")),
        ),
        DomainError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            ErrorBody::new("Invalid credentials"),
        ),
        DomainError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new("Post not found")),
        DomainError::Forbidden => (
            StatusCode::FORBIDDEN,
            ErrorBody::new("Access denied. You can only modify your own posts."),
        ),
        DomainError::Unexpected(msg) => {
            error!(error = %msg, "unexpected domain error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new(INTERNAL_ERROR_MESSAGE),
            )
        }
    }
}

fn validator_details(errors: &ValidationErrors) -> Vec<String> {
    let mut details: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: {}", err.code),
            })
        })
        .collect();
    details.sort();
    details
}

#[cfg(test)]
mod tests {
    use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
    use serde_json::Value;

    use super::AppError;
    use crate::domain::error::{DomainError, FieldViolation};

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must be readable");
        let json = serde_json::from_slice(&bytes).expect("body must be json");
        (status, json)
    }

    #[tokio::test]
    async fn validation_lists_every_violation() {
        let err = DomainError::Validation(vec![
            FieldViolation {
                field: "title",
                message: "must be 5..120 chars",
            },
            FieldViolation {
                field: "content",
                message: "must be at least 50 chars",
            },
        ]);

        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"].as_array().map(Vec::len), Some(2));
        assert!(
            body["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("Validation failed"))
        );
    }

    #[tokio::test]
    async fn duplicate_field_is_bad_request() {
        let (status, body) = render(DomainError::DuplicateField("email").into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User with this email already exists");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn unexpected_error_hides_cause() {
        let (status, body) =
            render(DomainError::Unexpected("connection refused".to_string()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
    }
}

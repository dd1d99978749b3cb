use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::infrastructure::jwt::JwtError;
use crate::presentation::AppState;
use crate::presentation::http::app_error::AppError;

pub(crate) const NO_TOKEN: &str = "Access denied. No valid token provided.";
pub(crate) const TOKEN_EXPIRED: &str = "Access denied. Token expired.";
pub(crate) const INVALID_TOKEN: &str = "Access denied. Invalid token.";

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
    pub(crate) username: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized(NO_TOKEN))
    }
}

pub(crate) async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized(NO_TOKEN))?;

    let claims = state.jwt.verify_token(token).map_err(|err| {
        debug!(error = %err, "rejected bearer token");
        match err {
            JwtError::Expired => AppError::Unauthorized(TOKEN_EXPIRED),
            _ => AppError::Unauthorized(INVALID_TOKEN),
        }
    })?;

    request.extensions_mut().insert(AuthenticatedUser {
        user_id: claims.user_id,
        username: claims.username,
    });

    Ok(next.run(request).await)
}

/// Extracts `<token>` from a `Bearer <token>` header value.
fn bearer_token(header_value: &str) -> Option<&str> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

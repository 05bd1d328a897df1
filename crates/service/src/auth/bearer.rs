use super::errors::{AuthError, Denial};
use super::service::AuthService;

const PREFIX: &str = "Bearer ";

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|value| value.strip_prefix(PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthorized(Denial::MissingBearer))
}

/// Verified username carried by the bearer token in `header`.
pub fn username_from_bearer(header: Option<&str>, auth: &AuthService) -> Result<String, AuthError> {
    let token = bearer_token(header)?;
    Ok(auth.validate_token(token)?.username)
}

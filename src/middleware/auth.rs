use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::AuthError;
use crate::error::ApiError;

/// Bearer-token middleware: resolves the requester `Identity` and injects it
/// into the request extensions for the protected handlers.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)?;
    let identity = state.tokens.resolve(token)?;

    tracing::debug!("Authenticated user {} as {}", identity.user_id, identity.role);
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        Some(_) => Err(AuthError::MalformedHeader("Empty bearer token")),
        None => Err(AuthError::MalformedHeader("Authorization header must use Bearer token format")),
    }
}

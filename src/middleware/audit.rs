use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    extract::{ConnectInfo, OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::app::AppState;
use crate::auth::Identity;
use crate::database::LogEntry;
use crate::error::{ApiError, FieldError};

/// Longest request body kept in a log row.
pub const MAX_LOGGED_BODY_CHARS: usize = 255;

/// Writes one `logs` row per authenticated request. Must be layered inside
/// the bearer-token middleware so the `Identity` extension is present.
pub async fn audit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.audit_logging {
        return Ok(next.run(request).await);
    }
    let Some(identity) = request.extensions().get::<Identity>().copied() else {
        return Ok(next.run(request).await);
    };

    let ip_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let method = request.method().to_string();
    let requested_url = request
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.to_string())
        .unwrap_or_else(|| request.uri().to_string());

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, state.max_body_bytes).await.map_err(|e| {
        tracing::debug!("Audit could not buffer request body: {}", e);
        ApiError::validation(vec![FieldError::body("body", "could not be read", None)])
    })?;
    let logged_body = truncate_chars(&String::from_utf8_lossy(&bytes), MAX_LOGGED_BODY_CHARS);
    let request = Request::from_parts(parts, Body::from(bytes));

    let entry = LogEntry {
        user_id: identity.user_id,
        ip_address,
        method,
        body: logged_body,
        requested_url,
        time: Utc::now().naive_utc(),
    };
    if let Err(e) = state.store.record_log(entry).await {
        tracing::error!("Failed to write audit log for user {}: {}", identity.user_id, e);
    }

    Ok(next.run(request).await)
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

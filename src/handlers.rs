use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, Method, StatusCode, Uri},
};

use crate::{
    config::AppConfig,
    error::{PageError, Result},
    models::SessionStatus,
    pages::{PageRequest, PageResponse, PageState},
    session::{self, RequestCookies},
};

// --- Handlers ---

/// health
///
/// Liveness probe for load balancers. No guard rule matches this path.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Gateway is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// Reports the browser session as carried by the request cookies. Never fails: a request
/// without cookies simply reports an anonymous session.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Current session", body = SessionStatus))
)]
pub async fn get_session(headers: HeaderMap) -> Json<SessionStatus> {
    let cookies = RequestCookies::from_headers(&headers);

    let expires_at = cookies
        .token()
        .and_then(session::token_expiry)
        .and_then(session::expiry_timestamp);

    Json(SessionStatus {
        authenticated: cookies.has_session(),
        username: cookies.username().map(str::to_string),
        is_admin: cookies.is_admin(),
        expires_at,
    })
}

/// render_page
///
/// Fallback for every path the gateway does not answer itself. By the time a request gets
/// here the route guard has already allowed it; this only forwards it to the page service.
/// The body is capped by the `DefaultBodyLimit` installed in `create_router`.
pub async fn render_page(
    State(pages): State<PageState>,
    State(config): State<AppConfig>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<PageResponse> {
    let body = body.map_err(|rejection| body_read_error(&rejection, config.max_body_bytes))?;

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    pages
        .fetch_page(PageRequest {
            method,
            path_and_query,
            headers,
            body,
        })
        .await
}

/// Only a body over the limit is a 413; a disconnect or broken chunking is the client's fault.
fn body_read_error(rejection: &BytesRejection, limit: usize) -> PageError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PageError::BodyTooLarge(limit)
    } else {
        PageError::RequestBody(rejection.body_text())
    }
}

use crate::{AppState, handlers};
use axum::Router;

/// Page Router Module
///
/// Every path and method without an explicit route lands here and is forwarded to the page
/// renderer. Redirects decided by the guard never reach this router.
pub fn page_routes() -> Router<AppState> {
    Router::new().fallback(handlers::render_page)
}

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod session;

pub mod routes;
use routes::{pages as page_router, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{GuardDecision, GuardPolicy, RouteGuard};
pub use pages::{MockPageService, PageState, UpstreamPageService};

/// ApiDoc
///
/// OpenAPI document for the endpoints the gateway answers itself. Page traffic is opaque to
/// the gateway and is not described here. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_session),
    components(schemas(models::SessionStatus)),
    tags(
        (name = "fitfusion-gateway", description = "FitFusion session gateway")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable container for everything a request may need.
#[derive(Clone)]
pub struct AppState {
    /// Where allowed requests are forwarded.
    pub pages: PageState,
    /// The route guard evaluated before every request.
    pub guard: Arc<RouteGuard>,
    /// The loaded configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Builds state whose guard follows `config.guard`.
    pub fn new(pages: PageState, config: AppConfig) -> Self {
        Self {
            pages,
            guard: Arc::new(RouteGuard::new(config.guard.clone())),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for PageState {
    fn from_ref(app_state: &AppState) -> PageState {
        app_state.pages.clone()
    }
}

impl FromRef<AppState> for Arc<RouteGuard> {
    fn from_ref(app_state: &AppState) -> Arc<RouteGuard> {
        app_state.guard.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the gateway: own endpoints and docs, the page fallback, the route guard around
/// all of them, then the observability stack and CORS.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(page_router::page_routes())
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        // Route Guard: `layer` (not `route_layer`) so the fallback is guarded too.
        .layer(middleware::from_fn_with_state(
            state.guard.clone(),
            guard::route_guard,
        ));

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, carrying the `x-request-id` so all log lines of one request
/// correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

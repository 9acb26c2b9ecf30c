use fitfusion_gateway::{
    AppState, UpstreamPageService,
    config::{AppConfig, Env},
    create_router,
    pages::PageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, wires the page service and serves the gateway.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise debug for the gateway itself.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fitfusion_gateway=debug,tower_http=info".into());

    // 3. Log format per environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // JSON lines for the log aggregator.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Gateway starting in {:?} mode", config.env);
    tracing::info!(policy = ?config.guard, "Route guard configured");

    // 4. Page renderer
    let upstream = UpstreamPageService::new(&config.upstream_url)
        .expect("FATAL: Failed to build the upstream HTTP client.");
    tracing::info!("Forwarding pages to {}", upstream.base_url());
    let pages = Arc::new(upstream) as PageState;

    // 5. State and router
    let listen_addr = config.listen_addr.clone();
    let app = create_router(AppState::new(pages, config));

    let listener = TcpListener::bind(&listen_addr)
        .await
        .expect("FATAL: Failed to bind LISTEN_ADDR.");

    tracing::info!("Listening on {}", listen_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}

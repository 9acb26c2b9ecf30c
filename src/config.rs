use std::env;

use crate::guard::{AdminGate, GuardPolicy};

/// Cap on request bodies forwarded to the page renderer (10 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// AppConfig
///
/// Holds the gateway's entire configuration. Immutable once loaded and shared with every
/// request through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and which variables are mandatory.
    pub env: Env,
    // Socket address the HTTP server binds to.
    pub listen_addr: String,
    // Base URL of the page renderer that allowed requests are forwarded to.
    pub upstream_url: String,
    // Largest request body forwarded upstream.
    pub max_body_bytes: usize,
    // Paths and switches for the route guard.
    pub guard: GuardPolicy,
}

/// Env
///
/// Runtime context. Local favours readable logs and fallbacks; Production demands explicit
/// configuration.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            listen_addr: "0.0.0.0:3000".to_string(),
            upstream_url: "http://localhost:3001".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            guard: GuardPolicy::default(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics if `UPSTREAM_URL` is missing in production, or if `MAX_BODY_BYTES` is set but
    /// not a number. The gateway must not start half-configured.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let upstream_url = match env {
            Env::Production => {
                env::var("UPSTREAM_URL").expect("FATAL: UPSTREAM_URL must be set in production.")
            }
            Env::Local => {
                env::var("UPSTREAM_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
            }
        };

        let max_body_bytes = match env::var("MAX_BODY_BYTES") {
            Ok(raw) => raw
                .trim()
                .parse()
                .expect("FATAL: MAX_BODY_BYTES must be a whole number of bytes."),
            Err(_) => DEFAULT_MAX_BODY_BYTES,
        };

        Self {
            env,
            listen_addr: env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            upstream_url,
            max_body_bytes,
            guard: load_guard_policy(),
        }
    }
}

/// load_guard_policy
///
/// The guard's core paths are fixed; only the optional rules are configurable.
fn load_guard_policy() -> GuardPolicy {
    let protected_paths = env::var("GUARD_PROTECTED_PATHS")
        .map(|raw| parse_path_list(&raw))
        .unwrap_or_default();

    let admin_gate = env::var("GUARD_ADMIN_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(|path| AdminGate {
            path: path.trim().to_string(),
            fallback: env::var("GUARD_ADMIN_FALLBACK")
                .unwrap_or_else(|_| "/dashboard".to_string()),
        });

    let expire_sessions = env::var("GUARD_EXPIRE_SESSIONS")
        .map(|raw| matches!(raw.trim(), "true" | "1" | "yes"))
        .unwrap_or(false);

    GuardPolicy {
        protected_paths,
        admin_gate,
        expire_sessions,
        ..GuardPolicy::default()
    }
}

/// Splits a comma-separated path list, dropping blanks.
pub fn parse_path_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

use fitfusion_gateway::{
    AppConfig,
    config::{DEFAULT_MAX_BODY_BYTES, Env, parse_path_list},
    guard::AdminGate,
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 8] = [
    "APP_ENV",
    "LISTEN_ADDR",
    "UPSTREAM_URL",
    "MAX_BODY_BYTES",
    "GUARD_PROTECTED_PATHS",
    "GUARD_ADMIN_PATH",
    "GUARD_ADMIN_FALLBACK",
    "GUARD_EXPIRE_SESSIONS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with every config variable cleared, then restores the originals.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
            }
            // UPSTREAM_URL is missing
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without UPSTREAM_URL"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.listen_addr, "0.0.0.0:3000");
    assert_eq!(config.upstream_url, "http://localhost:3001");
    assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    assert_eq!(config.guard, fitfusion_gateway::GuardPolicy::default());
}

#[test]
#[serial]
fn test_app_config_production_with_upstream() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("UPSTREAM_URL", "http://renderer:3000");
            env::set_var("LISTEN_ADDR", "127.0.0.1:8080");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.upstream_url, "http://renderer:3000");
    assert_eq!(config.listen_addr, "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_guard_rules_from_env() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("GUARD_PROTECTED_PATHS", "/dashboard, /friends,,/settings ");
            env::set_var("GUARD_ADMIN_PATH", "/admin");
            env::set_var("GUARD_EXPIRE_SESSIONS", "true");
        }
        AppConfig::load()
    });

    assert_eq!(
        config.guard.protected_paths,
        vec!["/dashboard", "/friends", "/settings"]
    );
    assert_eq!(
        config.guard.admin_gate,
        Some(AdminGate {
            path: "/admin".to_string(),
            fallback: "/dashboard".to_string(),
        })
    );
    assert!(config.guard.expire_sessions);
    // Core paths are not configurable.
    assert_eq!(config.guard.login_path, "/login");
}

#[test]
#[serial]
fn test_invalid_body_limit_panics() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("MAX_BODY_BYTES", "lots");
            }
            AppConfig::load()
        })
    });
    assert!(result.is_err());
}

#[test]
fn test_parse_path_list_blank() {
    assert!(parse_path_list("").is_empty());
    assert!(parse_path_list(" , ,").is_empty());
}

//! `config`: print or validate the loaded configuration.

use super::output::Output;
use crate::utils::toml_config::AuthGateConfig;

/// Print a summary (or, with `full`, every section). Secret values are never
/// printed; only whether their env vars resolve.
pub fn show(config: &AuthGateConfig, full: bool, output: &Output) {
    output.header("Server");
    output.kv("listen", &config.bind_address());
    output.kv("log", &format!("{} ({:?})", config.server.log_level, config.server.log_format));

    output.header("Tokens");
    output.secret_ref(
        "signing secret",
        &config.auth.jwt_secret_env,
        config.jwt_secret().is_ok(),
    );
    output.kv("access ttl", &format!("{}s", config.auth.access_token_ttl_secs));
    output.kv("refresh ttl", &format!("{}s", config.auth.refresh_token_ttl_secs));

    output.header("Sessions");
    output.kv("backend", &format!("{:?}", config.session.backend).to_lowercase());
    output.kv("ttl", &format!("{}s", config.session.ttl_secs));

    output.header("Database");
    output.kv("url", &config.database.url);

    if full {
        output.kv(
            "operation timeout",
            &format!("{}ms", config.database.operation_timeout_ms),
        );
        if let Some(env) = &config.database.turso_url_env {
            output.secret_ref("turso url", env, config.resolve_env(env).is_some());
        }
        if let Some(env) = &config.database.turso_token_env {
            output.secret_ref("turso token", env, config.resolve_env(env).is_some());
        }
        output.secret_ref(
            "redis url",
            &config.session.redis_url_env,
            config.redis_url().is_ok(),
        );
        output.kv("cookie secure", &config.session.cookie_secure.to_string());
        output.kv(
            "request timeout",
            &format!("{}s", config.server.request_timeout_secs),
        );
        output.kv("max body", &format!("{} bytes", config.server.max_body_bytes));
    }
}

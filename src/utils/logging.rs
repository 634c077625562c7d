//! Tracing subscriber setup.

use crate::utils::toml_config::{LogFormat, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `server.log_level`. `verbose` forces the
/// crate's own spans to `debug`.
pub fn init_tracing(server: &ServerConfig, verbose: bool) -> anyhow::Result<()> {
    let default_directive = if verbose {
        format!("{},authgate=debug,tower_http=debug", server.log_level)
    } else {
        format!("{},tower_http=info", server.log_level)
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()?,
    }

    Ok(())
}

//! Init command implementation
//!
//! Scaffolds a new Authgate project: `authgate.toml`, `.env.example` with a
//! freshly generated signing secret, `data/` and `.gitignore`.

use super::output::Output;
use rand::RngCore;
use std::fs;
use std::path::Path;

/// Result of the init operation
pub enum InitResult {
    /// Initialization completed successfully
    Success,
    /// Project already exists (authgate.toml found)
    AlreadyExists,
    /// An error occurred during initialization
    Error(String),
}

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: std::path::PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    output.banner();
    output.header("Initializing Authgate Project");

    let base_path = &config.path;

    let config_path = base_path.join("authgate.toml");
    if config_path.exists() && !config.force {
        output.warning("authgate.toml already exists!");
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    let data_dir = base_path.join("data");
    if data_dir.exists() {
        output.skipped("data", "already exists");
    } else {
        if let Err(e) = fs::create_dir_all(&data_dir) {
            output.error(&format!("Failed to create data/: {}", e));
            return InitResult::Error(e.to_string());
        }
        output.created("directory", "data");
    }

    let toml_content = generate_authgate_toml(&config);
    if let Err(e) = write_file(&config_path, &toml_content, config.force) {
        output.error(&format!("Failed to create authgate.toml: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("config", "authgate.toml");

    let env_example_path = base_path.join(".env.example");
    if let Err(e) = write_file(&env_example_path, &generate_env_example(), config.force) {
        output.error(&format!("Failed to create .env.example: {}", e));
        return InitResult::Error(e.to_string());
    }
    output.created("env", ".env.example");

    let gitignore_path = base_path.join(".gitignore");
    if !gitignore_path.exists() {
        if let Err(e) = write_file(&gitignore_path, GITIGNORE, false) {
            output.warning(&format!("Failed to create .gitignore: {}", e));
        } else {
            output.created("file", ".gitignore");
        }
    }

    output.complete("Authgate project initialized");

    output.header("Next Steps");
    output.info("1. Set up environment variables:");
    output.command("cp .env.example .env");
    output.info("2. Create a user:");
    output.command("authgate-server user add alice --password '<password>'");
    output.info("3. Start the server:");
    output.command("authgate-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_file(path: &Path, content: &str, force: bool) -> std::io::Result<()> {
    if path.exists() && !force {
        return Ok(());
    }
    fs::write(path, content)
}

/// 32 random bytes, hex encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn generate_authgate_toml(config: &InitConfig) -> String {
    format!(
        r#"# Authgate configuration
# Secrets are never stored here; each *_env key names the environment
# variable that holds the value.

[server]
host = "{host}"
port = {port}
log_level = "info"
log_format = "pretty"   # or "json"
request_timeout_secs = 5
max_body_bytes = 65536

[auth]
jwt_secret_env = "JWT_SECRET"
access_token_ttl_secs = 900          # 15 minutes
refresh_token_ttl_secs = 2592000     # 30 days

[session]
ttl_secs = 1296000                   # 15 days
backend = "memory"                   # or "redis" (requires the redis feature)
redis_url_env = "REDIS_URL"
cookie_secure = false                # set true behind HTTPS

[database]
url = "./data/authgate.db"
# turso_url_env = "TURSO_DATABASE_URL"
# turso_token_env = "TURSO_AUTH_TOKEN"
operation_timeout_ms = 2000
"#,
        host = config.host,
        port = config.port,
    )
}

fn generate_env_example() -> String {
    format!(
        r#"# Authgate environment
# HMAC signing secret, at least 32 bytes. Generated by `authgate-server init`.
JWT_SECRET={secret}

# Redis session backend (session.backend = "redis")
# REDIS_URL=redis://127.0.0.1:6379/

# Remote Turso database
# TURSO_DATABASE_URL=libsql://your-db.turso.io
# TURSO_AUTH_TOKEN=

# Log filter override
# RUST_LOG=info,authgate=debug
"#,
        secret = generate_secret()
    )
}

const GITIGNORE: &str = r#"# Authgate Generated Files
/data/
*.db
*.db-journal

# Environment
.env
.env.local

# Rust
/target/
"#;

//! CLI module for Authgate
//!
//! Provides command-line interface parsing and handling for the authgate-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod config;
pub mod init;
pub mod output;
pub mod user;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Authgate - signed-token and session authentication server
#[derive(Parser, Debug)]
#[command(
    name = "authgate-server",
    version,
    about = "Authgate - signed-token and session authentication server",
    long_about = "An HTTP authentication service with rotating refresh tokens and\n\
                  server-side sessions.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a new project.",
    after_help = "EXAMPLES:\n    \
                  authgate-server init                      # Scaffold authgate.toml and .env.example\n    \
                  authgate-server user add alice -p secret  # Provision a user\n    \
                  authgate-server                           # Start the server (requires authgate.toml)\n    \
                  authgate-server --config my.toml          # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "authgate.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (the default when no subcommand is given)
    Serve,

    /// Initialize a new Authgate project
    ///
    /// Creates authgate.toml, .env.example with a generated signing secret,
    /// the data/ directory and a .gitignore.
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files without prompting
        #[arg(short, long)]
        force: bool,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8000")]
        port: u16,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Manage users
    #[command(subcommand)]
    User(UserCommands),
}

/// User management subcommands
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Create a user with an Argon2id password hash
    Add {
        /// Login name
        username: String,

        /// Password (prefer the environment variable over the flag)
        #[arg(short, long, env = "AUTHGATE_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

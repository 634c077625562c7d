use authgate::{
    api::routes::build_app,
    cli::{
        self,
        init::{InitConfig, InitResult},
        output::Output,
        Cli, Commands, UserCommands,
    },
    utils::logging::init_tracing,
    AppState, AuthGateConfig,
};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let result = match cli.command {
        None | Some(Commands::Serve) => serve(&cli.config, cli.verbose).await,
        Some(Commands::Init {
            path,
            force,
            host,
            port,
        }) => {
            let config = InitConfig {
                path,
                force,
                host,
                port,
            };
            return match cli::init::run(config, &output) {
                InitResult::Success => ExitCode::SUCCESS,
                InitResult::AlreadyExists | InitResult::Error(_) => ExitCode::FAILURE,
            };
        }
        Some(Commands::Config { full, validate }) => {
            show_config(&cli.config, full, validate, &output)
        }
        Some(Commands::User(UserCommands::Add {
            username,
            password,
            description,
        })) => add_user(&cli.config, &username, &password, description, &output).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output.error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn serve(config_path: &std::path::Path, verbose: bool) -> anyhow::Result<()> {
    let config = AuthGateConfig::load(config_path)?;
    init_tracing(&config.server, verbose)?;

    let addr = config.bind_address();
    let state = AppState::from_config(config).await?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "authgate listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn show_config(
    config_path: &std::path::Path,
    full: bool,
    validate: bool,
    output: &Output,
) -> anyhow::Result<()> {
    let config = AuthGateConfig::from_file(config_path)?;
    output.info(&format!("Configuration: {}", config_path.display()));
    cli::config::show(&config, full, output);

    if validate {
        config.validate()?;
        output.success("Configuration is valid");
    }
    Ok(())
}

async fn add_user(
    config_path: &std::path::Path,
    username: &str,
    password: &str,
    description: Option<String>,
    output: &Output,
) -> anyhow::Result<()> {
    let config = AuthGateConfig::from_file(config_path)?;
    cli::user::add_user(&config, username, password, description, output).await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

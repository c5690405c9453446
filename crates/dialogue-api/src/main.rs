//! Entry point of the `dialogue` binary.
//!
//! Loads configuration, sets up tracing, then runs a service or an operator
//! command.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use dialogue_infra::config::load_service_config;
use dialogue_observe::tracing_setup::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "dialogue", &mut std::io::stdout());
        return Ok(());
    }

    // Tracing is configured from the loaded config, so loader warnings are
    // held until the subscriber is installed.
    let loaded = load_service_config(cli.config.as_deref()).await;
    init_tracing(cli.log_level(), loaded.config.observability.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
    loaded.log_warnings();
    let config = loaded.config;
    tracing::debug!(?config, "Loaded configuration");

    let result = match cli.command {
        Commands::Orchestrator { port, host } => {
            cli::serve::run_orchestrator(&config, &host, port, cli.quiet).await
        }
        Commands::Generator { port, host } => {
            cli::serve::run_generator(&config, &host, port, cli.quiet).await
        }
        Commands::Agent { action } => {
            cli::agent::handle_agent_command(action, &config, cli.json).await
        }
        Commands::Chat { action } => cli::chat::handle_chat_command(action, &config, cli.json).await,
        Commands::Completions { .. } => Ok(()),
    };

    shutdown_tracing();
    result
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
    tracing::info!("Shutting down");
}

//! Service runners.

use anyhow::Result;
use console::style;

use dialogue_types::config::ServiceConfig;

use crate::http::router::{generator_router, orchestrator_router};
use crate::state::{GeneratorState, OrchestratorState};

async fn bind(host: &str, port: u16, service: &str, quiet: bool) -> Result<tokio::net::TcpListener> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, service, "Listening");
    if !quiet {
        println!(
            "  {} {} listening on {}",
            style("*").bold(),
            service,
            style(format!("http://{addr}")).cyan()
        );
        println!("  {}", style("Press Ctrl+C to stop").dim());
    }
    Ok(listener)
}

/// Run the orchestrator until Ctrl+C or SIGTERM.
pub async fn run_orchestrator(config: &ServiceConfig, host: &str, port: u16, quiet: bool) -> Result<()> {
    let state = OrchestratorState::init(config).await?;
    let shutdown = state.shutdown.clone();
    let listener = bind(host, port, "dialogue-orchestrator", quiet).await?;
    // Feed streams never end on their own; cancelling closes them so the
    // graceful shutdown can finish.
    axum::serve(listener, orchestrator_router(state))
        .with_graceful_shutdown(async move {
            crate::shutdown_signal().await;
            shutdown.cancel();
        })
        .await?;
    Ok(())
}

/// Run the generator until Ctrl+C or SIGTERM.
pub async fn run_generator(config: &ServiceConfig, host: &str, port: u16, quiet: bool) -> Result<()> {
    let state = GeneratorState::init(config).await?;
    let listener = bind(host, port, "dialogue-generator", quiet).await?;
    axum::serve(listener, generator_router(state))
        .with_graceful_shutdown(crate::shutdown_signal())
        .await?;
    Ok(())
}

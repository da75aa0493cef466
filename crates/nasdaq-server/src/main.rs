//! NASDAQ stock agent HTTP server

use clap::Parser;
use nasdaq_agent::AgentConfig;
use nasdaq_server::{AppState, create_app};
use nasdaq_utils::{LogFormat, init_tracing};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "nasdaq-agent-server")]
#[command(about = "REST and A2A server for the NASDAQ stock agent", long_about = None)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    port: u16,

    /// Base URL advertised in the agent descriptor; defaults to http://localhost:<port>
    #[arg(long, env = "PUBLIC_URL")]
    public_url: Option<String>,

    /// Directory for the JSONL audit logs
    #[arg(long, env = "LOGS_DIR")]
    logs_dir: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = AgentConfig::from_env()?;
    if let Some(dir) = args.logs_dir {
        config.logs_dir = dir;
    }
    let public_url = args
        .public_url
        .unwrap_or_else(|| format!("http://localhost:{}", args.port));
    let state = AppState::from_config(&config, public_url).await?;

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, agent_id = %config.identity.id, "Listening");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use muster_api::config;
use muster_api::database;
use muster_api::mailer::LogMailer;
use muster_api::middleware::spawn_sweeper;
use muster_api::routes;
use muster_api::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "muster-api", about = "Police training records API server")]
struct Args {
    /// API server port
    #[arg(long, default_value_t = 4000)]
    port: u16,

    /// PostgreSQL DSN; falls back to MUSTER_DB_DSN
    #[arg(long)]
    db_dsn: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up MUSTER_DB_DSN and friends.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("muster_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = config::config();

    let dsn = args
        .db_dsn
        .or_else(|| std::env::var("MUSTER_DB_DSN").ok())
        .ok_or_else(|| anyhow::anyhow!("no database DSN: pass --db-dsn or set MUSTER_DB_DSN"))?;

    let pool = database::open_pool(&dsn, config).await?;
    tracing::info!("database connection pool established");

    let state = AppState::new(config, pool, Arc::new(LogMailer));

    // The sweeper bounds rate-limiter memory; it stops when we shut down.
    let sweep_cancel = CancellationToken::new();
    let sweeper = spawn_sweeper(state.limiter.clone(), sweep_cancel.clone());

    let app = routes::router(state.clone());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        environment = ?config.environment,
        "starting server"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Stop accepting work, then drain tracked background tasks within the
    // grace period rather than abandoning them mid-flight.
    sweep_cancel.cancel();
    let _ = sweeper.await;

    state.tasks.close();
    let grace = Duration::from_secs(config.api.shutdown_grace_secs);
    if tokio::time::timeout(grace, state.tasks.wait()).await.is_err() {
        tracing::warn!(?grace, "background tasks did not drain before the grace period");
    }

    tracing::info!("stopped server");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives, triggering graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

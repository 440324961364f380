mod bootstrap;
mod health;
mod voice;

use std::time::Duration;

use anyhow::Result;
use moveline_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use moveline_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let router = health::router(app.db_pool.clone()).merge(voice::router(app.runtime.clone()));
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        call_id = "unknown",
        booking_id = "unknown",
        bind_address = %address,
        "moveline-server started"
    );

    let sweeper_runtime = app.runtime.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(60));
        loop {
            ticker.tick().await;
            let expired = sweeper_runtime.expire_idle_sessions().await;
            if expired > 0 {
                tracing::info!(
                    event_name = "system.sessions.swept",
                    correlation_id = "sweeper",
                    call_id = "unknown",
                    booking_id = "unknown",
                    expired,
                    "idle call sessions swept"
                );
            }
        }
    });

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        call_id = "unknown",
        booking_id = "unknown",
        "moveline-server stopping"
    );

    Ok(())
}

async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
}

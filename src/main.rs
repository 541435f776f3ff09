// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::{Context, Result};
use fabula::application::{AuthService, GenerationService};
use fabula::config::ServiceConfig;
use fabula::domain::novel::ContextSource;
use fabula::infrastructure::db::Database;
use fabula::infrastructure::rate_limiter::FixedWindowLimiter;
use fabula::infrastructure::repositories::{SqliteContextSource, SqliteUserStore};
use fabula::presentation::{app, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info")?;

    let config = ServiceConfig::from_env();
    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to open database")?;

    let generation = Arc::new(GenerationService::from_config(&config));
    let auth = Arc::new(AuthService::new(
        Arc::new(SqliteUserStore::new(db.clone())),
        config.auth_secret.clone(),
        config.auth_token_ttl_seconds,
    ));
    let context: Arc<dyn ContextSource> = Arc::new(SqliteContextSource::new(db));
    let limiter = Arc::new(FixedWindowLimiter::new(
        config.rate_limit_per_window,
        config.rate_limit_window_seconds,
    ));

    let state = Arc::new(AppState {
        generation,
        auth,
        context,
        limiter,
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on {addr}");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    Ok(())
}

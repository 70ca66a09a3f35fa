// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Carousel Server - HTTP entry point
//!
//! Boot order: logging, .env, config, database pool, migrations, gateway
//! client, router, serve until ctrl-c.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use carousel_core::gateway::GroupGateway;
use carousel_gateway::{GatewayConfig, HttpGroupGateway};
use carousel_server::config::Config;
use carousel_server::routes;
use carousel_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "carousel=info,tower_http=info".into()),
        )
        .init();

    // Load .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file loaded: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;

    info!(
        http_port = config.http_port,
        gateway = %config.gateway_base_url,
        join_keyword = %config.join_keyword,
        "Starting Carousel"
    );

    // Connect to database
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    info!("Connected to database");

    carousel_core::migrations::run_postgres(&pool).await?;

    info!("Database schema verified");

    // Build the gateway client
    let gateway_config = GatewayConfig::new(&config.gateway_base_url, &config.gateway_api_key)
        .with_timeout(config.gateway_timeout);
    let gateway: Arc<dyn GroupGateway> = Arc::new(HttpGroupGateway::new(gateway_config)?);

    let state = AppState::new(
        pool,
        gateway,
        config.internal_token.clone(),
        config.join_keyword.clone(),
    );
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %addr, "Carousel server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    info!("Carousel server shut down");

    Ok(())
}

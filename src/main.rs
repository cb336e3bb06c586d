//! Storefront API server.

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::{config::Config, gateway::GatewayClient, handlers, sweeper, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let gateway = GatewayClient::new(config.gateway.clone())?;
    let state = AppState { db, gateway, config: config.clone() };

    tokio::spawn(sweeper::run(state.clone()));

    let app = handlers::router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("storefront API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app).await?;
    Ok(())
}

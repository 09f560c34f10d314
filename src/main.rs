use std::sync::Arc;

use actix_web::middleware::from_fn;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod errors;
mod handlers;
mod metrics;
mod models;
mod pagination;
mod repository;

use config::AppConfig;
use handlers::AppState;
use repository::{LineItemRepository, LookupRepository, OrderRepository};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,northwind_orders=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!("🚀 Starting northwind-orders");

    tracing::info!("Connecting to Postgres...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database schema is up to date");

    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    let state = web::Data::new(AppState {
        orders: OrderRepository::new(pool.clone()),
        line_items: LineItemRepository::new(pool.clone()),
        lookups: LookupRepository::new(pool),
        metrics,
    });

    tracing::info!("Listening on http://{}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(from_fn(handlers::track_http))
            .configure(handlers::routes)
    })
    .bind(config.bind_addr)?
    .run()
    .await?;

    Ok(())
}

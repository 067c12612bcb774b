mod catalog;
mod cli;
mod config;
mod db;
mod engine;
mod errors;
mod image_search;
mod models;
mod routes;
mod scheduler;
mod seed;
mod state;

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::catalog::{CatalogStore, PgCatalogStore};
use crate::cli::Cli;
use crate::config::Config;
use crate::db::create_pool;
use crate::engine::MarketEngine;
use crate::image_search::{ImageSearch, UnsplashClient};
use crate::routes::build_router;
use crate::scheduler::MarketScheduler;
use crate::seed::{seed_marketplace, SeedPlan};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command.as_ref().and_then(|c| c.seed_plan()) {
        Some(plan) => seed(&config, &plan).await,
        None => serve(&config).await,
    }
}

async fn serve(config: &Config) -> Result<()> {
    info!("Starting EcoFinds API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let catalog: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(db.clone()));

    // Image search is optional; without a key listings use curated images
    let image_search = build_image_search(config);

    let engine = Arc::new(MarketEngine::new(image_search));
    let scheduler = Arc::new(MarketScheduler::new(engine.clone(), catalog.clone()));
    if config.scheduler_enabled {
        scheduler.start();
    } else {
        info!("Market scheduler disabled");
    }

    let state = AppState {
        db,
        catalog,
        engine,
        scheduler: scheduler.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    Ok(())
}

async fn seed(config: &Config, plan: &SeedPlan) -> Result<()> {
    info!("Seeding {} users and {} products", plan.users, plan.products);

    let db = create_pool(&config.database_url).await?;
    let catalog = PgCatalogStore::new(db);
    let engine = MarketEngine::new(build_image_search(config));

    let report = seed_marketplace(&engine, &catalog, plan).await?;
    info!(
        users = report.users,
        products = report.products,
        cart_items = report.cart_items,
        purchases = report.purchases,
        refreshed = report.refreshed,
        categories = report.categories,
        trending = %report.trending.join(", "),
        "Seeding complete"
    );
    Ok(())
}

fn build_image_search(config: &Config) -> Option<Arc<dyn ImageSearch>> {
    let key = config.unsplash_access_key.clone()?;
    match UnsplashClient::new(config.image_search_url.clone(), key) {
        Ok(client) => {
            info!("Image search enabled ({})", config.image_search_url);
            Some(Arc::new(client))
        }
        Err(e) => {
            warn!("Image search unavailable, using curated images: {e}");
            None
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::CatalogStore;
use crate::engine::MarketEngine;
use crate::scheduler::MarketScheduler;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Write path shared with the market mutator. Default: `PgCatalogStore`.
    pub catalog: Arc<dyn CatalogStore>,
    pub engine: Arc<MarketEngine>,
    pub scheduler: Arc<MarketScheduler>,
}

//! Axum route handlers for market data and the market mutator.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::taxonomy::DEFAULT_CATEGORY;
use crate::engine::{GeneratedListing, GeneratedUser, ImpactMetrics, MarketInsights};
use crate::errors::AppError;
use crate::scheduler::{JobKind, SchedulerStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub trending_categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub category: String,
    pub base_price: f64,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub category: String,
    pub base_price: f64,
    pub adjusted_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct ImpactQuery {
    pub category: String,
    pub price: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePricesQuery {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdatePricesResponse {
    pub updated: bool,
    pub products_updated: usize,
    pub last_price_refresh: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SchedulerToggleResponse {
    pub running: bool,
    /// False when the scheduler was already in the requested state.
    pub changed: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/market/insights
pub async fn handle_market_insights(State(state): State<AppState>) -> Json<MarketInsights> {
    Json(state.engine.market_insights())
}

/// GET /api/v1/market/trending
pub async fn handle_trending(State(state): State<AppState>) -> Json<TrendingResponse> {
    Json(TrendingResponse {
        trending_categories: state.engine.trending_categories(),
    })
}

/// GET /api/v1/market/generate?category=
///
/// Preview of a generated listing. Nothing is persisted.
pub async fn handle_generate_listing(
    State(state): State<AppState>,
    Query(params): Query<GenerateQuery>,
) -> Json<GeneratedListing> {
    let category = params.category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    Json(state.engine.generate_listing(&category).await)
}

/// GET /api/v1/market/generate-user
pub async fn handle_generate_user(State(state): State<AppState>) -> Json<GeneratedUser> {
    Json(state.engine.generate_user().await)
}

/// POST /api/v1/market/price
pub async fn handle_adjust_price(
    State(state): State<AppState>,
    Json(request): Json<PriceRequest>,
) -> Result<Json<PriceResponse>, AppError> {
    if !request.base_price.is_finite() || request.base_price <= 0.0 {
        return Err(AppError::Validation(
            "base_price must be a positive number".to_string(),
        ));
    }

    let adjusted_price = state
        .engine
        .adjusted_price(&request.category, request.base_price);
    Ok(Json(PriceResponse {
        category: request.category,
        base_price: request.base_price,
        adjusted_price,
    }))
}

/// GET /api/v1/market/impact?category=&price=
pub async fn handle_estimate_impact(
    State(state): State<AppState>,
    Query(params): Query<ImpactQuery>,
) -> Result<Json<ImpactMetrics>, AppError> {
    if !params.price.is_finite() || params.price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(Json(state.engine.impact_of(&params.category, params.price)))
}

/// POST /api/v1/market/update-prices?force=
///
/// Runs the price refresh job now. Without `force` it is a no-op when a
/// refresh already ran within the last few minutes.
pub async fn handle_update_prices(
    State(state): State<AppState>,
    Query(params): Query<UpdatePricesQuery>,
) -> Result<Json<UpdatePricesResponse>, AppError> {
    if !params.force && !state.engine.price_refresh_due(Utc::now()) {
        return Ok(Json(UpdatePricesResponse {
            updated: false,
            products_updated: 0,
            last_price_refresh: state.engine.state().last_price_refresh,
            message: "Prices were refreshed recently".to_string(),
        }));
    }

    let report = state
        .scheduler
        .run_now(JobKind::PriceRefresh)
        .await
        .map_err(AppError::from_job_error)?
        .ok_or_else(|| AppError::Conflict("A price refresh is already running".to_string()))?;

    info!("Manual price refresh updated {} products", report.affected);
    Ok(Json(UpdatePricesResponse {
        updated: true,
        products_updated: report.affected,
        last_price_refresh: state.engine.state().last_price_refresh,
        message: format!("Updated {} product prices", report.affected),
    }))
}

/// GET /api/v1/market/scheduler
pub async fn handle_scheduler_status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

/// POST /api/v1/market/scheduler/start
pub async fn handle_scheduler_start(State(state): State<AppState>) -> Json<SchedulerToggleResponse> {
    let changed = state.scheduler.start();
    Json(SchedulerToggleResponse {
        running: state.scheduler.is_running(),
        changed,
    })
}

/// POST /api/v1/market/scheduler/stop
pub async fn handle_scheduler_stop(State(state): State<AppState>) -> Json<SchedulerToggleResponse> {
    let changed = state.scheduler.stop().await;
    Json(SchedulerToggleResponse {
        running: state.scheduler.is_running(),
        changed,
    })
}

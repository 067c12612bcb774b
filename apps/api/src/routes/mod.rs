pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::catalog::handlers as catalog;
use crate::engine::handlers as market;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Catalog API
        .route(
            "/api/v1/products",
            get(catalog::handle_list_products).post(catalog::handle_create_product),
        )
        .route(
            "/api/v1/products/categories",
            get(catalog::handle_list_categories),
        )
        .route("/api/v1/products/:id", get(catalog::handle_get_product))
        .route(
            "/api/v1/products/:id/impact",
            get(catalog::handle_product_impact),
        )
        .route(
            "/api/v1/users/:id/products",
            get(catalog::handle_user_products),
        )
        .route(
            "/api/v1/cart",
            get(catalog::handle_get_cart).post(catalog::handle_add_to_cart),
        )
        .route(
            "/api/v1/purchases",
            get(catalog::handle_list_purchases).post(catalog::handle_checkout),
        )
        // Market API
        .route("/api/v1/market/insights", get(market::handle_market_insights))
        .route("/api/v1/market/trending", get(market::handle_trending))
        .route("/api/v1/market/generate", get(market::handle_generate_listing))
        .route(
            "/api/v1/market/generate-user",
            get(market::handle_generate_user),
        )
        .route("/api/v1/market/price", post(market::handle_adjust_price))
        .route("/api/v1/market/impact", get(market::handle_estimate_impact))
        .route(
            "/api/v1/market/update-prices",
            post(market::handle_update_prices),
        )
        .route(
            "/api/v1/market/scheduler",
            get(market::handle_scheduler_status),
        )
        .route(
            "/api/v1/market/scheduler/start",
            post(market::handle_scheduler_start),
        )
        .route(
            "/api/v1/market/scheduler/stop",
            post(market::handle_scheduler_stop),
        )
        .with_state(state)
}

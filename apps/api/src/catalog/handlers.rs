//! Axum route handlers for the marketplace catalog, cart and purchases.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::queries;
use crate::engine::images::placeholder_image;
use crate::engine::ImpactMetrics;
use crate::errors::AppError;
use crate::models::cart::PurchaseRow;
use crate::models::product::{NewProduct, ProductRow};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductRow>,
    pub categories: Vec<String>,
}

/// Body for listing a product. Omitting `title` asks the engine to generate
/// the whole listing for `category`.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub user_id: i64,
    pub category: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub user_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub products: Vec<ProductRow>,
    pub total: f64,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub purchases: Vec<PurchaseRow>,
}

#[derive(Debug, Serialize)]
pub struct ProductImpactResponse {
    pub product_id: i64,
    pub category: String,
    pub price: f64,
    pub eco_impact: ImpactMetrics,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/products?search=&category=
pub async fn handle_list_products(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    let products = queries::search_products(
        &state.db,
        params.search.as_deref(),
        params.category.as_deref(),
    )
    .await?;
    let categories = queries::list_categories(&state.db).await?;
    Ok(Json(ProductListResponse {
        products,
        categories,
    }))
}

/// GET /api/v1/products/categories
pub async fn handle_list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(queries::list_categories(&state.db).await?))
}

/// GET /api/v1/products/:id
pub async fn handle_get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductRow>, AppError> {
    let product = queries::get_product(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?;
    Ok(Json(product))
}

/// GET /api/v1/products/:id/impact
pub async fn handle_product_impact(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductImpactResponse>, AppError> {
    let product = queries::get_product(&state.db, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?;

    let eco_impact = state.engine.impact_of(&product.category, product.price);
    Ok(Json(ProductImpactResponse {
        product_id,
        category: product.category,
        price: product.price,
        eco_impact,
    }))
}

/// POST /api/v1/products
///
/// Creates a listing owned by `user_id`. Without a title the engine generates
/// title, description, price and image for the category.
pub async fn handle_create_product(
    State(state): State<AppState>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductRow>), AppError> {
    if request.category.trim().is_empty() {
        return Err(AppError::Validation("category cannot be empty".to_string()));
    }
    if !queries::user_exists(&state.db, request.user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", request.user_id)));
    }

    let new_product = match request.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => manual_listing(&request, title)?,
        _ => {
            let listing = state.engine.generate_listing(&request.category).await;
            NewProduct::from_listing(&listing, request.user_id)
        }
    };

    let product = state.catalog.insert_product(&new_product).await?;
    info!(
        "User {} listed product {} in {}",
        product.user_id, product.id, product.category
    );
    Ok((StatusCode::CREATED, Json(product)))
}

fn manual_listing(request: &CreateProductRequest, title: &str) -> Result<NewProduct, AppError> {
    let description = request
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| AppError::Validation("description is required with a title".to_string()))?;

    let price = request
        .price
        .filter(|p| p.is_finite() && *p > 0.0)
        .ok_or_else(|| AppError::Validation("price must be a positive number".to_string()))?;

    let category = request.category.trim();
    let image = request
        .image
        .clone()
        .filter(|i| !i.trim().is_empty())
        .unwrap_or_else(|| placeholder_image(category));

    Ok(NewProduct {
        title: title.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        price,
        image,
        user_id: request.user_id,
    })
}

/// GET /api/v1/users/:id/products
pub async fn handle_user_products(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ProductRow>>, AppError> {
    Ok(Json(queries::list_user_products(&state.db, user_id).await?))
}

/// GET /api/v1/cart?user_id=
pub async fn handle_get_cart(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<CartResponse>, AppError> {
    let products = queries::cart_products(&state.db, params.user_id).await?;
    let total = products.iter().map(|p| p.price).sum::<f64>();
    Ok(Json(CartResponse {
        products,
        total: (total * 100.0).round() / 100.0,
    }))
}

/// POST /api/v1/cart
pub async fn handle_add_to_cart(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<StatusCode, AppError> {
    if queries::get_product(&state.db, request.product_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!(
            "Product {} not found",
            request.product_id
        )));
    }

    queries::add_to_cart(&state.db, request.user_id, request.product_id).await?;
    Ok(StatusCode::CREATED)
}

/// POST /api/v1/purchases
///
/// Moves the whole cart into purchase records atomically.
pub async fn handle_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let purchases = queries::checkout_cart(&state.db, request.user_id).await?;
    Ok(Json(CheckoutResponse { purchases }))
}

/// GET /api/v1/purchases?user_id=
pub async fn handle_list_purchases(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ProductRow>>, AppError> {
    Ok(Json(queries::purchased_products(&state.db, params.user_id).await?))
}

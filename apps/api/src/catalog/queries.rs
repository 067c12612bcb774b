use sqlx::PgPool;
use tracing::info;

use crate::models::cart::{CartItemRow, PurchaseRow};
use crate::models::product::ProductRow;

/// Browse/search the catalog: case-insensitive title match plus exact category.
pub async fn search_products(
    pool: &PgPool,
    search: Option<&str>,
    category: Option<&str>,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    let pattern = search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"));
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT * FROM products
        WHERE ($1::TEXT IS NULL OR title ILIKE $1)
          AND ($2::TEXT IS NULL OR category = $2)
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(pattern)
    .bind(category)
    .fetch_all(pool)
    .await
}

pub async fn list_categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
        .fetch_all(pool)
        .await
}

pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_user_products(pool: &PgPool, user_id: i64) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        "SELECT * FROM products WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn user_exists(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

pub async fn add_to_cart(
    pool: &PgPool,
    user_id: i64,
    product_id: i64,
) -> Result<CartItemRow, sqlx::Error> {
    sqlx::query_as::<_, CartItemRow>(
        "INSERT INTO cart (user_id, product_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await
}

/// Products currently in a user's cart, in the order they were added.
pub async fn cart_products(pool: &PgPool, user_id: i64) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT p.* FROM cart c
        JOIN products p ON p.id = c.product_id
        WHERE c.user_id = $1
        ORDER BY c.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Converts every cart row into a purchase record and empties the cart,
/// all in one transaction. Returns the new purchases.
pub async fn checkout_cart(pool: &PgPool, user_id: i64) -> Result<Vec<PurchaseRow>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let items = sqlx::query_as::<_, CartItemRow>(
        "SELECT * FROM cart WHERE user_id = $1 ORDER BY id FOR UPDATE",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    let mut purchases = Vec::with_capacity(items.len());
    for item in &items {
        let purchase = sqlx::query_as::<_, PurchaseRow>(
            "INSERT INTO purchases (user_id, product_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(item.product_id)
        .fetch_one(&mut *tx)
        .await?;
        purchases.push(purchase);
    }

    sqlx::query("DELETE FROM cart WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("User {user_id} purchased {} items", purchases.len());
    Ok(purchases)
}

pub async fn purchased_products(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT p.* FROM purchases pu
        JOIN products p ON p.id = pu.product_id
        WHERE pu.user_id = $1
        ORDER BY pu.created_at DESC, pu.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

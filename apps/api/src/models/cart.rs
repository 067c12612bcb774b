use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartItemRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PurchaseRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
}

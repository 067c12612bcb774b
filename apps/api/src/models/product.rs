use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::engine::GeneratedListing;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for the products table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub image: String,
    pub user_id: i64,
}

impl NewProduct {
    /// Copies the persistable fields of a generated listing for `owner_id`.
    pub fn from_listing(listing: &GeneratedListing, owner_id: i64) -> Self {
        Self {
            title: listing.title.clone(),
            description: listing.description.clone(),
            category: listing.category.clone(),
            price: listing.price,
            image: listing.image.clone(),
            user_id: owner_id,
        }
    }
}

//! Demo data seeding: generated members, engine listings, carts and a
//! backdated purchase history, written through `CatalogStore`.
//!
//! Seeding appends to whatever is already in the catalog.

use std::collections::HashSet;

use anyhow::{bail, Result};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::catalog::CatalogStore;
use crate::engine::MarketEngine;
use crate::models::product::ProductRow;
use crate::models::user::{NewUser, UserRow};
use crate::scheduler::jobs::{list_generated_product, regenerate_product};

#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub users: usize,
    pub products: usize,
    /// The first `cart_users` members get cart contents.
    pub cart_users: usize,
    pub cart_items_per_user: (usize, usize),
    /// The first `purchase_users` members get a purchase history.
    pub purchase_users: usize,
    pub purchases_per_user: (usize, usize),
    pub purchase_window_days: i64,
    /// Share of seeded products regenerated once more after insertion.
    pub refresh_probability: f64,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: 8,
            products: 35,
            cart_users: 3,
            cart_items_per_user: (1, 4),
            purchase_users: 4,
            purchases_per_user: (2, 6),
            purchase_window_days: 90,
            refresh_probability: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub products: usize,
    pub cart_items: usize,
    pub purchases: usize,
    pub refreshed: usize,
    pub categories: usize,
    pub trending: Vec<String>,
}

pub async fn seed_marketplace(
    engine: &MarketEngine,
    store: &dyn CatalogStore,
    plan: &SeedPlan,
) -> Result<SeedReport> {
    if plan.users == 0 && plan.products > 0 {
        bail!("seeding products needs at least one user to own them");
    }
    if !(0.0..=1.0).contains(&plan.refresh_probability) {
        bail!("refresh probability must be within 0..=1");
    }

    let users = create_users(engine, store, plan.users).await?;
    info!("Created {} users", users.len());

    let mut products = create_products(engine, store, &users, plan.products).await?;
    info!("Created {} products", products.len());

    let cart_items = create_cart_items(store, &users, &products, plan).await?;
    info!("Created {cart_items} cart items");

    let purchases = create_purchases(store, &users, &products, plan).await?;
    info!("Created {purchases} purchases");

    let refreshed =
        refresh_seeded_products(engine, store, &mut products, plan.refresh_probability).await?;
    info!("Refreshed {refreshed} seeded products");

    let insights = engine.market_insights();
    info!(
        "Market: trending {}, {} new listings today, {} kg CO2 saved, {} items recycled, {} active users",
        insights.trending_categories.join(", "),
        insights.new_listings_today,
        insights.eco_impact_total.co2_saved,
        insights.eco_impact_total.items_recycled,
        insights.eco_impact_total.users_active
    );

    let categories = products
        .iter()
        .map(|p| p.category.as_str())
        .collect::<HashSet<_>>()
        .len();

    Ok(SeedReport {
        users: users.len(),
        products: products.len(),
        cart_items,
        purchases,
        refreshed,
        categories,
        trending: engine.trending_categories(),
    })
}

/// Inserts `count` generated members with unique usernames.
pub async fn create_users(
    engine: &MarketEngine,
    store: &dyn CatalogStore,
    count: usize,
) -> Result<Vec<UserRow>> {
    let mut taken = HashSet::new();
    let mut rows = Vec::with_capacity(count);

    for n in 0..count {
        let mut profile = engine.generate_user().await;
        if taken.contains(&profile.username) {
            profile.disambiguate(n);
        }
        taken.insert(profile.username.clone());

        rows.push(store.insert_user(&NewUser::from_profile(&profile)).await?);
    }
    Ok(rows)
}

pub async fn create_products(
    engine: &MarketEngine,
    store: &dyn CatalogStore,
    owners: &[UserRow],
    count: usize,
) -> Result<Vec<ProductRow>> {
    let mut rng = StdRng::from_entropy();
    let mut products = Vec::with_capacity(count);

    for n in 1..=count {
        products.push(list_generated_product(engine, store, owners, &mut rng).await?);
        if n % 10 == 0 {
            info!("Generated {n}/{count} products");
        }
    }
    Ok(products)
}

pub async fn create_cart_items(
    store: &dyn CatalogStore,
    users: &[UserRow],
    products: &[ProductRow],
    plan: &SeedPlan,
) -> Result<usize> {
    let picks = pick_products(users, products, plan.cart_users, plan.cart_items_per_user);
    for (user_id, product_id) in &picks {
        store.add_cart_item(*user_id, *product_id).await?;
    }
    Ok(picks.len())
}

pub async fn create_purchases(
    store: &dyn CatalogStore,
    users: &[UserRow],
    products: &[ProductRow],
    plan: &SeedPlan,
) -> Result<usize> {
    let picks = pick_products(users, products, plan.purchase_users, plan.purchases_per_user);
    let window = plan.purchase_window_days.max(1);

    let mut rng = StdRng::from_entropy();
    for (user_id, product_id) in &picks {
        let purchased_at = Utc::now() - Duration::days(rng.gen_range(1..=window));
        store
            .insert_purchase(*user_id, *product_id, purchased_at)
            .await?;
    }
    Ok(picks.len())
}

/// Regenerates roughly `probability` of the seeded products in place.
pub async fn refresh_seeded_products(
    engine: &MarketEngine,
    store: &dyn CatalogStore,
    products: &mut [ProductRow],
    probability: f64,
) -> Result<usize> {
    let mut rng = StdRng::from_entropy();
    let mut refreshed = 0;

    for product in products.iter_mut() {
        if !rng.gen_bool(probability) {
            continue;
        }
        regenerate_product(engine, product).await;
        store.update_product(product).await?;
        refreshed += 1;
    }
    Ok(refreshed)
}

/// Distinct random products for each of the first `user_count` members.
fn pick_products(
    users: &[UserRow],
    products: &[ProductRow],
    user_count: usize,
    per_user: (usize, usize),
) -> Vec<(i64, i64)> {
    let mut rng = rand::thread_rng();
    let (low, high) = (per_user.0.min(per_user.1), per_user.0.max(per_user.1));

    let mut picks = Vec::new();
    for user in users.iter().take(user_count) {
        let amount = rng.gen_range(low..=high).min(products.len());
        picks.extend(
            products
                .choose_multiple(&mut rng, amount)
                .map(|product| (user.id, product.id)),
        );
    }
    picks
}

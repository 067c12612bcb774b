//! The five recurring market mutation jobs.
//!
//! Each job reads the catalog through `CatalogStore`, asks the engine for new
//! values and writes them back. Store errors propagate to the caller (the
//! scheduler logs them; the manual price refresh endpoint returns them).

use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::catalog::CatalogStore;
use crate::engine::sampler::{sample_availability, Availability};
use crate::engine::taxonomy::CATEGORIES;
use crate::engine::MarketEngine;
use crate::models::product::{NewProduct, ProductRow};
use crate::models::user::UserRow;

pub const PRICE_UPDATE_PROBABILITY: f64 = 0.2;
pub const AVAILABILITY_UPDATE_PROBABILITY: f64 = 0.15;
pub const NEW_LISTINGS_PER_RUN: (usize, usize) = (1, 3);
pub const FULL_UPDATE_SAMPLE_SIZE: usize = 5;
pub const AVAILABILITY_MARKER: &str = "Availability:";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    PriceRefresh,
    AvailabilityRefresh,
    NewListings,
    TrendingRefresh,
    FullMarketUpdate,
}

impl JobKind {
    pub const ALL: [JobKind; 5] = [
        JobKind::PriceRefresh,
        JobKind::AvailabilityRefresh,
        JobKind::NewListings,
        JobKind::TrendingRefresh,
        JobKind::FullMarketUpdate,
    ];

    pub fn period(&self) -> Duration {
        let minutes = match self {
            JobKind::PriceRefresh => 5,
            JobKind::AvailabilityRefresh => 10,
            JobKind::NewListings => 15,
            JobKind::TrendingRefresh => 30,
            JobKind::FullMarketUpdate => 60,
        };
        Duration::from_secs(minutes * 60)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobKind::PriceRefresh => "price refresh",
            JobKind::AvailabilityRefresh => "availability refresh",
            JobKind::NewListings => "new listings",
            JobKind::TrendingRefresh => "trending refresh",
            JobKind::FullMarketUpdate => "full market update",
        }
    }
}

/// Outcome of one job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub job: JobKind,
    /// Catalog rows written (or categories selected, for trending).
    pub affected: usize,
    pub detail: Option<String>,
}

pub async fn run_job(kind: JobKind, engine: &MarketEngine, store: &dyn CatalogStore) -> Result<JobReport> {
    match kind {
        JobKind::PriceRefresh => refresh_prices(engine, store).await,
        JobKind::AvailabilityRefresh => refresh_availability(store).await,
        JobKind::NewListings => add_new_listings(engine, store).await,
        JobKind::TrendingRefresh => Ok(refresh_trending(engine)),
        JobKind::FullMarketUpdate => full_market_update(engine, store).await,
    }
}

/// Reprices roughly one in five products.
pub async fn refresh_prices(engine: &MarketEngine, store: &dyn CatalogStore) -> Result<JobReport> {
    let products = store.list_products().await?;
    let mut rng = StdRng::from_entropy();

    let repriced: Vec<ProductRow> = products
        .into_iter()
        .filter(|_| rng.gen_bool(PRICE_UPDATE_PROBABILITY))
        .map(|mut product| {
            product.price = engine.adjusted_price(&product.category, product.price);
            product
        })
        .collect();

    for product in &repriced {
        store.update_product(product).await?;
    }
    engine.record_price_refresh(Utc::now());

    if !repriced.is_empty() {
        info!("Updated {} product prices", repriced.len());
    }
    Ok(JobReport {
        job: JobKind::PriceRefresh,
        affected: repriced.len(),
        detail: None,
    })
}

/// Resamples availability for roughly 15% of products and records it in the
/// description's marker line.
pub async fn refresh_availability(store: &dyn CatalogStore) -> Result<JobReport> {
    let products = store.list_products().await?;
    let mut rng = StdRng::from_entropy();

    let mut changed: Vec<ProductRow> = Vec::new();
    for mut product in products {
        if !rng.gen_bool(AVAILABILITY_UPDATE_PROBABILITY) {
            continue;
        }
        let status = sample_availability(&mut rng);
        product.description = apply_availability_marker(&product.description, status);
        changed.push(product);
    }

    for product in &changed {
        store.update_product(product).await?;
    }

    if !changed.is_empty() {
        info!("Updated {} product availability markers", changed.len());
    }
    Ok(JobReport {
        job: JobKind::AvailabilityRefresh,
        affected: changed.len(),
        detail: None,
    })
}

/// Replaces the first line starting with the availability marker, or appends
/// a new marker paragraph when there is none.
pub fn apply_availability_marker(description: &str, status: Availability) -> String {
    let marker_line = format!("{AVAILABILITY_MARKER} {status}");

    if !description
        .lines()
        .any(|line| line.starts_with(AVAILABILITY_MARKER))
    {
        return format!("{description}\n\n{marker_line}");
    }

    let mut replaced = false;
    description
        .split('\n')
        .map(|line| {
            if !replaced && line.starts_with(AVAILABILITY_MARKER) {
                replaced = true;
                marker_line.clone()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generates one to three listings in random categories for random owners.
pub async fn add_new_listings(engine: &MarketEngine, store: &dyn CatalogStore) -> Result<JobReport> {
    let users = store.list_users().await?;
    if users.is_empty() {
        info!("No users available to own new listings; skipping");
        return Ok(JobReport {
            job: JobKind::NewListings,
            affected: 0,
            detail: Some("no users".to_string()),
        });
    }

    let mut rng = StdRng::from_entropy();
    let count = rng.gen_range(NEW_LISTINGS_PER_RUN.0..=NEW_LISTINGS_PER_RUN.1);

    for _ in 0..count {
        let product = list_generated_product(engine, store, &users, &mut rng).await?;
        info!(
            "Listed '{}' ({}) for user {}",
            product.title, product.category, product.user_id
        );
    }

    Ok(JobReport {
        job: JobKind::NewListings,
        affected: count,
        detail: None,
    })
}

/// Generates a listing in a random category and inserts it for a random owner.
pub async fn list_generated_product<R: Rng + Send>(
    engine: &MarketEngine,
    store: &dyn CatalogStore,
    owners: &[UserRow],
    rng: &mut R,
) -> Result<ProductRow> {
    let category = CATEGORIES
        .choose(rng)
        .map(|c| c.name)
        .ok_or_else(|| anyhow!("category taxonomy is empty"))?;
    let owner = owners
        .choose(rng)
        .map(|u| u.id)
        .ok_or_else(|| anyhow!("no owners to list for"))?;

    let listing = engine.generate_listing(category).await;
    let product = store
        .insert_product(&NewProduct::from_listing(&listing, owner))
        .await?;
    Ok(product)
}

pub fn refresh_trending(engine: &MarketEngine) -> JobReport {
    let trending = engine.refresh_trending();
    info!("Trending categories: {}", trending.join(", "));
    JobReport {
        job: JobKind::TrendingRefresh,
        affected: trending.len(),
        detail: Some(trending.join(", ")),
    }
}

/// Regenerates copy, price and image for a small random sample of products.
pub async fn full_market_update(engine: &MarketEngine, store: &dyn CatalogStore) -> Result<JobReport> {
    let insights = engine.market_insights();
    let products = store.list_products().await?;

    let sample: Vec<ProductRow> = {
        let mut rng = StdRng::from_entropy();
        products
            .choose_multiple(&mut rng, FULL_UPDATE_SAMPLE_SIZE)
            .cloned()
            .collect()
    };

    for mut product in sample.iter().cloned() {
        regenerate_product(engine, &mut product).await;
        store.update_product(&product).await?;
    }

    info!(
        "Full market update refreshed {} products (new listings today: {}, CO2 saved: {} kg)",
        sample.len(),
        insights.new_listings_today,
        insights.eco_impact_total.co2_saved
    );
    Ok(JobReport {
        job: JobKind::FullMarketUpdate,
        affected: sample.len(),
        detail: Some(format!("trending: {}", insights.trending_categories.join(", "))),
    })
}

/// Replaces title, description, price and image with a fresh listing for the
/// product's own category. Owner, id and category stay put.
pub async fn regenerate_product(engine: &MarketEngine, product: &mut ProductRow) {
    let listing = engine.generate_listing(&product.category).await;
    product.title = listing.title;
    product.description = listing.description;
    product.price = listing.price;
    product.image = listing.image;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::store::memory::MemoryCatalog;
    use std::sync::atomic::Ordering;

    fn seeded_catalog(products: usize) -> MemoryCatalog {
        let catalog = MemoryCatalog::with_users(3);
        for i in 0..products {
            let category = CATEGORIES[i % CATEGORIES.len()].name;
            catalog.seed_product(category, 40.0 + i as f64, 1 + (i as i64 % 3));
        }
        catalog
    }

    #[test]
    fn test_marker_appended_when_absent() {
        let result = apply_availability_marker("Solid oak table.", Availability::AlmostGone);
        assert_eq!(result, "Solid oak table.\n\nAvailability: Almost Gone");
    }

    #[test]
    fn test_marker_replaced_in_place() {
        let description = "Solid oak table.\n\nAvailability: In Stock\nCollection only.";
        let result = apply_availability_marker(description, Availability::LimitedStock);
        assert_eq!(
            result,
            "Solid oak table.\n\nAvailability: Limited Stock\nCollection only."
        );
    }

    #[test]
    fn test_marker_update_is_idempotent_in_line_count() {
        let mut description = "Lamp.".to_string();
        for _ in 0..5 {
            description = apply_availability_marker(&description, Availability::NewArrival);
        }
        assert_eq!(description.matches(AVAILABILITY_MARKER).count(), 1);
    }

    #[test]
    fn test_job_periods() {
        assert_eq!(JobKind::PriceRefresh.period(), Duration::from_secs(300));
        assert_eq!(JobKind::FullMarketUpdate.period(), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_price_refresh_only_touches_prices() {
        let engine = MarketEngine::new(None);
        let catalog = seeded_catalog(200);
        let before = catalog.snapshot();

        let report = refresh_prices(&engine, &catalog).await.unwrap();
        let after = catalog.snapshot();

        let changed = before
            .iter()
            .zip(&after)
            .filter(|(b, a)| b.price != a.price)
            .count();
        assert!(changed <= report.affected);
        assert!(report.affected < 200);
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.title, a.title);
            assert!(a.price > 0.0);
        }
        assert!(engine.state().last_price_refresh.is_some());
    }

    #[tokio::test]
    async fn test_availability_refresh_marks_descriptions() {
        let catalog = seeded_catalog(200);
        let report = refresh_availability(&catalog).await.unwrap();

        let marked = catalog
            .snapshot()
            .iter()
            .filter(|p| p.description.contains(AVAILABILITY_MARKER))
            .count();
        assert_eq!(marked, report.affected);
    }

    #[tokio::test]
    async fn test_new_listings_are_owned_by_existing_users() {
        let engine = MarketEngine::new(None);
        let catalog = seeded_catalog(0);

        let report = add_new_listings(&engine, &catalog).await.unwrap();
        let products = catalog.snapshot();

        assert!((1..=3).contains(&report.affected));
        assert_eq!(products.len(), report.affected);
        for product in products {
            assert!((1..=3).contains(&product.user_id));
            assert!(CATEGORIES.iter().any(|c| c.name == product.category));
        }
    }

    #[tokio::test]
    async fn test_new_listings_skip_without_users() {
        let engine = MarketEngine::new(None);
        let catalog = MemoryCatalog::default();
        let report = add_new_listings(&engine, &catalog).await.unwrap();
        assert_eq!(report.affected, 0);
        assert!(catalog.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_full_update_touches_at_most_five() {
        let engine = MarketEngine::new(None);
        let catalog = seeded_catalog(12);
        let before = catalog.snapshot();

        let report = full_market_update(&engine, &catalog).await.unwrap();
        let after = catalog.snapshot();

        assert_eq!(report.affected, FULL_UPDATE_SAMPLE_SIZE);
        let retitled = before.iter().zip(&after).filter(|(b, a)| b.title != a.title).count();
        assert_eq!(retitled, FULL_UPDATE_SAMPLE_SIZE);
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.category, a.category);
            assert_eq!(b.user_id, a.user_id);
        }
    }

    #[tokio::test]
    async fn test_full_update_on_small_catalog() {
        let engine = MarketEngine::new(None);
        let catalog = seeded_catalog(2);
        let report = full_market_update(&engine, &catalog).await.unwrap();
        assert_eq!(report.affected, 2);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let engine = MarketEngine::new(None);
        let catalog = seeded_catalog(4);
        catalog.fail_writes.store(true, Ordering::SeqCst);

        let err = full_market_update(&engine, &catalog).await.unwrap_err();
        assert!(err.downcast_ref::<sqlx::Error>().is_some());
    }

    #[test]
    fn test_trending_refresh_reports_categories() {
        let engine = MarketEngine::new(None);
        let report = refresh_trending(&engine);
        assert!(report.affected > 0);
        assert_eq!(engine.trending_categories().len(), report.affected);
    }
}

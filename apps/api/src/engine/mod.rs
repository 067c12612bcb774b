// Dynamic marketplace data engine.
// Synthesizes listings, prices them against simulated market conditions and
// keeps the shared image cache and trending snapshot used by the mutator.

pub mod content;
pub mod handlers;
pub mod images;
pub mod impact;
pub mod pricing;
pub mod sampler;
pub mod taxonomy;
pub mod templates;
pub mod users;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Local, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::info;

use crate::image_search::ImageSearch;

pub use content::{ContentGenerator, GeneratedListing};
pub use images::ImageResolver;
pub use impact::ImpactMetrics;
pub use users::GeneratedUser;

/// Minimum spacing between non-forced manual price refreshes.
pub const PRICE_REFRESH_INTERVAL_MINUTES: i64 = 5;

/// Aggregate eco-impact figures shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ImpactTotals {
    pub co2_saved: u32,
    pub items_recycled: u32,
    pub users_active: u32,
}

/// Point-in-time market snapshot. Recomputed on every request.
#[derive(Debug, Clone, Serialize)]
pub struct MarketInsights {
    pub trending_categories: Vec<String>,
    pub average_price_change: f64,
    pub new_listings_today: u32,
    pub eco_impact_total: ImpactTotals,
    pub last_updated: DateTime<Utc>,
}

/// Mutable engine state shared by request handlers and the mutator.
/// Lost updates are acceptable; nothing here is correctness-critical.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MarketState {
    pub trending: Vec<String>,
    pub last_trending_refresh: Option<DateTime<Utc>>,
    pub last_price_refresh: Option<DateTime<Utc>>,
}

pub struct MarketEngine {
    generator: ContentGenerator,
    state: Mutex<MarketState>,
}

impl MarketEngine {
    /// `image_search = None` runs the engine fully offline.
    pub fn new(image_search: Option<Arc<dyn ImageSearch>>) -> Self {
        Self {
            generator: ContentGenerator::new(ImageResolver::new(image_search)),
            state: Mutex::new(MarketState::default()),
        }
    }

    pub async fn generate_listing(&self, category: &str) -> GeneratedListing {
        self.generator.generate(category).await
    }

    /// Member profile with a resolved avatar.
    pub async fn generate_user(&self) -> GeneratedUser {
        let mut rng = StdRng::from_entropy();
        let mut profile = users::user_profile(Local::now().date_naive(), &mut rng);
        profile.avatar = self
            .generator
            .images()
            .resolve_avatar(&profile.username, &mut rng)
            .await;
        profile
    }

    pub fn adjusted_price(&self, category: &str, base_price: f64) -> f64 {
        pricing::adjust_price(category, base_price, &mut rand::thread_rng())
    }

    pub fn impact_of(&self, category: &str, price: f64) -> ImpactMetrics {
        impact::estimate_impact(category, price, &mut rand::thread_rng())
    }

    /// The trending set from the last refresh, sampling one on first use.
    pub fn trending_categories(&self) -> Vec<String> {
        let cached = self.lock_state().trending.clone();
        if cached.is_empty() {
            self.refresh_trending()
        } else {
            cached
        }
    }

    /// Resamples the trending set and trims the image cache.
    pub fn refresh_trending(&self) -> Vec<String> {
        let trending = sampler::sample_trending(&mut rand::thread_rng());
        {
            let mut state = self.lock_state();
            state.trending = trending.clone();
            state.last_trending_refresh = Some(Utc::now());
        }

        let evicted = self.generator.images().cache().trim();
        if evicted > 0 {
            info!("Trimmed {evicted} entries from the image cache");
        }
        trending
    }

    /// Fresh snapshot, trending set included. Does not touch the cached set.
    pub fn market_insights(&self) -> MarketInsights {
        let mut rng = rand::thread_rng();
        MarketInsights {
            trending_categories: sampler::sample_trending(&mut rng),
            average_price_change: rng.gen_range(-0.05..=0.05),
            new_listings_today: rng.gen_range(5..=25),
            eco_impact_total: ImpactTotals {
                co2_saved: rng.gen_range(1000..=5000),
                items_recycled: rng.gen_range(500..=2000),
                users_active: rng.gen_range(50..=200),
            },
            last_updated: Utc::now(),
        }
    }

    /// True when no price refresh has run in the last few minutes.
    pub fn price_refresh_due(&self, now: DateTime<Utc>) -> bool {
        match self.lock_state().last_price_refresh {
            Some(last) => now - last >= Duration::minutes(PRICE_REFRESH_INTERVAL_MINUTES),
            None => true,
        }
    }

    pub fn record_price_refresh(&self, at: DateTime<Utc>) {
        self.lock_state().last_price_refresh = Some(at);
    }

    pub fn state(&self) -> MarketState {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, MarketState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_is_cached_until_refresh() {
        let engine = MarketEngine::new(None);
        let first = engine.trending_categories();
        assert!(!first.is_empty());
        assert_eq!(engine.trending_categories(), first);
        assert!(engine.state().last_trending_refresh.is_some());
    }

    #[test]
    fn test_insights_do_not_replace_cached_trending() {
        let engine = MarketEngine::new(None);
        let cached = engine.trending_categories();
        let refreshed_at = engine.state().last_trending_refresh;
        for _ in 0..20 {
            let insights = engine.market_insights();
            assert!(!insights.trending_categories.is_empty());
        }
        assert_eq!(engine.trending_categories(), cached);
        assert_eq!(engine.state().last_trending_refresh, refreshed_at);
    }

    #[test]
    fn test_insights_resample_trending_per_call() {
        let engine = MarketEngine::new(None);
        let distinct: std::collections::HashSet<Vec<String>> = (0..50)
            .map(|_| engine.market_insights().trending_categories)
            .collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_insights_ranges() {
        let engine = MarketEngine::new(None);
        let insights = engine.market_insights();
        assert!(!insights.trending_categories.is_empty());
        assert!((-0.05..=0.05).contains(&insights.average_price_change));
        assert!((5..=25).contains(&insights.new_listings_today));
        assert!((1000..=5000).contains(&insights.eco_impact_total.co2_saved));
    }

    #[test]
    fn test_price_refresh_timestamp_gate() {
        let engine = MarketEngine::new(None);
        let now = Utc::now();
        assert!(engine.price_refresh_due(now));

        engine.record_price_refresh(now);
        assert!(!engine.price_refresh_due(now + Duration::minutes(2)));
        assert!(engine.price_refresh_due(now + Duration::minutes(5)));
    }

    #[test]
    fn test_adjusted_price_and_impact_facade() {
        let engine = MarketEngine::new(None);
        assert!(engine.adjusted_price("Furniture", 120.0) > 0.0);
        let impact = engine.impact_of("Furniture", 120.0);
        assert!((impact.water_saved - impact.co2_saved * 0.5).abs() < 0.011);
    }

    #[tokio::test]
    async fn test_generate_user_has_avatar() {
        let engine = MarketEngine::new(None);
        let user = engine.generate_user().await;
        assert!(!user.avatar.is_empty());
        assert!(user.email.ends_with("@ecofinds.com"));
    }

    #[tokio::test]
    async fn test_generate_listing_facade() {
        let engine = MarketEngine::new(None);
        let listing = engine.generate_listing("Toys").await;
        assert_eq!(listing.category, "Toys");
    }
}

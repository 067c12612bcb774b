use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::pricing::round_cents;
use crate::engine::taxonomy::profile_or_default;

pub const WATER_RATIO: f64 = 0.5;
pub const WASTE_RATIO: f64 = 0.3;
pub const RENEWABLE_RATIO: f64 = 0.8;
/// Price-based scaling caps at 3× the category baseline.
const MAX_PRICE_FACTOR: f64 = 3.0;

/// Environmental-benefit estimate attached to a listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImpactMetrics {
    pub co2_saved: f64,
    pub water_saved: f64,
    pub waste_diverted: f64,
    pub renewable_energy: f64,
}

impl ImpactMetrics {
    /// Derives the fixed-ratio metrics from a CO2 figure.
    pub fn from_co2(co2_saved: f64) -> Self {
        let co2_saved = round_cents(co2_saved.max(0.0));
        Self {
            co2_saved,
            water_saved: round_cents(co2_saved * WATER_RATIO),
            waste_diverted: round_cents(co2_saved * WASTE_RATIO),
            renewable_energy: round_cents(co2_saved * RENEWABLE_RATIO),
        }
    }
}

/// Estimates impact for an item of `category` sold at `price`.
///
/// One random draw picks the category's base CO2 savings; the price scales it
/// linearly (per 100 currency units) up to the cap. Unknown categories use the
/// baseline profile.
pub fn estimate_impact<R: Rng + ?Sized>(category: &str, price: f64, rng: &mut R) -> ImpactMetrics {
    let (low, high) = profile_or_default(category).co2_range;
    let base_co2 = rng.gen_range(low..=high);

    let price_factor = if price.is_finite() {
        (price / 100.0).clamp(0.0, MAX_PRICE_FACTOR)
    } else {
        0.0
    };

    ImpactMetrics::from_co2(base_co2 * price_factor)
}

//! Pricing model: perturbs a base price according to simulated market conditions.
//!
//! Multiplier composition:
//! 1. market swing: U[0.8, 1.3]
//! 2. high-demand categories: × U[0.9, 1.2]
//! 3. weekend: × 1.1
//! 4. seasonal apparel in shoulder months (Mar, Apr, Sep, Oct): × 1.15
//!
//! Every call is an independent draw. Callers needing a stable price cache it.

use chrono::{Datelike, Local, NaiveDate, Weekday};
use rand::Rng;
use tracing::warn;

use crate::engine::taxonomy::{
    profile_or_default, HIGH_DEMAND_CATEGORIES, SEASONAL_APPAREL_CATEGORIES,
};

pub const MARKET_SWING: (f64, f64) = (0.8, 1.3);
pub const DEMAND_SWING: (f64, f64) = (0.9, 1.2);
pub const WEEKEND_MULTIPLIER: f64 = 1.1;
pub const SEASONAL_MULTIPLIER: f64 = 1.15;
pub const SHOULDER_MONTHS: [u32; 4] = [3, 4, 9, 10];
/// Floor returned when even the base price is unusable.
pub const MIN_PRICE: f64 = 0.01;

/// Adjusts `base_price` using today's local date.
pub fn adjust_price<R: Rng + ?Sized>(category: &str, base_price: f64, rng: &mut R) -> f64 {
    adjust_price_on(category, base_price, Local::now().date_naive(), rng)
}

/// Adjusts `base_price` as if the market were running on `date`.
///
/// Unknown categories are priced as the baseline category. Never fails and
/// never returns a non-positive price: a broken result falls back to the base
/// price, and a broken base price falls back to `MIN_PRICE`.
pub fn adjust_price_on<R: Rng + ?Sized>(
    category: &str,
    base_price: f64,
    date: NaiveDate,
    rng: &mut R,
) -> f64 {
    if !base_price.is_finite() || base_price <= 0.0 {
        warn!("Refusing to price non-positive base {base_price} for {category}");
        return MIN_PRICE;
    }

    let category = profile_or_default(category).name;
    let multiplier = market_multiplier(category, date, rng);
    let adjusted = round_cents(base_price * multiplier);

    if adjusted.is_finite() && adjusted > 0.0 {
        adjusted
    } else {
        warn!("Pricing produced {adjusted} for {category} (base {base_price}); keeping base");
        base_price
    }
}

fn market_multiplier<R: Rng + ?Sized>(category: &str, date: NaiveDate, rng: &mut R) -> f64 {
    let mut multiplier = rng.gen_range(MARKET_SWING.0..=MARKET_SWING.1);

    if HIGH_DEMAND_CATEGORIES.contains(&category) {
        multiplier *= rng.gen_range(DEMAND_SWING.0..=DEMAND_SWING.1);
    }

    if is_weekend(date) {
        multiplier *= WEEKEND_MULTIPLIER;
    }

    if SEASONAL_APPAREL_CATEGORIES.contains(&category) && SHOULDER_MONTHS.contains(&date.month())
    {
        multiplier *= SEASONAL_MULTIPLIER;
    }

    multiplier
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::taxonomy::CATEGORIES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn saturday_in_april() -> NaiveDate {
        // 2024-04-13 was a Saturday
        NaiveDate::from_ymd_opt(2024, 4, 13).unwrap()
    }

    fn tuesday_in_july() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 16).unwrap()
    }

    #[test]
    fn test_clothing_shoulder_season_weekend_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let lower = 50.0 * 0.8 * 0.9 * 1.1 * 1.15;
        let upper = 50.0 * 1.3 * 1.2 * 1.1 * 1.15;
        for _ in 0..5_000 {
            let price = adjust_price_on("Clothing", 50.0, saturday_in_april(), &mut rng);
            // rounding to cents can move the value by at most half a cent
            assert!(price >= lower - 0.005, "{price} below {lower}");
            assert!(price <= upper + 0.005, "{price} above {upper}");
        }
    }

    #[test]
    fn test_plain_weekday_stays_in_market_swing() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..2_000 {
            let price = adjust_price_on("Books", 100.0, tuesday_in_july(), &mut rng);
            assert!((80.0..=130.0).contains(&price), "{price}");
        }
    }

    #[test]
    fn test_price_always_positive_for_every_category() {
        let mut rng = StdRng::seed_from_u64(3);
        for profile in CATEGORIES {
            for base in [0.01, 0.5, 9.99, 250.0, 1_999.0] {
                let price = adjust_price(profile.name, base, &mut rng);
                assert!(price > 0.0, "{} at {base} gave {price}", profile.name);
            }
        }
        assert!(adjust_price("Unknown", 42.0, &mut rng) > 0.0);
    }

    #[test]
    fn test_unknown_category_priced_as_baseline() {
        let mut rng = StdRng::seed_from_u64(19);
        let lower = 50.0 * 0.8 * 0.9 * 1.1 * 1.15 - 0.005;
        for _ in 0..1_000 {
            // Clothing's seasonal and weekend multipliers apply
            let price = adjust_price_on("Vinyl", 50.0, saturday_in_april(), &mut rng);
            assert!(price >= lower, "{price}");
        }
    }

    #[test]
    fn test_tiny_base_that_rounds_to_zero_keeps_base() {
        let mut rng = StdRng::seed_from_u64(5);
        let price = adjust_price_on("Books", 0.001, tuesday_in_july(), &mut rng);
        assert_eq!(price, 0.001);
    }

    #[test]
    fn test_invalid_base_returns_floor() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(adjust_price("Books", 0.0, &mut rng), MIN_PRICE);
        assert_eq!(adjust_price("Books", -10.0, &mut rng), MIN_PRICE);
        assert_eq!(adjust_price("Books", f64::NAN, &mut rng), MIN_PRICE);
    }

    #[test]
    fn test_result_is_rounded_to_cents() {
        let mut rng = StdRng::seed_from_u64(9);
        let price = adjust_price_on("Sports", 33.333, tuesday_in_july(), &mut rng);
        assert!(((price * 100.0).round() - price * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_weekend_detection() {
        assert!(is_weekend(saturday_in_april()));
        assert!(!is_weekend(tuesday_in_july()));
    }
}

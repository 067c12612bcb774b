//! Catalog taxonomy: the fixed set of categories the marketplace engine knows about.
//!
//! Every other engine component keys off these profiles. Unknown category names
//! resolve to the baseline profile (`Clothing`) rather than failing.

use serde::Serialize;

/// Static configuration for one product category.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CategoryProfile {
    pub name: &'static str,
    /// Ordered, never empty. The first two feed the default image query.
    pub keywords: &'static [&'static str],
    pub price_range: (f64, f64),
    pub trending: bool,
    /// Per-category CO2 savings range (kg) used by the impact estimator.
    pub co2_range: (f64, f64),
}

pub const DEFAULT_CATEGORY: &str = "Clothing";

/// Categories that demand an extra demand multiplier in the pricing model.
pub const HIGH_DEMAND_CATEGORIES: &[&str] = &["Electronics", "Clothing"];

/// Categories sensitive to spring/autumn wardrobe turnover.
pub const SEASONAL_APPAREL_CATEGORIES: &[&str] = &["Clothing"];

pub static CATEGORIES: &[CategoryProfile] = &[
    CategoryProfile {
        name: "Electronics",
        keywords: &["sustainable", "eco-friendly", "recycled", "energy-efficient"],
        price_range: (50.0, 2000.0),
        trending: true,
        co2_range: (50.0, 200.0),
    },
    CategoryProfile {
        name: "Clothing",
        keywords: &["vintage", "organic", "sustainable", "ethical", "second-hand"],
        price_range: (10.0, 500.0),
        trending: true,
        co2_range: (10.0, 50.0),
    },
    CategoryProfile {
        name: "Home & Garden",
        keywords: &["bamboo", "organic", "eco-friendly", "sustainable", "zero-waste"],
        price_range: (5.0, 300.0),
        trending: false,
        co2_range: (5.0, 30.0),
    },
    CategoryProfile {
        name: "Books",
        keywords: &["sustainability", "environment", "zero-waste", "eco-living"],
        price_range: (5.0, 50.0),
        trending: false,
        co2_range: (1.0, 10.0),
    },
    CategoryProfile {
        name: "Sports",
        keywords: &["eco-friendly", "sustainable", "outdoor", "fitness"],
        price_range: (20.0, 400.0),
        trending: true,
        co2_range: (15.0, 60.0),
    },
    CategoryProfile {
        name: "Beauty",
        keywords: &["organic", "natural", "cruelty-free", "sustainable"],
        price_range: (5.0, 100.0),
        trending: true,
        co2_range: (2.0, 15.0),
    },
    CategoryProfile {
        name: "Furniture",
        keywords: &["vintage", "recycled", "sustainable", "upcycled"],
        price_range: (50.0, 1500.0),
        trending: false,
        co2_range: (30.0, 150.0),
    },
    CategoryProfile {
        name: "Toys",
        keywords: &["wooden", "eco-friendly", "sustainable", "educational"],
        price_range: (10.0, 200.0),
        trending: false,
        co2_range: (5.0, 25.0),
    },
];

/// Looks up a profile by exact category name.
pub fn find_category(name: &str) -> Option<&'static CategoryProfile> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// The baseline profile used whenever a category name is not recognized.
pub fn default_profile() -> &'static CategoryProfile {
    // DEFAULT_CATEGORY is a member of CATEGORIES; the first entry is only a backstop.
    find_category(DEFAULT_CATEGORY).unwrap_or(&CATEGORIES[0])
}

/// Returns the named profile, or the baseline profile for unknown names.
pub fn profile_or_default(name: &str) -> &'static CategoryProfile {
    find_category(name).unwrap_or_else(default_profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_are_well_formed() {
        assert_eq!(CATEGORIES.len(), 8);
        for profile in CATEGORIES {
            assert!(!profile.keywords.is_empty(), "{} has no keywords", profile.name);
            assert!(profile.price_range.0 <= profile.price_range.1);
            assert!(profile.price_range.0 > 0.0);
            assert!(profile.co2_range.0 <= profile.co2_range.1);
        }
    }

    #[test]
    fn test_unknown_category_resolves_to_clothing() {
        assert_eq!(profile_or_default("Spaceships").name, "Clothing");
        assert_eq!(profile_or_default("").name, "Clothing");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert!(find_category("Electronics").is_some());
        assert!(find_category("electronics").is_none());
    }

    #[test]
    fn test_demand_subsets_are_known_categories() {
        for name in HIGH_DEMAND_CATEGORIES.iter().chain(SEASONAL_APPAREL_CATEGORIES) {
            assert!(find_category(name).is_some(), "{name} missing from taxonomy");
        }
    }
}

//! Availability and trending samplers.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::taxonomy::CATEGORIES;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    LimitedStock,
    AlmostGone,
    NewArrival,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Availability::InStock => "In Stock",
            Availability::LimitedStock => "Limited Stock",
            Availability::AlmostGone => "Almost Gone",
            Availability::NewArrival => "New Arrival",
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed sampling weights. Must sum to 1.0.
pub const AVAILABILITY_WEIGHTS: [(Availability, f64); 4] = [
    (Availability::InStock, 0.60),
    (Availability::LimitedStock, 0.20),
    (Availability::AlmostGone, 0.15),
    (Availability::NewArrival, 0.05),
];

/// Chance that a trending-flagged category survives a sampling pass.
pub const TRENDING_KEEP_PROBABILITY: f64 = 0.7;

pub const DEFAULT_TRENDING: [&str; 3] = ["Clothing", "Electronics", "Beauty"];

pub fn sample_availability<R: Rng + ?Sized>(rng: &mut R) -> Availability {
    AVAILABILITY_WEIGHTS
        .choose_weighted(rng, |(_, weight)| *weight)
        .map(|(status, _)| *status)
        .unwrap_or(Availability::InStock)
}

/// Noisy filter over the static trending flags. Never returns an empty list.
pub fn sample_trending<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let trending: Vec<String> = CATEGORIES
        .iter()
        .filter(|c| c.trending && rng.gen_bool(TRENDING_KEEP_PROBABILITY))
        .map(|c| c.name.to_string())
        .collect();

    if trending.is_empty() {
        DEFAULT_TRENDING.iter().map(|c| c.to_string()).collect()
    } else {
        trending
    }
}

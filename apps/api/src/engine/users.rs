//! Member profiles for seeded and previewed accounts.

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

pub const EMAIL_DOMAIN: &str = "ecofinds.com";
pub const ECO_SCORE_RANGE: (u8, u8) = (70, 100);
pub const INTERESTS_PER_USER: (usize, usize) = (2, 4);
/// Accounts are backdated up to two years.
pub const MEMBER_SINCE_MAX_DAYS: i64 = 730;

pub const INTERESTS: &[&str] = &[
    "Zero Waste Living",
    "Sustainable Fashion",
    "Eco-Friendly Home",
    "Renewable Energy",
    "Organic Gardening",
    "Minimalism",
    "Circular Economy",
    "Green Technology",
    "Ethical Shopping",
];

const FIRST_NAMES: &[&str] = &[
    "Amara", "Ben", "Chloe", "Diego", "Elena", "Farah", "Gabriel", "Hana", "Isaac", "Jonas",
    "Keiko", "Liam", "Maya", "Noah", "Olivia", "Priya", "Quinn", "Rosa", "Samir", "Tessa",
];

const LAST_NAMES: &[&str] = &[
    "Alvarez", "Brooks", "Chen", "Dubois", "Eriksen", "Fischer", "Garcia", "Haddad", "Ito",
    "Jensen", "Kowalski", "Larsen", "Moreau", "Nakamura", "Okafor", "Patel", "Rossi", "Silva",
    "Turner", "Weber",
];

/// `{interests}` is replaced by the first two interests, comma separated.
const BIO_TEMPLATES: &[&str] = &[
    "Passionate about {interests}. Building a sustainable future, one purchase at a time.",
    "Eco-conscious consumer focused on {interests}. Love finding quality second-hand items.",
    "Sustainability advocate interested in {interests}. Committed to reducing environmental impact.",
];

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedUser {
    pub email: String,
    pub username: String,
    pub avatar: String,
    pub bio: String,
    pub interests: Vec<String>,
    pub member_since: NaiveDate,
    pub eco_score: u8,
}

impl GeneratedUser {
    /// Makes username and email unique within a batch by appending `n`.
    pub fn disambiguate(&mut self, n: usize) {
        self.username = format!("{}{n}", self.username);
        self.email = email_for(&self.username);
    }
}

/// Builds a profile without an avatar; the engine resolves one separately.
pub fn user_profile<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> GeneratedUser {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("Eco");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("Finder");
    let username = format!("{first}{last}{}", rng.gen_range(10..=99));

    let count = rng.gen_range(INTERESTS_PER_USER.0..=INTERESTS_PER_USER.1);
    let interests: Vec<String> = INTERESTS
        .choose_multiple(rng, count)
        .map(|i| i.to_string())
        .collect();

    let lead = interests
        .iter()
        .take(2)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let bio = BIO_TEMPLATES
        .choose(rng)
        .copied()
        .unwrap_or(BIO_TEMPLATES[0])
        .replace("{interests}", &lead);

    let member_since = today - Duration::days(rng.gen_range(0..=MEMBER_SINCE_MAX_DAYS));

    GeneratedUser {
        email: email_for(&username),
        username,
        avatar: String::new(),
        bio,
        interests,
        member_since,
        eco_score: rng.gen_range(ECO_SCORE_RANGE.0..=ECO_SCORE_RANGE.1),
    }
}

fn email_for(username: &str) -> String {
    format!("{}@{EMAIL_DOMAIN}", username.to_lowercase())
}

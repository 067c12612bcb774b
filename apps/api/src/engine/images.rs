//! Image resolution: picks a picture for a listing.
//!
//! Order of preference:
//! 1. cached result for (category, query)
//! 2. remote image search (5s ceiling, failures are misses)
//! 3. a fixed curated photo for a recognized product noun in the title
//! 4. a random photo from the category's curated pool
//!
//! `resolve` never fails and never returns an empty string.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::engine::taxonomy::DEFAULT_CATEGORY;
use crate::image_search::ImageSearch;

/// Trim kicks in once the cache holds more than this many entries.
pub const CACHE_MAX_ENTRIES: usize = 100;
/// Entries kept (most recently inserted) after a trim.
pub const CACHE_RETAIN_ENTRIES: usize = 50;
/// Title terms used in a remote query, at most.
const MAX_QUERY_TERMS: usize = 3;

const AVATAR_QUERY: &str = "portrait person profile";

pub const GENERIC_PLACEHOLDER: &str = "https://picsum.photos/400/300";

const BRAND_TERMS: &[&str] = &[
    "iphone", "ipad", "macbook", "airpods", "thinkpad", "pixel", "galaxy", "kindle", "sony",
    "canon", "nikon", "bose", "nintendo", "fitbit", "levi's", "levis", "patagonia", "nike",
    "adidas", "barbour", "ikea", "lego", "brompton", "trek", "lululemon",
];

const MATERIAL_TERMS: &[&str] = &[
    "bamboo", "leather", "denim", "wool", "cashmere", "linen", "cotton", "hemp", "silk", "oak",
    "walnut", "teak", "rattan", "wicker", "ceramic", "glass", "cork", "wooden", "cast-iron",
    "copper", "brass",
];

/// One fixed photo per product noun so repeated fallbacks for the same kind
/// of product look the same. Checked in order; first hit wins.
const PRODUCT_NOUN_IMAGES: &[(&[&str], &str)] = &[
    (
        &["laptop", "macbook", "thinkpad", "notebook"],
        "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400&h=300&fit=crop",
    ),
    (
        &["phone", "iphone", "smartphone", "pixel", "galaxy"],
        "https://images.unsplash.com/photo-1511707171634-5f897ff02aa9?w=400&h=300&fit=crop",
    ),
    (
        &["headphones", "earbuds", "airpods", "speaker"],
        "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400&h=300&fit=crop",
    ),
    (
        &["camera", "lens"],
        "https://images.unsplash.com/photo-1516035069371-29a1b244cc32?w=400&h=300&fit=crop",
    ),
    (
        &["jacket", "coat", "parka", "blazer"],
        "https://images.unsplash.com/photo-1551028719-00167b16eac5?w=400&h=300&fit=crop",
    ),
    (
        &["jeans", "denim"],
        "https://images.unsplash.com/photo-1542272604-787c3835535d?w=400&h=300&fit=crop",
    ),
    (
        &["sneakers", "shoes", "boots", "trainers"],
        "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400&h=300&fit=crop",
    ),
    (
        &["dress", "skirt"],
        "https://images.unsplash.com/photo-1595777457583-95e059d581b8?w=400&h=300&fit=crop",
    ),
    (
        &["plant", "planter", "succulent", "monstera"],
        "https://images.unsplash.com/photo-1485955900006-10f4d324d411?w=400&h=300&fit=crop",
    ),
    (
        &["chair", "armchair", "stool"],
        "https://images.unsplash.com/photo-1503602642458-232111445657?w=400&h=300&fit=crop",
    ),
    (
        &["sofa", "couch", "loveseat"],
        "https://images.unsplash.com/photo-1555041469-a586c61ea9bc?w=400&h=300&fit=crop",
    ),
    (
        &["lamp", "light"],
        "https://images.unsplash.com/photo-1507473885765-e6ed057f782c?w=400&h=300&fit=crop",
    ),
    (
        &["bicycle", "bike"],
        "https://images.unsplash.com/photo-1485965120184-e220f721d03e?w=400&h=300&fit=crop",
    ),
    (
        &["yoga", "mat"],
        "https://images.unsplash.com/photo-1601925260368-ae2f83cf8b7f?w=400&h=300&fit=crop",
    ),
    (
        &["watch"],
        "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400&h=300&fit=crop",
    ),
    (
        &["book", "novel", "guide", "handbook"],
        "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=400&h=300&fit=crop",
    ),
    (
        &["guitar"],
        "https://images.unsplash.com/photo-1510915361894-db8b60106cb1?w=400&h=300&fit=crop",
    ),
    (
        &["teddy", "plush", "blocks"],
        "https://images.unsplash.com/photo-1558060370-d644479cb6f7?w=400&h=300&fit=crop",
    ),
];

const CATEGORY_IMAGE_POOLS: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "https://images.unsplash.com/photo-1498049794561-7780e7231661?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1468495244123-6c6c332eeece?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1550009158-9ebf69173e03?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Clothing",
        &[
            "https://images.unsplash.com/photo-1489987707025-afc232f7ea0f?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1445205170230-053b83016050?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1434389677669-e08b4cac3105?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Home & Garden",
        &[
            "https://images.unsplash.com/photo-1416879595882-3373a0480b5b?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1484154218962-a197022b5858?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1463936575829-25148e1db1b8?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Books",
        &[
            "https://images.unsplash.com/photo-1495446815901-a7297e633e8d?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1512820790803-83ca734da794?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Sports",
        &[
            "https://images.unsplash.com/photo-1517649763962-0c623066013b?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Beauty",
        &[
            "https://images.unsplash.com/photo-1596462502278-27bfdc403348?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1571781926291-c477ebfd024b?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Furniture",
        &[
            "https://images.unsplash.com/photo-1524758631624-e2822e304c36?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1538688525198-9b88f6f53126?w=400&h=300&fit=crop",
        ],
    ),
    (
        "Toys",
        &[
            "https://images.unsplash.com/photo-1566576912321-d58ddd7a6088?w=400&h=300&fit=crop",
            "https://images.unsplash.com/photo-1596461404969-9ae70f2830c1?w=400&h=300&fit=crop",
        ],
    ),
];

// ────────────────────────────────────────────────────────────────────────────
// Cache
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub category: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(category: &str, query: &str) -> Self {
        Self {
            category: category.to_string(),
            query: query.to_string(),
        }
    }
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, String>,
    /// Insertion order, oldest first.
    order: VecDeque<CacheKey>,
}

/// Process-lifetime cache of resolved image URLs.
///
/// Shared between request handlers and the background mutator. Lock sections
/// are short and never span an await, so concurrent lookups for the same key
/// may both go remote and the last write wins.
#[derive(Default)]
pub struct ImageCache {
    inner: Mutex<CacheInner>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<String> {
        self.lock().entries.get(key).cloned()
    }

    /// Inserts or refreshes an entry; a refreshed entry counts as newest.
    pub fn put(&self, key: CacheKey, url: String) {
        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), url).is_some() {
            inner.order.retain(|k| k != &key);
        }
        inner.order.push_back(key);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all but the newest `CACHE_RETAIN_ENTRIES` once the cache has grown
    /// past `CACHE_MAX_ENTRIES`. Returns how many entries were evicted.
    pub fn trim(&self) -> usize {
        let mut inner = self.lock();
        if inner.entries.len() <= CACHE_MAX_ENTRIES {
            return 0;
        }
        let excess = inner.order.len().saturating_sub(CACHE_RETAIN_ENTRIES);
        let evicted: Vec<CacheKey> = inner.order.drain(..excess).collect();
        for key in &evicted {
            inner.entries.remove(key);
        }
        evicted.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // cache contents are reconstructible, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resolver
// ────────────────────────────────────────────────────────────────────────────

pub struct ImageResolver {
    cache: ImageCache,
    search: Option<Arc<dyn ImageSearch>>,
}

impl ImageResolver {
    /// `search = None` disables the network path entirely.
    pub fn new(search: Option<Arc<dyn ImageSearch>>) -> Self {
        Self {
            cache: ImageCache::new(),
            search,
        }
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub async fn resolve<R: Rng + Send>(
        &self,
        category: &str,
        keywords: &[&str],
        title_hint: Option<&str>,
        rng: &mut R,
    ) -> String {
        let query = build_query(category, keywords, title_hint);
        let key = CacheKey::new(category, &query);

        if let Some(url) = self.cache.get(&key) {
            debug!("Image cache hit for {category} / '{query}'");
            return url;
        }

        if let Some(search) = &self.search {
            match search.search(&query).await {
                Ok(candidates) => {
                    if let Some(url) = candidates.choose(rng).filter(|u| !u.is_empty()) {
                        self.cache.put(key, url.clone());
                        return url.clone();
                    }
                }
                Err(e) => warn!("Image search failed for '{query}': {e}"),
            }
        }

        fallback_image(category, title_hint, rng)
    }

    /// Portrait for a member profile. Not cached, so each member gets their
    /// own pick; offline it is a placeholder seeded by `seed`.
    pub async fn resolve_avatar<R: Rng + Send>(&self, seed: &str, rng: &mut R) -> String {
        if let Some(search) = &self.search {
            match search.search(AVATAR_QUERY).await {
                Ok(candidates) => {
                    if let Some(url) = candidates.choose(rng).filter(|u| !u.is_empty()) {
                        return url.clone();
                    }
                }
                Err(e) => warn!("Avatar search failed: {e}"),
            }
        }
        placeholder_image(seed)
    }
}

/// Builds the remote search query.
///
/// With a title hint, up to three recognized brand/material terms from the
/// title lead the query; otherwise the category and its first two keywords.
pub fn build_query(category: &str, keywords: &[&str], title_hint: Option<&str>) -> String {
    if let Some(title) = title_hint {
        let mut terms: Vec<String> = Vec::new();
        for token in tokenize(title) {
            if terms.len() == MAX_QUERY_TERMS {
                break;
            }
            let known = BRAND_TERMS.contains(&token.as_str())
                || MATERIAL_TERMS.contains(&token.as_str());
            if known && !terms.contains(&token) {
                terms.push(token);
            }
        }
        if !terms.is_empty() {
            return format!("{} {}", terms.join(" "), category);
        }
    }

    std::iter::once(category)
        .chain(keywords.iter().take(2).copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Offline image choice: fixed photo per product noun, else the category pool.
pub fn fallback_image<R: Rng + ?Sized>(
    category: &str,
    title_hint: Option<&str>,
    rng: &mut R,
) -> String {
    if let Some(title) = title_hint {
        let tokens = tokenize(title);
        for (nouns, url) in PRODUCT_NOUN_IMAGES {
            if nouns.iter().any(|n| tokens.iter().any(|t| t == n)) {
                return url.to_string();
            }
        }
    }

    category_pool(category)
        .choose(rng)
        .map(|u| u.to_string())
        .unwrap_or_else(|| GENERIC_PLACEHOLDER.to_string())
}

/// Deterministic placeholder derived from a seed string.
pub fn placeholder_image(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    format!("https://picsum.photos/seed/{}/400/300", hex::encode(&digest[..8]))
}

fn category_pool(category: &str) -> &'static [&'static str] {
    let lookup = |name: &str| {
        CATEGORY_IMAGE_POOLS
            .iter()
            .find(|(c, _)| *c == name)
            .map(|(_, pool)| *pool)
    };
    lookup(category)
        .or_else(|| lookup(DEFAULT_CATEGORY))
        .unwrap_or(&[])
}

/// Lowercased words of a title. Apostrophes stay inside words ("levi's").
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
        .map(|t| t.trim_matches(|c| c == '\'' || c == '-').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

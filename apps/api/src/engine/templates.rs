// Template tables for listing copy.
// Titles and descriptions are plain data so every (category, keyword group)
// pairing can be enumerated and tested. Placeholders: {category}, {keyword}.

use serde::Serialize;

use crate::engine::images::tokenize;
use crate::engine::taxonomy::DEFAULT_CATEGORY;

/// Probability that a curated title gets a condition suffix.
pub const CONDITION_SUFFIX_PROBABILITY: f64 = 0.7;

pub const CONDITION_SUFFIXES: &[&str] = &[
    "Excellent Condition",
    "Like New",
    "Gently Used",
    "Good Condition",
    "Barely Used",
];

pub const TITLE_ADJECTIVES: &[&str] = &[
    "Eco-Friendly",
    "Sustainable",
    "Vintage",
    "Organic",
    "Zero-Waste",
    "Upcycled",
    "Pre-Loved",
];

pub const TITLE_NOUNS: &[&str] = &["Find", "Essentials", "Collection", "Piece", "Bundle", "Set"];

pub static CURATED_TITLES: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "Apple MacBook Air M1 13-inch",
            "Lenovo ThinkPad T480 Laptop",
            "iPhone 12 Pro 128GB Unlocked",
            "Samsung Galaxy S21 Smartphone",
            "Sony WH-1000XM4 Noise Cancelling Headphones",
            "Bose SoundLink Bluetooth Speaker",
            "Canon EOS Rebel T7 DSLR Camera",
            "Kindle Paperwhite E-Reader",
            "Nintendo Switch Lite - Barely Used",
        ],
    ),
    (
        "Clothing",
        &[
            "Patagonia Better Sweater Fleece Jacket",
            "Levi's 501 Original Fit Jeans",
            "Barbour Waxed Cotton Jacket",
            "Nike Air Max 90 Sneakers",
            "Hand-Knit Wool Sweater",
            "Vintage Silk Midi Dress",
            "Organic Cotton Linen Shirt",
            "Dr. Martens 1460 Leather Boots",
        ],
    ),
    (
        "Home & Garden",
        &[
            "Monstera Deliciosa Plant in Ceramic Pot",
            "Bamboo Kitchen Utensil Set",
            "Le Creuset Cast-Iron Dutch Oven",
            "Linen Duvet Cover Set - Queen",
            "Terracotta Herb Planter Trio",
            "Glass Food Storage Containers (Set of 6)",
            "Copper Watering Can",
        ],
    ),
    (
        "Books",
        &[
            "Braiding Sweetgrass by Robin Wall Kimmerer (Paperback)",
            "Zero Waste Home by Bea Johnson",
            "Silent Spring by Rachel Carson - Anniversary Edition",
            "The Uninhabitable Earth (Hardcover)",
            "Cradle to Cradle: Remaking the Way We Make Things",
            "Where the Crawdads Sing - Novel",
            "The Vegetable Gardener's Bible",
        ],
    ),
    (
        "Sports",
        &[
            "Trek FX 2 Hybrid Bicycle",
            "Brompton Folding Bike",
            "Lululemon Reversible Yoga Mat 5mm",
            "Cork Yoga Block Pair",
            "REI Half Dome 2 Tent",
            "Osprey Atmos 65L Backpack",
            "Adjustable Dumbbell Set 5-25 lb",
            "Black Diamond Trekking Poles",
        ],
    ),
    (
        "Beauty",
        &[
            "Organic Rosehip Facial Oil 30ml",
            "Bamboo Toothbrush Pack (4)",
            "Zero-Waste Shampoo Bar Trio",
            "Vintage Glass Perfume Atomizer",
            "Natural Bristle Hair Brush",
            "Refillable Lipstick in Brass Case",
        ],
    ),
    (
        "Furniture",
        &[
            "Mid-Century Teak Sideboard",
            "IKEA Poäng Rattan Armchair",
            "Solid Oak Dining Table",
            "Velvet Chesterfield Sofa",
            "Reclaimed Wood Coffee Table",
            "Vintage Brass Floor Lamp",
            "Walnut Bookshelf with 5 Shelves",
        ],
    ),
    (
        "Toys",
        &[
            "LEGO Classic Creative Brick Box",
            "Wooden Rainbow Stacking Blocks",
            "Steiff Teddy Bear - Collector's Edition",
            "Hape Wooden Kitchen Playset",
            "Melissa & Doug Wooden Puzzle Set",
            "Organic Cotton Plush Bunny",
        ],
    ),
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordGroup {
    Laptop,
    Phone,
    Audio,
    Camera,
    Outerwear,
    Denim,
    Footwear,
    Knitwear,
    Dresses,
    Plants,
    Kitchen,
    Textiles,
    Editions,
    Guides,
    Fiction,
    Cycling,
    Yoga,
    Camping,
    Fitness,
    Skincare,
    Haircare,
    Fragrance,
    Seating,
    Tables,
    Lighting,
    Storage,
    BuildingSets,
    WoodenToys,
    Plush,
}

/// One row of the description dispatch table.
#[derive(Debug)]
pub struct DescriptionRule {
    pub category: &'static str,
    pub group: KeywordGroup,
    /// Lowercase single words matched against the title's words.
    pub keywords: &'static [&'static str],
    pub templates: &'static [&'static str],
}

/// Dispatch order is table order: the first rule for the listing's category
/// with any keyword among the title words wins.
pub static DESCRIPTION_RULES: &[DescriptionRule] = &[
    // Electronics
    DescriptionRule {
        category: "Electronics",
        group: KeywordGroup::Laptop,
        keywords: &["laptop", "macbook", "thinkpad", "notebook", "chromebook"],
        templates: &[
            "Fully wiped and refurbished laptop with a fresh OS install. Battery health checked and the keyboard deep-cleaned. Buying refurbished keeps a whole machine out of e-waste.",
            "Reliable laptop that still handles everyday work with ease. Screen is bright with no dead pixels. Comes with the original charger in {keyword} packaging.",
        ],
    },
    DescriptionRule {
        category: "Electronics",
        group: KeywordGroup::Phone,
        keywords: &["iphone", "phone", "smartphone", "galaxy", "pixel"],
        templates: &[
            "Unlocked phone, factory reset and ready for a new SIM. Battery holds a full day of use. A second life for a device that still has plenty to give.",
            "Well-kept smartphone that has always lived in a case. Minor signs of use on the frame, screen is flawless. Shipped in {keyword} packaging.",
        ],
    },
    DescriptionRule {
        category: "Electronics",
        group: KeywordGroup::Audio,
        keywords: &["headphones", "earbuds", "speaker", "airpods"],
        templates: &[
            "Great-sounding audio gear, tested on every channel. Ear pads and buttons in good shape. Pre-owned audio is one of the easiest {keyword} upgrades you can make.",
            "Crisp sound and solid battery life. Cleaned and sanitized before listing, charging cable included.",
        ],
    },
    DescriptionRule {
        category: "Electronics",
        group: KeywordGroup::Camera,
        keywords: &["camera", "lens", "dslr"],
        templates: &[
            "Camera body with a low shutter count, sensor cleaned and inspected. Perfect for someone starting out in photography without buying new.",
            "Capable camera kit that has been carefully stored. Includes battery, charger and strap. Lenses and glass are free of scratches and fungus.",
        ],
    },
    // Clothing
    DescriptionRule {
        category: "Clothing",
        group: KeywordGroup::Outerwear,
        keywords: &["jacket", "coat", "parka", "fleece", "blazer"],
        templates: &[
            "Warm outerwear built to last for years more. Zips and seams are intact, freshly laundered. Choosing {keyword} outerwear saves a lot of water and carbon compared with new.",
            "Classic layering piece with plenty of life left. No stains or tears, all buttons and zips working.",
        ],
    },
    DescriptionRule {
        category: "Clothing",
        group: KeywordGroup::Denim,
        keywords: &["jeans", "denim"],
        templates: &[
            "Broken-in denim with a perfect natural fade. Hems and pockets intact. Second-hand denim saves thousands of litres of water.",
            "Timeless jeans in a relaxed fit, washed cold and line dried. A {keyword} wardrobe staple.",
        ],
    },
    DescriptionRule {
        category: "Clothing",
        group: KeywordGroup::Footwear,
        keywords: &["sneakers", "boots", "shoes", "trainers"],
        templates: &[
            "Footwear cleaned and deodorized, soles with plenty of tread left. Worn only a handful of times.",
            "Comfortable pair with minimal creasing. Laces replaced, insoles clean. A {keyword} alternative to buying new.",
        ],
    },
    DescriptionRule {
        category: "Clothing",
        group: KeywordGroup::Knitwear,
        keywords: &["sweater", "cardigan", "jumper", "knit", "hand-knit"],
        templates: &[
            "Soft knit with no pilling or holes, hand washed and dried flat. Natural fibres that will keep you warm for many winters.",
            "Cosy knitwear in {keyword} yarn. Shape and stitching are perfectly intact.",
        ],
    },
    DescriptionRule {
        category: "Clothing",
        group: KeywordGroup::Dresses,
        keywords: &["dress", "skirt"],
        templates: &[
            "Flowing piece in beautiful condition, ready for its next occasion. Lining intact, freshly steamed.",
            "A {keyword} wardrobe find with a flattering cut. Worn twice and dry cleaned.",
        ],
    },
    // Home & Garden
    DescriptionRule {
        category: "Home & Garden",
        group: KeywordGroup::Plants,
        keywords: &["plant", "planter", "succulent", "monstera", "herb"],
        templates: &[
            "Healthy, well-rooted greenery propagated at home. Comes potted and ready to brighten a room.",
            "Thriving plant setup looking for a new windowsill. Repotted in {keyword} soil this season.",
        ],
    },
    DescriptionRule {
        category: "Home & Garden",
        group: KeywordGroup::Kitchen,
        keywords: &["kitchen", "utensil", "oven", "cast-iron", "skillet", "kettle", "containers"],
        templates: &[
            "Durable kitchenware that will outlive any non-stick alternative. Cleaned and ready to cook with.",
            "Kitchen essentials in great shape, ideal for a {keyword} home. No chips, cracks or warping.",
        ],
    },
    DescriptionRule {
        category: "Home & Garden",
        group: KeywordGroup::Textiles,
        keywords: &["linen", "duvet", "blanket", "cushion", "throw", "towels"],
        templates: &[
            "Soft home textiles, washed and folded. Natural fibres that only get better with age.",
            "Quality bedding and linens from a smoke-free home. A simple {keyword} swap for new.",
        ],
    },
    // Books
    DescriptionRule {
        category: "Books",
        group: KeywordGroup::Editions,
        keywords: &["edition", "hardcover", "paperback"],
        templates: &[
            "Clean copy with a tight spine and no highlighting. Pages crisp, cover shows light shelf wear.",
            "Well-loved edition from a pet-free home. Passing it on keeps good {keyword} reading in circulation.",
        ],
    },
    DescriptionRule {
        category: "Books",
        group: KeywordGroup::Guides,
        keywords: &["guide", "bible", "handbook", "home"],
        templates: &[
            "Practical guide full of actionable ideas. A few pencil notes in the margins, otherwise like new.",
            "Hands-on reference for {keyword} living. Binding solid, all pages present.",
        ],
    },
    DescriptionRule {
        category: "Books",
        group: KeywordGroup::Fiction,
        keywords: &["novel", "fiction", "stories"],
        templates: &[
            "Gripping read in very good condition. Read once, kept on a shelf away from sunlight.",
            "A story worth sharing. Light reading creases only.",
        ],
    },
    // Sports
    DescriptionRule {
        category: "Sports",
        group: KeywordGroup::Cycling,
        keywords: &["bicycle", "bike", "helmet"],
        templates: &[
            "Recently serviced ride: new brake pads, chain cleaned and lubed, tyres pumped. Ready for the commute.",
            "Smooth-shifting bike that makes {keyword} commuting easy. Frame has no dents or cracks.",
        ],
    },
    DescriptionRule {
        category: "Sports",
        group: KeywordGroup::Yoga,
        keywords: &["yoga", "mat", "block"],
        templates: &[
            "Grippy, cushioned yoga gear, cleaned and sanitized. Natural materials with no peeling.",
            "Practice essentials in great shape for a {keyword} routine.",
        ],
    },
    DescriptionRule {
        category: "Sports",
        group: KeywordGroup::Camping,
        keywords: &["tent", "backpack", "trekking", "poles", "sleeping"],
        templates: &[
            "Trail-tested outdoor kit, cleaned and dried before storage. All straps, buckles and seams intact.",
            "Reliable gear for your next {keyword} adventure. Only used on a couple of weekend trips.",
        ],
    },
    DescriptionRule {
        category: "Sports",
        group: KeywordGroup::Fitness,
        keywords: &["dumbbell", "kettlebell", "weights"],
        templates: &[
            "Solid home-gym equipment with years of use left. Adjustment mechanism works smoothly.",
            "Strength training gear for {keyword} workouts at home. Light cosmetic scuffs only.",
        ],
    },
    // Beauty
    DescriptionRule {
        category: "Beauty",
        group: KeywordGroup::Skincare,
        keywords: &["facial", "oil", "serum", "moisturizer", "cleanser"],
        templates: &[
            "Unopened skincare, sealed and well within its expiry date. Cold-pressed and {keyword}.",
            "Gentle skincare from a brand with refillable packaging. Stored away from heat and light.",
        ],
    },
    DescriptionRule {
        category: "Beauty",
        group: KeywordGroup::Haircare,
        keywords: &["shampoo", "conditioner", "hair", "brush"],
        templates: &[
            "Plastic-free haircare that lasts longer than a bottle. Sealed and unused.",
            "A {keyword} haircare swap that cuts bathroom packaging waste.",
        ],
    },
    DescriptionRule {
        category: "Beauty",
        group: KeywordGroup::Fragrance,
        keywords: &["perfume", "fragrance", "cologne", "atomizer"],
        templates: &[
            "Elegant refillable fragrance piece, cleaned and in full working order.",
            "Beautiful {keyword} vanity accent with a fine mist spray.",
        ],
    },
    // Furniture
    DescriptionRule {
        category: "Furniture",
        group: KeywordGroup::Seating,
        keywords: &["chair", "armchair", "sofa", "couch", "stool"],
        templates: &[
            "Comfortable seating with a sturdy frame and no wobble. Upholstery cleaned, no rips or stains.",
            "Characterful {keyword} seating ready for a new living room. Collection only, easy to load.",
        ],
    },
    DescriptionRule {
        category: "Furniture",
        group: KeywordGroup::Tables,
        keywords: &["table", "desk", "sideboard"],
        templates: &[
            "Solid wood surface with a lovely patina. Structurally sound, freshly oiled.",
            "Well-built piece that will last another lifetime. Minor marks consistent with {keyword} character.",
        ],
    },
    DescriptionRule {
        category: "Furniture",
        group: KeywordGroup::Lighting,
        keywords: &["lamp", "light", "pendant"],
        templates: &[
            "Rewired and safety tested lighting, works perfectly with LED bulbs.",
            "Warm ambient light with {keyword} charm. Shade in great condition.",
        ],
    },
    DescriptionRule {
        category: "Furniture",
        group: KeywordGroup::Storage,
        keywords: &["bookshelf", "shelves", "dresser", "cabinet", "wardrobe"],
        templates: &[
            "Roomy storage piece with smooth drawers and sturdy shelves. Disassembles for transport.",
            "Practical {keyword} storage that beats flat-pack on durability.",
        ],
    },
    // Toys
    DescriptionRule {
        category: "Toys",
        group: KeywordGroup::BuildingSets,
        keywords: &["lego", "brick", "bricks", "construction"],
        templates: &[
            "Complete building set, washed and counted. Hours of creative play for the next builder.",
            "Bricks sorted and cleaned, instructions included. Pre-loved sets keep plastic in play instead of landfill.",
        ],
    },
    DescriptionRule {
        category: "Toys",
        group: KeywordGroup::WoodenToys,
        keywords: &["wooden", "blocks", "puzzle", "playset"],
        templates: &[
            "Sturdy wooden toy finished with non-toxic paints. No missing pieces.",
            "Open-ended {keyword} play that grows with your child. Gently used, sanitized.",
        ],
    },
    DescriptionRule {
        category: "Toys",
        group: KeywordGroup::Plush,
        keywords: &["teddy", "plush", "stuffed"],
        templates: &[
            "Soft and cuddly companion, machine washed and fluffed. Seams all secure.",
            "A huggable {keyword} friend from a smoke-free home.",
        ],
    },
];

/// Used when no keyword group fires. Unknown categories use the baseline set.
pub static GENERIC_DESCRIPTIONS: &[(&str, &[&str])] = &[
    (
        "Electronics",
        &[
            "Energy-efficient {category} designed for sustainability. Its {keyword} design reduces environmental impact while maintaining high performance.",
            "Refurbished {category} with eco-friendly packaging. Perfect for conscious consumers who value both quality and sustainability.",
            "Modular {category} designed for easy repair and upgrade. Reduces e-waste and promotes circular economy principles.",
        ],
    ),
    (
        "Clothing",
        &[
            "Vintage {category} made from {keyword} materials. Timeless design that never goes out of style.",
            "Ethically produced {category} from fair-trade manufacturers. Perfect for the conscious consumer.",
            "Upcycled {category} giving new life to pre-loved materials. Unique piece with a story to tell.",
        ],
    ),
    (
        "Home & Garden",
        &[
            "Bamboo {category} set for eco-friendly living. Its {keyword} materials promote sustainable home practices.",
            "Zero-waste {category} designed to minimize environmental impact. Perfect for the modern sustainable home.",
            "Organic {category} collection for conscious living. Made from renewable materials.",
        ],
    ),
    (
        "Books",
        &[
            "Pre-owned {category} on {keyword} topics, in good readable condition.",
            "Second-hand copy that keeps great ideas circulating. Minimal wear.",
        ],
    ),
    (
        "Sports",
        &[
            "Pre-loved {category} gear ready for its next {keyword} outing.",
            "Durable equipment with plenty of life left. Reusing gear keeps it out of landfill.",
        ],
    ),
    (
        "Beauty",
        &[
            "Unused {category} product with {keyword} ingredients and recyclable packaging.",
            "Low-waste beauty essential, sealed and stored properly.",
        ],
    ),
    (
        "Furniture",
        &[
            "Solid, well-made {category} with {keyword} character. Buying second-hand saves trees and transport emissions.",
            "Quality {category} piece that will outlast anything flat-pack. Collection preferred.",
        ],
    ),
    (
        "Toys",
        &[
            "Gently used {category} with {keyword} appeal. Cleaned and complete.",
            "Pre-loved playtime favourite ready for a new home.",
        ],
    ),
];

/// The outcome of description dispatch for a title.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DescriptionChoice {
    Keyword {
        group: KeywordGroup,
        templates: &'static [&'static str],
    },
    Generic {
        templates: &'static [&'static str],
    },
}

impl DescriptionChoice {
    pub fn templates(&self) -> &'static [&'static str] {
        match self {
            DescriptionChoice::Keyword { templates, .. } => templates,
            DescriptionChoice::Generic { templates } => templates,
        }
    }
}

pub fn curated_titles(category: &str) -> Option<&'static [&'static str]> {
    CURATED_TITLES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, titles)| *titles)
}

/// Generic templates for a category, falling back to the baseline category.
pub fn generic_descriptions(category: &str) -> &'static [&'static str] {
    let lookup = |name: &str| {
        GENERIC_DESCRIPTIONS
            .iter()
            .find(|(c, _)| *c == name)
            .map(|(_, templates)| *templates)
    };
    lookup(category)
        .or_else(|| lookup(DEFAULT_CATEGORY))
        .unwrap_or(&[])
}

/// First-match dispatch of a title against the rules for its category.
pub fn select_description(category: &str, title: &str) -> DescriptionChoice {
    let words = tokenize(title);
    DESCRIPTION_RULES
        .iter()
        .filter(|rule| rule.category == category)
        .find(|rule| rule.keywords.iter().any(|k| words.iter().any(|w| w == k)))
        .map(|rule| DescriptionChoice::Keyword {
            group: rule.group,
            templates: rule.templates,
        })
        .unwrap_or_else(|| DescriptionChoice::Generic {
            templates: generic_descriptions(category),
        })
}

pub fn render(template: &str, category: &str, keyword: &str) -> String {
    template
        .replace("{category}", &category.to_lowercase())
        .replace("{keyword}", keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::taxonomy::{find_category, CATEGORIES};

    #[test]
    fn test_every_category_has_titles_and_generic_copy() {
        for profile in CATEGORIES {
            let titles = curated_titles(profile.name).unwrap_or(&[]);
            assert!(!titles.is_empty(), "{} has no curated titles", profile.name);
            let generic = GENERIC_DESCRIPTIONS.iter().find(|(c, _)| *c == profile.name);
            assert!(
                matches!(generic, Some((_, t)) if !t.is_empty()),
                "{} has no generic descriptions",
                profile.name
            );
        }
    }

    #[test]
    fn test_rules_are_well_formed() {
        for rule in DESCRIPTION_RULES {
            assert!(find_category(rule.category).is_some(), "{:?}", rule.group);
            assert!(!rule.keywords.is_empty(), "{:?}", rule.group);
            assert!(!rule.templates.is_empty(), "{:?}", rule.group);
            for keyword in rule.keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
                assert!(!keyword.contains(' '), "{keyword} must be a single word");
            }
        }
    }

    #[test]
    fn test_all_templates_render_completely() {
        let all = DESCRIPTION_RULES
            .iter()
            .flat_map(|r| r.templates.iter())
            .chain(GENERIC_DESCRIPTIONS.iter().flat_map(|(_, t)| t.iter()));
        for template in all {
            let rendered = render(template, "Home & Garden", "organic");
            assert!(!rendered.contains('{'), "unrendered placeholder in {rendered}");
        }
    }

    #[test]
    fn test_dispatch_matches_keyword_group() {
        let choice = select_description("Electronics", "Apple MacBook Air M1 13-inch");
        assert!(matches!(
            choice,
            DescriptionChoice::Keyword {
                group: KeywordGroup::Laptop,
                ..
            }
        ));
    }

    #[test]
    fn test_dispatch_first_match_wins() {
        // "sweater" (Knitwear) and "jacket" (Outerwear) both fire; Outerwear is listed first
        let choice = select_description("Clothing", "Patagonia Better Sweater Fleece Jacket");
        assert!(matches!(
            choice,
            DescriptionChoice::Keyword {
                group: KeywordGroup::Outerwear,
                ..
            }
        ));
    }

    #[test]
    fn test_dispatch_is_scoped_to_category() {
        // "lamp" is a Furniture keyword; in Electronics it must not fire
        let choice = select_description("Electronics", "Desk Lamp");
        assert!(matches!(choice, DescriptionChoice::Generic { .. }));
    }

    #[test]
    fn test_dispatch_falls_back_to_generic() {
        let choice = select_description("Home & Garden", "Copper Watering Can");
        assert_eq!(
            choice,
            DescriptionChoice::Generic {
                templates: generic_descriptions("Home & Garden")
            }
        );
    }

    #[test]
    fn test_unknown_category_uses_baseline_generics() {
        assert_eq!(generic_descriptions("Spaceships"), generic_descriptions("Clothing"));
        assert!(matches!(
            select_description("Spaceships", "Eco-Friendly Spaceships Find"),
            DescriptionChoice::Generic { .. }
        ));
    }

    #[test]
    fn test_render_lowercases_category() {
        assert_eq!(
            render("Refurbished {category}, {keyword}.", "Electronics", "recycled"),
            "Refurbished electronics, recycled."
        );
    }
}

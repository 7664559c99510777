use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::ReferenceConfig;

/// Behavioral cluster taxonomy: cluster name to member persona names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTable {
    pub clusters: BTreeMap<String, Vec<String>>,
}

impl Default for CategoryTable {
    // several member names are misspelled in the reference sheet; the table
    // lists the sheet's spelling first and the corrected one alongside it
    fn default() -> Self {
        let clusters = BTreeMap::from([
            (
                "Entertainment".to_string(),
                string_vec(&[
                    "Entertaiment",
                    "Entertainment",
                    "Comedy Lover",
                    "Horror",
                    "Romantic Comedy",
                    "Action & Adventure",
                    "Animation",
                    "Sci-Fi & Fantasy",
                    "Music & Concert Goers",
                ]),
            ),
            (
                "Sports".to_string(),
                string_vec(&[
                    "Sports",
                    "EPL Super Fans",
                    "Badminton",
                    "Golf Fans",
                    "Sepak Takraw",
                    "Esports Fan",
                ]),
            ),
            (
                "Lifestyle".to_string(),
                string_vec(&[
                    "Active Lifestyle Seekers",
                    "Adventure Enthuasiasts",
                    "Adventure Enthusiasts",
                    "Health & Wellness Shoppers",
                    "Foodies",
                    "Travel & Experience Seekers",
                    "Fashion Icons",
                ]),
            ),
            (
                "Technology".to_string(),
                string_vec(&[
                    "Tech & Gadget Enthuasiasts",
                    "Tech & Gadget Enthusiasts",
                    "Gadget Gurus",
                    "Online Shoppers",
                ]),
            ),
            (
                "Automotive".to_string(),
                string_vec(&[
                    "Automative Ethuasiasts",
                    "Automotive Enthusiasts",
                    "Automative Intent",
                    "Automotive Intent",
                ]),
            ),
            (
                "Business".to_string(),
                string_vec(&[
                    "Business & Professional",
                    "Corporate Visionaries",
                    "SME",
                    "Start-ups",
                    "Emerging Affluents",
                ]),
            ),
            (
                "Luxury".to_string(),
                string_vec(&["Luxury Buyers", "Luxury Seekers"]),
            ),
            (
                "Family".to_string(),
                string_vec(&[
                    "Family Dynamic ( Experienced Family )",
                    "Little Steps Advocates ( Young Family)",
                    "Mommy Pros ( Experienced Mother)",
                    "Youth Mom",
                    "The Dynamic Duo",
                ]),
            ),
            (
                "Life Stage".to_string(),
                string_vec(&["Students", "Young Working Adult", "Soloist"]),
            ),
            (
                "Home & Living".to_string(),
                string_vec(&["Home Buyers", "Eco Enthuasiasts", "Eco Enthusiasts"]),
            ),
        ]);

        Self { clusters }
    }
}

/// Census-style segment membership per dimension. A persona listed anywhere
/// in this table is a demographic (Tier-1) segment; the classification is
/// total and never ambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemographicTiers {
    pub dimensions: BTreeMap<String, Vec<String>>,
}

impl Default for DemographicTiers {
    fn default() -> Self {
        let dimensions = BTreeMap::from([
            ("Race".to_string(), string_vec(&["Malay", "Chinese", "Indian"])),
            (
                "Income".to_string(),
                string_vec(&["B40 (Bottom 40%)", "M40 (Middle 40%)", "T20 (Top 20%)"]),
            ),
            (
                "Generation".to_string(),
                string_vec(&[
                    "Generation Z (Gen Z)",
                    "Millennials (Gen Y)",
                    "Generation X (Gen X)",
                    "Baby Boomers",
                ]),
            ),
            ("Age".to_string(), Vec::new()),
        ]);

        Self { dimensions }
    }
}

/// Pairwise overlap coefficients between behavioral clusters, keyed as
/// `"CatA-CatB"`. Symmetric pairs may be listed independently; lookup tries
/// both orders before the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityMatrix {
    pub pairs: BTreeMap<String, f64>,
    pub same_category_default: f64,
    pub default: f64,
}

impl Default for AffinityMatrix {
    fn default() -> Self {
        let pairs = BTreeMap::from([
            // same content cluster
            ("Entertainment-Entertainment".to_string(), 0.75),
            ("Sports-Sports".to_string(), 0.75),
            // same behaviour cluster
            ("Lifestyle-Lifestyle".to_string(), 0.60),
            ("Technology-Technology".to_string(), 0.60),
            // demographically aligned behaviour
            ("Sports-Lifestyle".to_string(), 0.55),
            // same spending tier
            ("Business-Luxury".to_string(), 0.45),
            ("Luxury-Business".to_string(), 0.45),
            // cross-cluster related
            ("Entertainment-Technology".to_string(), 0.30),
            ("Technology-Entertainment".to_string(), 0.30),
            ("Lifestyle-Technology".to_string(), 0.30),
            ("Technology-Lifestyle".to_string(), 0.30),
        ]);

        Self {
            pairs,
            same_category_default: 0.75,
            default: 0.20,
        }
    }
}

impl AffinityMatrix {
    pub fn same_category(&self, category: &str) -> f64 {
        self.pairs
            .get(&pair_key(category, category))
            .copied()
            .unwrap_or(self.same_category_default)
    }

    pub fn cross_category(&self, a: &str, b: &str) -> f64 {
        self.pairs
            .get(&pair_key(a, b))
            .or_else(|| self.pairs.get(&pair_key(b, a)))
            .copied()
            .unwrap_or(self.default)
    }
}

fn pair_key(a: &str, b: &str) -> String {
    format!("{}-{}", a, b)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentTier {
    /// Census bucket (race, income band, generation): zero overlap with
    /// other demographic segments.
    Demographic,
    /// Interest- or behavior-based segment, subject to the affinity matrix.
    Behavioral,
}

/// Classifies segments and resolves pairwise overlap coefficients. Both
/// lookup indexes are built once from the reference tables, not re-scanned
/// per call.
#[derive(Debug, Clone)]
pub struct OverlapScorer {
    matrix: AffinityMatrix,
    category_index: HashMap<String, String>,
    demographic_members: HashSet<String>,
}

impl OverlapScorer {
    pub fn new(config: &ReferenceConfig) -> Self {
        let mut category_index = HashMap::new();
        for (category, members) in &config.taxonomy.clusters {
            for member in members {
                category_index
                    .entry(member.clone())
                    .or_insert_with(|| category.clone());
            }
        }

        let demographic_members = config
            .tiers
            .dimensions
            .values()
            .flatten()
            .cloned()
            .collect();

        Self {
            matrix: config.affinity.clone(),
            category_index,
            demographic_members,
        }
    }

    pub fn category(&self, name: &str) -> Option<&str> {
        self.category_index.get(name).map(String::as_str)
    }

    pub fn tier(&self, name: &str) -> SegmentTier {
        if self.demographic_members.contains(name) {
            SegmentTier::Demographic
        } else {
            SegmentTier::Behavioral
        }
    }

    /// Overlap coefficient for an unordered pair, in [0, 1]. Commutative.
    pub fn coefficient(&self, a: &str, b: &str) -> f64 {
        match (self.tier(a), self.tier(b)) {
            (SegmentTier::Demographic, SegmentTier::Demographic) => 0.0,
            (SegmentTier::Demographic, SegmentTier::Behavioral)
            | (SegmentTier::Behavioral, SegmentTier::Demographic) => 0.10,
            (SegmentTier::Behavioral, SegmentTier::Behavioral) => {
                match (self.category(a), self.category(b)) {
                    (Some(cat_a), Some(cat_b)) if cat_a == cat_b => {
                        self.matrix.same_category(cat_a)
                    }
                    (Some(cat_a), Some(cat_b)) => self.matrix.cross_category(cat_a, cat_b),
                    // uncategorized segments never match a pair entry
                    _ => self.matrix.default,
                }
            }
        }
    }
}

fn string_vec(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

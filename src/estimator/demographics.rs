use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::DemographicSelection;

/// Population proportions per demographic dimension. Within a dimension the
/// values are mutually exclusive and sum to roughly 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationTables {
    pub race: BTreeMap<String, f64>,
    pub generation: BTreeMap<String, f64>,
    pub income: BTreeMap<String, f64>,
}

impl Default for PopulationTables {
    fn default() -> Self {
        let race = BTreeMap::from([
            ("Malay".to_string(), 0.697),
            ("Chinese".to_string(), 0.228),
            ("Indian".to_string(), 0.067),
            ("Other".to_string(), 0.008),
        ]);
        let generation = BTreeMap::from([
            ("Generation Z (Gen Z)".to_string(), 0.254),
            ("Millennials (Gen Y)".to_string(), 0.303),
            ("Generation X (Gen X)".to_string(), 0.245),
            ("Baby Boomers".to_string(), 0.198),
        ]);
        let income = BTreeMap::from([
            ("B40 (Bottom 40%)".to_string(), 0.40),
            ("M40 (Middle 40%)".to_string(), 0.40),
            ("T20 (Top 20%)".to_string(), 0.20),
        ]);

        Self {
            race,
            generation,
            income,
        }
    }
}

impl PopulationTables {
    /// Selected values within a dimension add their proportions (an
    /// either/or union); the three dimension factors then multiply. A
    /// dimension with nothing selected contributes 1.0. Unknown facet
    /// values contribute proportion 0, so a dimension selected entirely
    /// from unknown values zeroes the multiplier.
    pub fn multiplier(&self, selection: &DemographicSelection) -> f64 {
        dimension_factor(&self.race, &selection.race)
            * dimension_factor(&self.generation, &selection.generation)
            * dimension_factor(&self.income, &selection.income)
    }
}

fn dimension_factor(table: &BTreeMap<String, f64>, selected: &[String]) -> f64 {
    if selected.is_empty() {
        return 1.0;
    }

    let unique: BTreeSet<&str> = selected.iter().map(String::as_str).collect();
    unique
        .iter()
        .map(|value| table.get(*value).copied().unwrap_or(0.0))
        .sum()
}

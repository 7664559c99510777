pub mod catalog;
pub mod config;
pub mod estimator;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::catalog::SegmentCatalog;
use crate::config::ReferenceConfig;
use crate::estimator::ReachEstimator;

/// Demographic facet values selected per dimension. Values within one
/// dimension combine as a union; dimensions combine multiplicatively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemographicSelection {
    pub race: Vec<String>,
    pub generation: Vec<String>,
    pub income: Vec<String>,
}

impl DemographicSelection {
    pub fn is_empty(&self) -> bool {
        self.race.is_empty() && self.generation.is_empty() && self.income.is_empty()
    }
}

/// One estimation request: which personas, over which regions, narrowed by
/// which demographic filters. Persona and region lists are treated as sets.
#[derive(Debug, Clone, Default)]
pub struct EstimateRequest {
    pub personas: Vec<String>,
    pub regions: Vec<String>,
    pub demographics: DemographicSelection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentEstimate {
    pub name: String,
    pub category: Option<String>,
    pub is_demographic: bool,
    pub raw_audience: u64,
    pub adjusted_audience: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationResult {
    pub per_segment: Vec<SegmentEstimate>,
    pub total_adjusted_audience: u64,
    pub pairwise_overlap_factor: f64,
    pub estimated_overlap_count: u64,
    pub unique_combined_audience: u64,
    pub demographic_multiplier: f64,
}

impl EstimationResult {
    pub fn empty(demographic_multiplier: f64) -> Self {
        Self {
            per_segment: Vec::new(),
            total_adjusted_audience: 0,
            pairwise_overlap_factor: 0.0,
            estimated_overlap_count: 0,
            unique_combined_audience: 0,
            demographic_multiplier,
        }
    }
}

fn load_reference_config() -> ReferenceConfig {
    ReferenceConfig::load(None)
        .map(|(config, _)| config)
        .unwrap_or_default()
}

/// Run an estimation against the reference tables from the default config
/// path (or the built-in tables when no config file exists).
pub fn estimate(catalog: &SegmentCatalog, request: &EstimateRequest) -> EstimationResult {
    let config = load_reference_config();
    ReachEstimator::new(&config).estimate(catalog, request)
}

pub fn format_number(value: u64) -> String {
    let mut chars: Vec<char> = value.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}

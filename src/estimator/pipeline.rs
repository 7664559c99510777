use std::collections::BTreeSet;

use crate::catalog::SegmentCatalog;
use crate::config::ReferenceConfig;
use crate::estimator::demographics::PopulationTables;
use crate::estimator::normalize;
use crate::estimator::overlap::{OverlapScorer, SegmentTier};
use crate::{EstimateRequest, EstimationResult, SegmentEstimate};

/// The estimation pipeline: per-segment adjusted audiences, pairwise
/// overlap coefficients, and the combined deduplicated reach figure.
/// Pure over in-memory data; safe to share and call concurrently.
#[derive(Debug, Clone)]
pub struct ReachEstimator {
    scorer: OverlapScorer,
    population: PopulationTables,
}

impl ReachEstimator {
    pub fn new(config: &ReferenceConfig) -> Self {
        Self {
            scorer: OverlapScorer::new(config),
            population: config.population.clone(),
        }
    }

    pub fn scorer(&self) -> &OverlapScorer {
        &self.scorer
    }

    /// Never fails: unknown personas are dropped from the computation and
    /// malformed audience values degrade to 0 upstream. An empty selection
    /// yields an all-zero result.
    pub fn estimate(&self, catalog: &SegmentCatalog, request: &EstimateRequest) -> EstimationResult {
        let multiplier = self.population.multiplier(&request.demographics);
        let personas = dedup(&request.personas);
        let regions = dedup(&request.regions);

        let mut per_segment = Vec::new();
        for name in &personas {
            let Some(segment) = catalog.get(name) else {
                continue;
            };
            let raw = normalize::aggregate(segment, &regions);
            let adjusted = (raw as f64 * multiplier).round() as u64;
            per_segment.push(SegmentEstimate {
                name: name.clone(),
                category: self.scorer.category(name).map(str::to_string),
                is_demographic: self.scorer.tier(name) == SegmentTier::Demographic,
                raw_audience: raw,
                adjusted_audience: adjusted,
            });
        }

        if per_segment.is_empty() {
            return EstimationResult::empty(multiplier);
        }

        let total: u64 = per_segment
            .iter()
            .map(|segment| segment.adjusted_audience)
            .sum();

        // mean coefficient over all C(n,2) pairs; no pairs, no overlap
        let mut coefficient_sum = 0.0;
        let mut pair_count = 0usize;
        for i in 0..per_segment.len() {
            for j in (i + 1)..per_segment.len() {
                coefficient_sum +=
                    self.scorer.coefficient(&per_segment[i].name, &per_segment[j].name);
                pair_count += 1;
            }
        }

        let factor = if pair_count > 0 {
            clamp01(coefficient_sum / pair_count as f64)
        } else {
            0.0
        };
        let overlap = (total as f64 * factor).round() as u64;
        let unique = total.saturating_sub(overlap);

        EstimationResult {
            per_segment,
            total_adjusted_audience: total,
            pairwise_overlap_factor: factor,
            estimated_overlap_count: overlap,
            unique_combined_audience: unique,
            demographic_multiplier: multiplier,
        }
    }
}

fn dedup(values: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .iter()
        .filter(|value| seen.insert(value.as_str()))
        .cloned()
        .collect()
}

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(1.0)
}

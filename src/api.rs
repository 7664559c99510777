use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use reach_sim::catalog::SegmentCatalog;
use reach_sim::estimator::{normalize, OverlapScorer, SegmentTier};
use reach_sim::store::{AudienceGroupDraft, AudienceGroupPatch};
use reach_sim::{DemographicSelection, EstimateRequest, EstimationResult, SegmentEstimate};

#[derive(Debug, Default, Deserialize)]
pub struct ApiEstimateRequest {
    pub personas: Option<Vec<String>>,
    pub regions: Option<Vec<String>>,
    pub demographics: Option<DemographicSelection>,
}

impl ApiEstimateRequest {
    pub fn into_request(self) -> EstimateRequest {
        EstimateRequest {
            personas: self.personas.unwrap_or_default(),
            regions: self.regions.unwrap_or_default(),
            demographics: self.demographics.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiEstimateResponse {
    pub per_segment: Vec<SegmentEstimate>,
    pub total_adjusted_audience: u64,
    pub pairwise_overlap_factor: f64,
    pub estimated_overlap_count: u64,
    pub unique_combined_audience: u64,
    pub demographic_multiplier: f64,
    pub warnings: Vec<String>,
}

impl ApiEstimateResponse {
    pub fn from_result(result: EstimationResult, warnings: Vec<String>) -> Self {
        Self {
            per_segment: result.per_segment,
            total_adjusted_audience: result.total_adjusted_audience,
            pairwise_overlap_factor: result.pairwise_overlap_factor,
            estimated_overlap_count: result.estimated_overlap_count,
            unique_combined_audience: result.unique_combined_audience,
            demographic_multiplier: result.demographic_multiplier,
            warnings,
        }
    }
}

/// Flags selected personas missing from the catalog; the estimator drops
/// them silently, so the response names them instead.
pub fn unknown_persona_warnings(catalog: &SegmentCatalog, personas: &[String]) -> Vec<String> {
    personas
        .iter()
        .filter(|name| catalog.get(name).is_none())
        .map(|name| format!("unknown persona: {}", name))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SegmentRow {
    pub name: String,
    pub category: Option<String>,
    pub is_demographic: bool,
    pub audience_by_region: BTreeMap<String, u64>,
    pub total_audience: u64,
}

pub fn catalog_rows(catalog: &SegmentCatalog, scorer: &OverlapScorer) -> Vec<SegmentRow> {
    catalog
        .segments()
        .map(|segment| {
            let audience_by_region: BTreeMap<String, u64> = segment
                .audience_by_region
                .iter()
                .map(|(region, value)| (region.clone(), normalize::parse_count(value)))
                .collect();
            let total_audience = audience_by_region.values().sum();

            SegmentRow {
                name: segment.name.clone(),
                category: scorer.category(&segment.name).map(str::to_string),
                is_demographic: scorer.tier(&segment.name) == SegmentTier::Demographic,
                audience_by_region,
                total_audience,
            }
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub segments: usize,
    pub regions: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
    pub personas: Vec<String>,
    #[serde(default)]
    pub demographics: DemographicSelection,
    pub total_audience: Option<u64>,
    pub unduplicated: Option<u64>,
    pub overlap_factor: Option<f64>,
}

impl CreateGroupRequest {
    pub fn has_summary(&self) -> bool {
        self.total_audience.is_some() && self.unduplicated.is_some() && self.overlap_factor.is_some()
    }

    /// Summary figures fall back to a freshly computed result when the
    /// caller did not supply them.
    pub fn into_draft(self, computed: Option<&EstimationResult>) -> AudienceGroupDraft {
        AudienceGroupDraft {
            name: self.name,
            personas: self.personas,
            demographics: self.demographics,
            total_audience: self
                .total_audience
                .or(computed.map(|result| result.total_adjusted_audience))
                .unwrap_or(0),
            unduplicated: self
                .unduplicated
                .or(computed.map(|result| result.unique_combined_audience))
                .unwrap_or(0),
            overlap_factor: self
                .overlap_factor
                .or(computed.map(|result| result.pairwise_overlap_factor))
                .unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub personas: Option<Vec<String>>,
    pub demographics: Option<DemographicSelection>,
    pub total_audience: Option<u64>,
    pub unduplicated: Option<u64>,
    pub overlap_factor: Option<f64>,
}

impl UpdateGroupRequest {
    pub fn changes_selection(&self) -> bool {
        self.personas.is_some() || self.demographics.is_some()
    }

    pub fn has_summary(&self) -> bool {
        self.total_audience.is_some() && self.unduplicated.is_some() && self.overlap_factor.is_some()
    }

    pub fn into_patch(self, computed: Option<&EstimationResult>) -> AudienceGroupPatch {
        AudienceGroupPatch {
            name: self.name,
            personas: self.personas,
            demographics: self.demographics,
            total_audience: self
                .total_audience
                .or(computed.map(|result| result.total_adjusted_audience)),
            unduplicated: self
                .unduplicated
                .or(computed.map(|result| result.unique_combined_audience)),
            overlap_factor: self
                .overlap_factor
                .or(computed.map(|result| result.pairwise_overlap_factor)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub deleted: usize,
}

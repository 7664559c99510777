pub mod demographics;
pub mod normalize;
pub mod overlap;
pub mod pipeline;

pub use demographics::PopulationTables;
pub use normalize::{aggregate, parse_count};
pub use overlap::{AffinityMatrix, CategoryTable, DemographicTiers, OverlapScorer, SegmentTier};
pub use pipeline::ReachEstimator;

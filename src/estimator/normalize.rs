use crate::catalog::{AudienceValue, Segment};

/// Reads one audience cell as a count. Comma group separators and stray
/// whitespace are tolerated; negative, empty, or non-numeric values
/// degrade to 0 so one bad cell never aborts an estimation.
pub fn parse_count(value: &AudienceValue) -> u64 {
    match value {
        AudienceValue::Count(count) => *count,
        AudienceValue::Number(number) => round_non_negative(*number),
        AudienceValue::Text(text) => parse_grouped(text),
        AudienceValue::Empty => 0,
    }
}

/// Sums a segment's audience over the requested regions. An empty region
/// slice means every region present on the segment; unknown region names
/// contribute nothing.
pub fn aggregate(segment: &Segment, regions: &[String]) -> u64 {
    if regions.is_empty() {
        return segment.audience_by_region.values().map(parse_count).sum();
    }

    regions
        .iter()
        .filter_map(|region| segment.audience_by_region.get(region))
        .map(parse_count)
        .sum()
}

fn parse_grouped(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|ch| !matches!(ch, ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return 0;
    }

    if let Ok(count) = cleaned.parse::<u64>() {
        return count;
    }

    cleaned
        .parse::<f64>()
        .map(round_non_negative)
        .unwrap_or(0)
}

fn round_non_negative(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

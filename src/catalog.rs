use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single audience cell as it arrives from the reference feed. The sheet
/// mixes native numbers, plain numeric strings, and comma-grouped strings;
/// normalization happens in `estimator::normalize`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudienceValue {
    Count(u64),
    Number(f64),
    Text(String),
    Empty,
}

/// Immutable reference data for one persona: audience counts per region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub audience_by_region: BTreeMap<String, AudienceValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentCatalog {
    regions: Vec<String>,
    segments: BTreeMap<String, Segment>,
}

impl SegmentCatalog {
    pub fn new(regions: Vec<String>, segments: Vec<Segment>) -> Self {
        let mut by_name = BTreeMap::new();
        for segment in segments {
            by_name.entry(segment.name.clone()).or_insert(segment);
        }
        Self {
            regions,
            segments: by_name,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.get(name)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.values()
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Parses the spreadsheet CSV export. The first column carries persona
/// names; every remaining column is a geographic region. Cell values are
/// kept verbatim; blank rows and rows without a persona name are skipped.
pub fn parse_catalog_csv(text: &str) -> Result<SegmentCatalog, String> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| "audience csv is empty".to_string())?;
    let header_cells = parse_csv_line(header);
    if header_cells.len() < 2 {
        return Err("audience csv has no region columns".to_string());
    }
    // regions keep their header column so an empty header cell between two
    // region columns never shifts the values that follow it
    let region_columns: Vec<(usize, String)> = header_cells[1..]
        .iter()
        .enumerate()
        .filter(|(_, cell)| !cell.is_empty())
        .map(|(offset, cell)| (offset + 1, cell.clone()))
        .collect();
    let regions: Vec<String> = region_columns
        .iter()
        .map(|(_, region)| region.clone())
        .collect();

    let mut segments = Vec::new();
    for line in lines {
        let cells = parse_csv_line(line);
        if cells.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let name = cells[0].clone();
        if name.is_empty() {
            continue;
        }

        let mut audience_by_region = BTreeMap::new();
        for (column, region) in &region_columns {
            let value = match cells.get(*column) {
                Some(cell) if !cell.is_empty() => AudienceValue::Text(cell.clone()),
                _ => AudienceValue::Empty,
            };
            audience_by_region.insert(region.clone(), value);
        }

        segments.push(Segment {
            name,
            audience_by_region,
        });
    }

    if segments.is_empty() {
        return Err("audience csv has no data rows".to_string());
    }

    Ok(SegmentCatalog::new(regions, segments))
}

fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    fields.push(current.trim().to_string());
    fields
}

use reach_sim::catalog::{parse_catalog_csv, AudienceValue};
use reach_sim::estimator::{aggregate, parse_count};

const FEED: &str = "\
Persona,Central,Northern,Southern
Foodies,\"1,000,000\",500000,250000
EPL Super Fans,750000,,125000

Malay,\"2,500,000\",\"1,200,000\",900000
,10,20,30
";

#[test]
fn parses_header_regions_and_rows() {
    let catalog = parse_catalog_csv(FEED).unwrap();

    assert_eq!(catalog.regions(), &["Central", "Northern", "Southern"]);
    assert_eq!(catalog.len(), 3);
    assert!(catalog.get("Foodies").is_some());
    assert!(catalog.get("EPL Super Fans").is_some());
    assert!(catalog.get("Malay").is_some());
}

#[test]
fn skips_blank_and_nameless_rows() {
    let catalog = parse_catalog_csv(FEED).unwrap();

    // the row with an empty persona cell is dropped
    assert_eq!(catalog.len(), 3);
}

#[test]
fn quoted_grouped_numbers_parse_as_counts() {
    let catalog = parse_catalog_csv(FEED).unwrap();
    let foodies = catalog.get("Foodies").unwrap();

    assert_eq!(
        parse_count(&foodies.audience_by_region["Central"]),
        1_000_000
    );
    assert_eq!(aggregate(foodies, &[]), 1_750_000);
}

#[test]
fn empty_cells_contribute_zero() {
    let catalog = parse_catalog_csv(FEED).unwrap();
    let epl = catalog.get("EPL Super Fans").unwrap();

    assert_eq!(epl.audience_by_region["Northern"], AudienceValue::Empty);
    assert_eq!(aggregate(epl, &[]), 875_000);
}

#[test]
fn region_subset_sums_only_requested_regions() {
    let catalog = parse_catalog_csv(FEED).unwrap();
    let malay = catalog.get("Malay").unwrap();

    let regions = vec!["Central".to_string(), "Southern".to_string()];
    assert_eq!(aggregate(malay, &regions), 3_400_000);
}

#[test]
fn unknown_regions_contribute_zero() {
    let catalog = parse_catalog_csv(FEED).unwrap();
    let malay = catalog.get("Malay").unwrap();

    let regions = vec!["Central".to_string(), "Borneo".to_string()];
    assert_eq!(aggregate(malay, &regions), 2_500_000);
}

#[test]
fn duplicate_persona_rows_keep_the_first() {
    let feed = "\
Persona,National
Foodies,100
Foodies,999
";
    let catalog = parse_catalog_csv(feed).unwrap();
    let foodies = catalog.get("Foodies").unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(aggregate(foodies, &[]), 100);
}

#[test]
fn empty_header_cells_do_not_shift_value_columns() {
    let feed = "\
Persona,Central,,Southern
Foodies,100,999,200
";
    let catalog = parse_catalog_csv(feed).unwrap();
    let foodies = catalog.get("Foodies").unwrap();

    assert_eq!(catalog.regions(), &["Central", "Southern"]);
    assert_eq!(parse_count(&foodies.audience_by_region["Central"]), 100);
    assert_eq!(parse_count(&foodies.audience_by_region["Southern"]), 200);
    assert_eq!(aggregate(foodies, &[]), 300);
}

#[test]
fn malformed_cells_degrade_to_zero() {
    let feed = "\
Persona,National,Coastal
Foodies,n/a,-500
";
    let catalog = parse_catalog_csv(feed).unwrap();
    let foodies = catalog.get("Foodies").unwrap();

    assert_eq!(aggregate(foodies, &[]), 0);
}

#[test]
fn fractional_cells_round() {
    assert_eq!(parse_count(&AudienceValue::Text("1234.6".to_string())), 1235);
    assert_eq!(parse_count(&AudienceValue::Number(99.4)), 99);
    assert_eq!(parse_count(&AudienceValue::Number(-10.0)), 0);
}

#[test]
fn empty_feed_is_an_error() {
    assert!(parse_catalog_csv("").is_err());
    assert!(parse_catalog_csv("Persona,National\n").is_err());
    assert!(parse_catalog_csv("Persona\nFoodies\n").is_err());
}

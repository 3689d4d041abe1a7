use netmig::join::{build_joined_regions_with, parse_features, summarize};
use netmig::stats::StatisticsIndexBuilder;
use netmig::{Error, StatisticsRecord, VisualState, build_joined_regions, detail_for, style_for};
use serde_json::{Value, json};

fn fixture(name: &str) -> Value {
    let text = std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn fixtures_join_by_canonical_key() {
    let regions = build_joined_regions(&fixture("kunnat.geojson"), &fixture("muutto.json")).unwrap();
    assert_eq!(regions.len(), 4);

    let alajarvi = &regions[0];
    assert_eq!(alajarvi.key.as_ref().map(|k| k.as_str()), Some("KU005"));
    assert_eq!(alajarvi.record, Some(StatisticsRecord::new(310, 402)));
    assert_eq!(alajarvi.net, Some(-92));

    let alavieska = &regions[1];
    assert_eq!(alavieska.net, Some(0));
    assert_eq!(alavieska.hue, Some(60.0));

    let helsinki = &regions[2];
    assert_eq!(helsinki.name(), Some("Helsinki"));
    assert_eq!(helsinki.net, Some(29711 - 21044));
}

#[test]
fn feature_without_code_has_name_only_detail() {
    let regions = build_joined_regions(&fixture("kunnat.geojson"), &fixture("muutto.json")).unwrap();
    let unknown = &regions[3];
    assert!(unknown.key.is_none());
    assert!(unknown.record.is_none());
    assert!(unknown.net.is_none());

    let detail = detail_for(unknown);
    assert_eq!(detail.label.as_deref(), Some("Tuntematon"));
    assert_eq!(detail.body, "Tuntematon");

    // still drawable
    let style = style_for(unknown, VisualState::Default);
    assert_eq!(style.fill_color, netmig::color::NO_DATA);
}

#[test]
fn summary_over_fixtures() {
    let regions = build_joined_regions(&fixture("kunnat.geojson"), &fixture("muutto.json")).unwrap();
    let s = summarize(&regions);
    assert_eq!(s.regions, 4);
    assert_eq!(s.matched, 3);
    assert_eq!(s.unmatched, 1);
    assert_eq!(s.total_net, -92 + 0 + 8667);
}

#[test]
fn malformed_statistics_yield_no_regions() {
    let bad = json!({ "value": [1, 2] });
    match build_joined_regions(&fixture("kunnat.geojson"), &bad) {
        Err(Error::MalformedResponse(_)) => {}
        other => panic!("expected MalformedResponse, got {:?}", other.map(|r| r.len())),
    }
}

#[test]
fn geometry_must_be_a_feature_collection() {
    let point = json!({ "type": "Point", "coordinates": [24.9, 60.2] });
    assert!(matches!(parse_features(&point), Err(Error::MalformedGeometry(_))));
    assert!(matches!(parse_features(&json!({"foo": 1})), Err(Error::MalformedGeometry(_))));
}

#[test]
fn configured_region_dimension_flows_through() {
    let builder = StatisticsIndexBuilder::new().region_dimension("Vuosi");
    // "Vuosi" has one category, so two values are expected and six are present.
    let err = build_joined_regions_with(&fixture("kunnat.geojson"), &fixture("muutto.json"), &builder)
        .unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
}
